//! Maps transport outcomes and HTTP responses onto [`ApiError`] kinds and decides
//! which of them the dispatcher recovers from locally.
//!
//! Recovery is limited to three cases:
//!
//! - one credential refresh after a 401,
//! - waiting out a 429 whose retry-after hint is below the ceiling,
//! - bounded exponential backoff for 5xx and transport failures.
//!
//! Everything else is surfaced on the first occurrence.

use std::time::Duration;

use rand::Rng;
use reqwest::{
    StatusCode,
    header::{HeaderMap, RETRY_AFTER},
};
use serde::Deserialize;

use crate::{
    error::{ApiError, ErrorKind},
    pipeline::RawResponse,
};

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Extracts `error.message` from the `{ "error": { "status", "message" } }` envelope.
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .filter(|m| !m.trim().is_empty())
}

/// Reads a `Retry-After` header given in whole seconds.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Classifies a non-success response.
pub fn classify_response(raw: &RawResponse) -> ApiError {
    let status = raw.status();
    let message = error_message(raw.body()).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    });

    let kind = match status {
        StatusCode::UNAUTHORIZED => ErrorKind::Auth,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimit,
        s if s.is_server_error() => ErrorKind::Server,
        _ => ErrorKind::Validation,
    };

    let err = ApiError::new(kind, message).with_status(status.as_u16());
    if kind == ErrorKind::RateLimit {
        err.with_retry_after(parse_retry_after(raw.headers()))
    } else {
        err
    }
}

/// Classifies a failure to obtain any response at all.
pub fn classify_transport(err: &reqwest::Error) -> ApiError {
    if err.is_builder() {
        return ApiError::validation(format!("cannot build request: {err}"));
    }
    if err.is_timeout() {
        return ApiError::network(format!("request timed out: {err}"));
    }
    if err.is_connect() {
        return ApiError::network(format!("connection failed: {err}"));
    }
    ApiError::network(format!("transport error: {err}"))
}

/// What the dispatcher should do with a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Invalidate the credential and replay immediately.
    RefreshCredential,
    /// Sleep, then replay.
    Wait(Duration),
    /// Give up and return the error.
    Surface,
}

/// Recoveries already spent on the current call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Attempts {
    pub refreshes: u32,
    pub rate_limited: u32,
    pub transient: u32,
}

/// Retry budget and timing. Built with the `with_*` methods on top of the defaults.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_transient_retries: u32,
    pub max_rate_limit_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub retry_after_ceiling: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_transient_retries: 3,
            max_rate_limit_retries: 2,
            base_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(8),
            retry_after_ceiling: Duration::from_secs(120),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_transient_retries(mut self, retries: u32) -> Self {
        self.max_transient_retries = retries;
        self
    }

    pub fn with_max_rate_limit_retries(mut self, retries: u32) -> Self {
        self.max_rate_limit_retries = retries;
        self
    }

    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_backoff = base;
        self.max_backoff = max.max(base);
        self
    }

    pub fn with_retry_after_ceiling(mut self, ceiling: Duration) -> Self {
        self.retry_after_ceiling = ceiling;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// `refreshable` is false for static tokens: a 401 then surfaces at once.
    pub fn decide(&self, err: &ApiError, attempts: &Attempts, refreshable: bool) -> RetryDecision {
        match err.kind {
            ErrorKind::Auth if err.status == Some(401) => {
                if refreshable && attempts.refreshes == 0 {
                    RetryDecision::RefreshCredential
                } else {
                    RetryDecision::Surface
                }
            }
            ErrorKind::RateLimit => match err.retry_after {
                Some(wait)
                    if wait <= self.retry_after_ceiling
                        && attempts.rate_limited < self.max_rate_limit_retries =>
                {
                    RetryDecision::Wait(wait)
                }
                _ => RetryDecision::Surface,
            },
            ErrorKind::Server | ErrorKind::Network => {
                if attempts.transient < self.max_transient_retries {
                    RetryDecision::Wait(self.backoff(attempts.transient))
                } else {
                    RetryDecision::Surface
                }
            }
            _ => RetryDecision::Surface,
        }
    }

    /// `base * 2^retry` capped at `max_backoff`, plus up to half of `base` of jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponential = self
            .base_backoff
            .saturating_mul(1u32 << retry.min(16))
            .min(self.max_backoff);

        let jitter_ms = (self.base_backoff.as_millis() / 2) as u64;
        if jitter_ms == 0 {
            return exponential;
        }
        exponential + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse::new(
            StatusCode::from_u16(status).unwrap(),
            HeaderMap::new(),
            body.to_string(),
        )
    }

    #[test]
    fn reads_message_from_error_envelope() {
        let err = classify_response(&raw(
            400,
            r#"{"error":{"status":400,"message":"invalid id"}}"#,
        ));
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.status, Some(400));
        assert_eq!(err.message, "invalid id");
    }

    #[test]
    fn falls_back_to_reason_phrase() {
        let err = classify_response(&raw(404, "<html>nope</html>"));
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "Not Found");
    }

    #[test]
    fn maps_statuses_to_kinds() {
        assert_eq!(classify_response(&raw(401, "")).kind, ErrorKind::Auth);
        assert_eq!(classify_response(&raw(403, "")).kind, ErrorKind::Validation);
        assert_eq!(classify_response(&raw(502, "")).kind, ErrorKind::Server);
        assert_eq!(classify_response(&raw(429, "")).kind, ErrorKind::RateLimit);
    }

    #[test]
    fn rate_limit_carries_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        let response = RawResponse::new(StatusCode::TOO_MANY_REQUESTS, headers, String::new());

        let err = classify_response(&response);
        assert_eq!(err.retry_after, Some(Duration::from_secs(7)));
    }

    #[test]
    fn retries_401_once_and_only_when_refreshable() {
        let policy = RetryPolicy::default();
        let err = ApiError::auth("expired").with_status(401);

        assert_eq!(
            policy.decide(&err, &Attempts::default(), true),
            RetryDecision::RefreshCredential
        );
        let spent = Attempts {
            refreshes: 1,
            ..Attempts::default()
        };
        assert_eq!(policy.decide(&err, &spent, true), RetryDecision::Surface);
        assert_eq!(
            policy.decide(&err, &Attempts::default(), false),
            RetryDecision::Surface
        );
    }

    #[test]
    fn waits_for_rate_limit_only_below_ceiling() {
        let policy = RetryPolicy::default().with_retry_after_ceiling(Duration::from_secs(5));
        let short = ApiError::new(ErrorKind::RateLimit, "slow down")
            .with_retry_after(Some(Duration::from_secs(2)));
        let long = ApiError::new(ErrorKind::RateLimit, "slow down")
            .with_retry_after(Some(Duration::from_secs(3600)));
        let missing = ApiError::new(ErrorKind::RateLimit, "slow down");

        assert_eq!(
            policy.decide(&short, &Attempts::default(), true),
            RetryDecision::Wait(Duration::from_secs(2))
        );
        assert_eq!(policy.decide(&long, &Attempts::default(), true), RetryDecision::Surface);
        assert_eq!(policy.decide(&missing, &Attempts::default(), true), RetryDecision::Surface);
    }

    #[test]
    fn never_retries_client_or_decode_errors() {
        let policy = RetryPolicy::default();
        for kind in [ErrorKind::Validation, ErrorKind::NotFound, ErrorKind::Decode] {
            let err = ApiError::new(kind, "no");
            assert_eq!(policy.decide(&err, &Attempts::default(), true), RetryDecision::Surface);
        }
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let policy = RetryPolicy::default()
            .with_backoff(Duration::from_millis(100), Duration::from_millis(500));

        let first = policy.backoff(0);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(150));
        let third = policy.backoff(2);
        assert!(third >= Duration::from_millis(400) && third <= Duration::from_millis(450));
        let capped = policy.backoff(10);
        assert!(capped <= Duration::from_millis(550));
    }

    #[test]
    fn transient_budget_is_bounded() {
        let policy = RetryPolicy::default().with_max_transient_retries(2);
        let err = ApiError::network("reset");
        let spent = Attempts {
            transient: 2,
            ..Attempts::default()
        };
        assert!(matches!(
            policy.decide(&err, &Attempts::default(), true),
            RetryDecision::Wait(_)
        ));
        assert_eq!(policy.decide(&err, &spent, true), RetryDecision::Surface);
    }
}
