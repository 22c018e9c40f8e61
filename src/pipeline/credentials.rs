use std::{collections::BTreeSet, fmt, sync::Arc, time::Duration as StdDuration};

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, header::AUTHORIZATION};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// A cached credential is treated as expired this many seconds before its real
/// expiry, so that a request never leaves with a token about to lapse in flight.
/// Short-lived credentials use half their lifetime instead.
pub const EXPIRY_MARGIN_SECS: i64 = 240;

/// Bound on one token exchange unless the store is given another.
pub const DEFAULT_EXCHANGE_TIMEOUT: StdDuration = StdDuration::from_secs(10);

fn refresh_margin(lifetime: Duration) -> Duration {
    (lifetime / 2)
        .min(Duration::seconds(EXPIRY_MARGIN_SECS))
        .max(Duration::zero())
}

/// An issued bearer credential. Never mutated; a refresh produces a new value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
    refresh_at: Option<DateTime<Utc>>,
    scopes: BTreeSet<String>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
            refresh_at: None,
            scopes: BTreeSet::new(),
        }
    }

    /// Sets the expiry of a credential issued now.
    pub fn with_expiry(self, expires_at: DateTime<Utc>) -> Self {
        self.with_expiry_from(Utc::now(), expires_at)
    }

    pub fn with_expiry_from(mut self, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self.refresh_at = Some(expires_at - refresh_margin(expires_at - issued_at));
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    /// True once `now` is within the refresh margin of the expiry instant: 240 s, or
    /// half the lifetime when that is shorter. Credentials without an expiry never
    /// expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.refresh_at {
            Some(refresh_at) => now >= refresh_at,
            None => false,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Where credentials come from.
#[derive(Clone)]
pub enum CredentialSource {
    /// A caller-supplied bearer token. Used as-is and never refreshed.
    StaticToken(String),
    /// App-level client-credentials exchange against `token_endpoint`.
    ProviderBacked {
        client_id: String,
        client_secret: String,
        token_endpoint: String,
    },
}

impl CredentialSource {
    pub fn is_refreshable(&self) -> bool {
        matches!(self, CredentialSource::ProviderBacked { .. })
    }
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::StaticToken(_) => f.write_str("StaticToken(<redacted>)"),
            CredentialSource::ProviderBacked {
                client_id,
                token_endpoint,
                ..
            } => f
                .debug_struct("ProviderBacked")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .field("token_endpoint", token_endpoint)
                .finish(),
        }
    }
}

/// Outcome of an invalidation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// The cache was cleared; the next `get_credential` acquires a new credential.
    Cleared,
    /// The cache already held a different credential, acquired after the stale one.
    /// It was kept.
    AlreadyReplaced,
    /// The source is a static token. Nothing was cleared and retrying with a
    /// "fresh" credential would send the very same token again.
    NotRefreshable,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    #[allow(dead_code)]
    token_type: Option<String>,
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

/// Obtains, caches and refreshes the bearer credential of one client.
///
/// The cache sits behind an async mutex that is held for the whole acquisition, so
/// concurrent misses coalesce: the first caller performs the token exchange, later
/// callers wait on the lock and then find the fresh credential in the cache. If the
/// acquiring future is dropped (cancelled) the guard is released with the cache
/// untouched and the next waiter performs the exchange itself.
pub struct CredentialStore {
    source: CredentialSource,
    http: Client,
    exchange_timeout: StdDuration,
    cached: Mutex<Option<Arc<Credential>>>,
}

impl CredentialStore {
    /// `http` is the shared transport also used for API calls; the token exchange
    /// reuses its connection pool.
    pub fn new(source: CredentialSource, http: Client) -> Self {
        Self {
            source,
            http,
            exchange_timeout: DEFAULT_EXCHANGE_TIMEOUT,
            cached: Mutex::new(None),
        }
    }

    /// Bounds each token exchange. A stalled endpoint surfaces as
    /// [`crate::error::ErrorKind::Auth`] once `timeout` elapses.
    pub fn with_exchange_timeout(mut self, timeout: StdDuration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    pub fn source(&self) -> &CredentialSource {
        &self.source
    }

    /// Returns the cached credential, acquiring a new one on a miss or expiry.
    pub async fn get_credential(&self) -> ApiResult<Arc<Credential>> {
        let mut cached = self.cached.lock().await;
        if let Some(credential) = cached.as_ref() {
            if !credential.is_expired_at(Utc::now()) {
                return Ok(Arc::clone(credential));
            }
            debug!("cached credential expired");
        }

        let fresh = Arc::new(self.acquire().await?);
        *cached = Some(Arc::clone(&fresh));
        Ok(fresh)
    }

    /// Clears the cached credential.
    pub async fn invalidate(&self) -> Invalidation {
        if !self.source.is_refreshable() {
            return Invalidation::NotRefreshable;
        }
        self.cached.lock().await.take();
        Invalidation::Cleared
    }

    /// Clears the cache only if it still holds `stale`.
    ///
    /// A request that got a 401 with an old credential must not throw away a
    /// credential some other caller acquired in the meantime; that case reports
    /// [`Invalidation::AlreadyReplaced`]. An empty cache reports `Cleared`.
    pub async fn invalidate_stale(&self, stale: &Credential) -> Invalidation {
        if !self.source.is_refreshable() {
            return Invalidation::NotRefreshable;
        }
        let mut cached = self.cached.lock().await;
        match cached.as_deref() {
            Some(current) if current != stale => Invalidation::AlreadyReplaced,
            _ => {
                cached.take();
                Invalidation::Cleared
            }
        }
    }

    async fn acquire(&self) -> ApiResult<Credential> {
        match &self.source {
            CredentialSource::StaticToken(token) => {
                if token.trim().is_empty() {
                    return Err(ApiError::auth("the static access token is empty"));
                }
                Ok(Credential::new(token.clone()))
            }
            CredentialSource::ProviderBacked {
                client_id,
                client_secret,
                token_endpoint,
            } => tokio::time::timeout(
                self.exchange_timeout,
                self.exchange(client_id, client_secret, token_endpoint),
            )
            .await
            .map_err(|_| {
                warn!(endpoint = token_endpoint.as_str(), "token exchange timed out");
                ApiError::auth(format!(
                    "token exchange timed out after {:?}",
                    self.exchange_timeout
                ))
            })?,
        }
    }

    async fn exchange(
        &self,
        client_id: &str,
        client_secret: &str,
        token_endpoint: &str,
    ) -> ApiResult<Credential> {
        debug!(endpoint = token_endpoint, "exchanging client credentials");

        let basic = STANDARD.encode(format!("{client_id}:{client_secret}"));
        let response = self
            .http
            .post(token_endpoint)
            .header(AUTHORIZATION, format!("Basic {basic}"))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| ApiError::auth(format!("token exchange failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::auth(format!("token exchange failed: {e}")))?;

        if !status.is_success() {
            let reason = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| e.error_description.unwrap_or(e.error))
                .unwrap_or_else(|_| status.to_string());
            warn!(status = status.as_u16(), %reason, "token exchange rejected");
            return Err(
                ApiError::auth(format!("token exchange rejected: {reason}"))
                    .with_status(status.as_u16()),
            );
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::auth(format!("malformed token response: {e}")))?;

        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::auth("token response carries no access_token"))?;

        let mut credential = Credential::new(access_token);
        if let Some(expires_in) = token.expires_in {
            if expires_in < 0 {
                return Err(ApiError::auth(format!(
                    "token response carries a negative expires_in ({expires_in})"
                )));
            }
            let issued_at = Utc::now();
            // out-of-range lifetimes are kept without an expiry
            match Duration::try_seconds(expires_in).and_then(|d| issued_at.checked_add_signed(d)) {
                Some(expires_at) => credential = credential.with_expiry_from(issued_at, expires_at),
                None => debug!(expires_in, "token lifetime out of range, caching without expiry"),
            }
        }
        if let Some(scope) = token.scope {
            credential = credential.with_scopes(scope.split_whitespace());
        }
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_without_expiry_never_expires() {
        let credential = Credential::new("abc");
        assert!(!credential.is_expired_at(Utc::now() + Duration::days(365)));
    }

    #[test]
    fn credential_expires_inside_margin() {
        let now = Utc::now();
        let credential = Credential::new("abc").with_expiry_from(now, now + Duration::seconds(3600));
        assert!(!credential.is_expired_at(now));
        assert!(!credential.is_expired_at(now + Duration::seconds(3600 - 241)));
        assert!(credential.is_expired_at(now + Duration::seconds(3600 - 240)));
    }

    #[test]
    fn short_lived_credential_uses_half_its_lifetime() {
        let now = Utc::now();
        let credential = Credential::new("abc").with_expiry_from(now, now + Duration::seconds(100));
        assert!(!credential.is_expired_at(now));
        assert!(!credential.is_expired_at(now + Duration::seconds(49)));
        assert!(credential.is_expired_at(now + Duration::seconds(50)));
    }

    #[test]
    fn credential_issued_already_expired_is_expired() {
        let now = Utc::now();
        let credential = Credential::new("abc").with_expiry_from(now, now - Duration::seconds(5));
        assert!(credential.is_expired_at(now));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let source = CredentialSource::ProviderBacked {
            client_id: "id".into(),
            client_secret: "hunter2".into(),
            token_endpoint: "https://accounts.example/token".into(),
        };
        let printed = format!("{:?} {:?}", source, Credential::new("s3cr3t"));
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("s3cr3t"));
    }

    #[tokio::test]
    async fn static_token_is_wrapped_and_not_refreshable() {
        let store = CredentialStore::new(CredentialSource::StaticToken("abc123".into()), Client::new());

        let credential = store.get_credential().await.unwrap();
        assert_eq!(credential.access_token(), "abc123");
        assert_eq!(store.invalidate().await, Invalidation::NotRefreshable);
        assert_eq!(store.get_credential().await.unwrap().access_token(), "abc123");
    }

    #[tokio::test]
    async fn invalidate_stale_keeps_a_newer_credential() {
        let store = CredentialStore::new(
            CredentialSource::ProviderBacked {
                client_id: "id".into(),
                client_secret: "secret".into(),
                token_endpoint: "http://127.0.0.1:9/token".into(),
            },
            Client::new(),
        );
        *store.cached.lock().await = Some(Arc::new(Credential::new("new")));

        let outcome = store.invalidate_stale(&Credential::new("old")).await;
        assert_eq!(outcome, Invalidation::AlreadyReplaced);
        assert_eq!(store.get_credential().await.unwrap().access_token(), "new");

        let outcome = store.invalidate_stale(&Credential::new("new")).await;
        assert_eq!(outcome, Invalidation::Cleared);
        assert!(store.cached.lock().await.is_none());
    }

    #[tokio::test]
    async fn empty_static_token_is_an_auth_error() {
        let store = CredentialStore::new(CredentialSource::StaticToken("  ".into()), Client::new());
        let err = store.get_credential().await.unwrap_err();
        assert!(err.is(crate::error::ErrorKind::Auth));
    }
}
