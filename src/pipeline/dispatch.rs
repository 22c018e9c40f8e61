use std::{sync::Arc, time::Duration};

use reqwest::{
    Client, StatusCode,
    header::{CONTENT_LENGTH, HeaderMap},
};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    error::{ApiError, ApiResult, ErrorKind},
    pipeline::{
        RequestDescriptor, Verb,
        classify::{Attempts, RetryDecision, RetryPolicy, classify_response, classify_transport},
        credentials::{Credential, CredentialStore},
    },
};

/// Status, headers and undecoded body of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: String) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Builds the shared transport: one connection pool for every call of a client.
pub fn build_transport(timeout: Duration) -> ApiResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .map_err(|e| ApiError::network(format!("cannot build HTTP client: {e}")))
}

/// Sends request descriptors over a shared transport, attaching credentials and
/// recovering from the failures [`RetryPolicy`] deems transient.
pub struct Dispatcher {
    http: Client,
    credentials: Arc<CredentialStore>,
    policy: RetryPolicy,
}

impl Dispatcher {
    pub fn new(http: Client, credentials: Arc<CredentialStore>, policy: RetryPolicy) -> Self {
        Self {
            http,
            credentials,
            policy,
        }
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sends `request`, retrying per the policy, and returns the first 2xx response.
    ///
    /// A 401 invalidates the credential that was rejected and replays once; a
    /// second 401 surfaces as [`ErrorKind::Auth`].
    pub async fn send(&self, request: &RequestDescriptor) -> ApiResult<RawResponse> {
        let mut attempts = Attempts::default();

        loop {
            let credential = if request.requires_auth() {
                Some(self.credentials.get_credential().await?)
            } else {
                None
            };

            let err = match self.attempt(request, credential.as_deref()).await {
                Ok(raw) if raw.is_success() => return Ok(raw),
                Ok(raw) => classify_response(&raw),
                Err(err) => err,
            };

            let refreshable = credential.is_some() && self.credentials.source().is_refreshable();
            match self.policy.decide(&err, &attempts, refreshable) {
                RetryDecision::RefreshCredential => {
                    warn!(url = %request.url(), "credential rejected, refreshing once");
                    if let Some(stale) = &credential {
                        self.credentials.invalidate_stale(stale).await;
                    }
                    attempts.refreshes += 1;
                }
                RetryDecision::Wait(delay) => {
                    if err.kind == ErrorKind::RateLimit {
                        attempts.rate_limited += 1;
                    } else {
                        attempts.transient += 1;
                    }
                    warn!(
                        url = %request.url(),
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "retrying request"
                    );
                    sleep(delay).await;
                }
                RetryDecision::Surface => {
                    if err.kind == ErrorKind::Auth && attempts.refreshes > 0 {
                        return Err(ApiError {
                            message: format!("{} (after credential refresh)", err.message),
                            ..err
                        });
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Like [`Dispatcher::send`], but gives up with [`ErrorKind::Cancelled`] as soon
    /// as `cancel` fires. The in-flight exchange is dropped, which aborts it.
    pub async fn send_with_cancel(
        &self,
        request: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> ApiResult<RawResponse> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::cancelled()),
            result = self.send(request) => result,
        }
    }

    async fn attempt(
        &self,
        request: &RequestDescriptor,
        credential: Option<&Credential>,
    ) -> ApiResult<RawResponse> {
        let verb = request.verb();
        let mut builder = self.http.request(verb.as_method(), request.url().clone());
        if let Some(credential) = credential {
            builder = builder.bearer_auth(credential.access_token());
        }
        match request.body() {
            Some(body) => builder = builder.json(body),
            // the API answers 411 to a PUT/POST without a length
            None if matches!(verb, Verb::Put | Verb::Post) => {
                builder = builder.header(CONTENT_LENGTH, 0)
            }
            None => {}
        }

        debug!(%verb, url = %request.url(), "sending request");
        let exchange = async {
            let response = builder.send().await.map_err(|e| classify_transport(&e))?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.text().await.map_err(|e| classify_transport(&e))?;
            Ok::<_, ApiError>(RawResponse::new(status, headers, body))
        };

        let raw = tokio::time::timeout(self.policy.attempt_timeout, exchange)
            .await
            .map_err(|_| {
                ApiError::network(format!(
                    "request timed out after {:?}",
                    self.policy.attempt_timeout
                ))
            })??;
        debug!(%verb, url = %request.url(), status = raw.status().as_u16(), "received response");
        Ok(raw)
    }
}
