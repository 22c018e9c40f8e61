//! # Request Pipeline
//!
//! The shared machinery behind every endpoint wrapper in [`crate::spotify`]:
//!
//! ```text
//! endpoint wrapper
//!      ↓  RequestBuilder::build        (validation, query encoding; no I/O)
//! Dispatcher::send ──→ CredentialStore  (bearer credential, coalesced refresh)
//!      ↓  classify                     (401 refresh / 429 wait / 5xx backoff)
//! decode / decode_property             (typed values, nested payloads)
//!      ↓
//! Page / CursorPage                    (next/previous page requests)
//! ```
//!
//! Wrappers never touch the credential store or the transport directly; they hold an
//! `Arc<Pipeline>` and go through [`Pipeline::request`] and the `get_*`/`execute`
//! helpers below.

pub mod classify;
pub mod credentials;
pub mod decode;
pub mod dispatch;
pub mod paging;
pub mod request;

use std::sync::Arc;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use classify::{RetryDecision, RetryPolicy};
pub use credentials::{Credential, CredentialSource, CredentialStore, Invalidation};
pub use decode::{decode, decode_property};
pub use dispatch::{Dispatcher, RawResponse, build_transport};
pub use paging::{CursorDirection, CursorPage, Cursors, Page, PageCursor, PageOffset};
pub use request::{QueryValue, RequestBuilder, RequestDescriptor, Verb};

use crate::error::ApiResult;

/// One dispatcher plus the base URL its requests are resolved against.
///
/// Cloning is cheap and shares the transport and credential cache. A clone made
/// with [`Pipeline::with_cancellation`] aborts its calls when the token fires.
#[derive(Clone)]
pub struct Pipeline {
    base_url: String,
    dispatcher: Arc<Dispatcher>,
    cancel: Option<CancellationToken>,
}

impl Pipeline {
    /// `transport` is owned by the pipeline from here on and reused for every call,
    /// including the credential exchange.
    pub fn new(
        transport: Client,
        base_url: impl Into<String>,
        source: CredentialSource,
        policy: RetryPolicy,
    ) -> Self {
        let credentials = Arc::new(
            CredentialStore::new(source, transport.clone())
                .with_exchange_timeout(policy.attempt_timeout),
        );
        Self {
            base_url: base_url.into(),
            dispatcher: Arc::new(Dispatcher::new(transport, credentials, policy)),
            cancel: None,
        }
    }

    pub fn with_cancellation(&self, cancel: CancellationToken) -> Self {
        Self {
            cancel: Some(cancel),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Starts a request for `path` relative to the API base URL.
    pub fn request(&self, verb: Verb, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(verb, self.base_url.clone(), path)
    }

    pub async fn send(&self, request: &RequestDescriptor) -> ApiResult<RawResponse> {
        match &self.cancel {
            Some(cancel) => self.dispatcher.send_with_cancel(request, cancel).await,
            None => self.dispatcher.send(request).await,
        }
    }

    /// Sends and decodes the whole body.
    pub async fn get_model<T: DeserializeOwned>(&self, request: &RequestDescriptor) -> ApiResult<T> {
        let raw = self.send(request).await?;
        decode(&raw)
    }

    /// Sends and decodes one named top-level property of the body.
    pub async fn get_model_from_property<T: DeserializeOwned + Default>(
        &self,
        request: &RequestDescriptor,
        property: &str,
    ) -> ApiResult<T> {
        let raw = self.send(request).await?;
        decode_property(&raw, property)
    }

    /// Sends a request whose response body carries nothing of interest.
    pub async fn execute(&self, request: &RequestDescriptor) -> ApiResult<()> {
        self.send(request).await.map(|_| ())
    }

    /// Walks offset pages starting at `first`, at most `max_pages` of them.
    /// With `property`, each page is read from that property of the body
    /// (e.g. `tracks` in a search response).
    pub async fn collect_pages<T: DeserializeOwned>(
        &self,
        first: RequestDescriptor,
        property: Option<&str>,
        max_pages: usize,
    ) -> ApiResult<Vec<T>> {
        let mut items = Vec::new();
        let mut current = first;

        for page_number in 0..max_pages {
            let raw = self.send(&current).await?;
            let page: Page<T> = match property {
                Some(property) => decode_property(&raw, property)?,
                None => decode(&raw)?,
            };
            let next = page.next_request(&current);
            debug!(page = page_number, offset = page.offset, total = page.total, "collected offset page");
            items.extend(page.items);

            match next {
                Some(next) => current = next,
                None => break,
            }
        }
        Ok(items)
    }

    /// Walks cursor pages in the `after` direction, at most `max_pages` of them.
    pub async fn collect_cursor_pages<T: DeserializeOwned>(
        &self,
        first: RequestDescriptor,
        property: Option<&str>,
        max_pages: usize,
    ) -> ApiResult<Vec<T>> {
        let mut items = Vec::new();
        let mut current = first;

        for page_number in 0..max_pages {
            let raw = self.send(&current).await?;
            let page: CursorPage<T> = match property {
                Some(property) => decode_property(&raw, property)?,
                None => decode(&raw)?,
            };
            let next = page.next_request(&current);
            debug!(page = page_number, fetched = page.items.len(), "collected cursor page");
            items.extend(page.items);

            match next {
                Some(next) => current = next,
                None => break,
            }
        }
        Ok(items)
    }
}
