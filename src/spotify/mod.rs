//! # Spotify Endpoint Wrappers
//!
//! Resource-specific entry points built on the shared [`Pipeline`]. Every wrapper is a
//! thin struct holding an `Arc<Pipeline>`: it validates its arguments through the
//! [`RequestBuilder`](crate::pipeline::RequestBuilder) helpers, picks the decode shape
//! and hands the rest to the pipeline.
//!
//! ```text
//! SpotifyClient
//!     ├── tracks()     GET tracks, audio features and analysis
//!     ├── player()     playback state and control
//!     ├── library()    saved albums, shows and tracks
//!     ├── follow()     followed artists, users and playlists
//!     ├── playlists()  playlist reads, creation and track additions
//!     └── search()     catalog search
//!          ↓
//!      Pipeline (credentials, dispatch, retries, decoding)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! let settings = config::Settings::from_env()?;
//! let client = SpotifyClient::from_settings(&settings)?;
//! let track = client.tracks().get_track("11dFghVXANMlKmJXsNCbNl", None).await?;
//! ```

pub mod follow;
pub mod library;
pub mod player;
pub mod playlists;
pub mod search;
pub mod tracks;

use std::{borrow::Cow, sync::Arc};

use tokio_util::sync::CancellationToken;

use crate::{
    config::Settings,
    error::ApiResult,
    pipeline::{Pipeline, RetryPolicy, build_transport},
};

pub use follow::{FollowApi, FollowType};
pub use library::LibraryApi;
pub use player::{PlayOffset, PlayerApi, RepeatState};
pub use playlists::PlaylistsApi;
pub use search::{SearchApi, SearchType};
pub use tracks::TracksApi;

/// Entry point to every endpoint wrapper. Cloning shares the pipeline.
#[derive(Clone)]
pub struct SpotifyClient {
    pipeline: Arc<Pipeline>,
    market: Option<String>,
}

impl SpotifyClient {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            market: None,
        }
    }

    /// Builds the transport and the pipeline from loaded settings.
    ///
    /// The per-attempt timeout of the retry policy follows the configured HTTP
    /// timeout.
    pub fn from_settings(settings: &Settings) -> ApiResult<Self> {
        let transport = build_transport(settings.timeout)?;
        let policy = RetryPolicy::default().with_attempt_timeout(settings.timeout);
        let pipeline = Pipeline::new(
            transport,
            settings.api_url.clone(),
            settings.credential_source.clone(),
            policy,
        );
        Ok(Self {
            pipeline: Arc::new(pipeline),
            market: settings.market.clone(),
        })
    }

    /// Market applied when a call leaves its `market` argument empty.
    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = Some(market.into());
        self
    }

    /// A client whose calls fail with `Cancelled` once `cancel` fires. The
    /// credential cache and transport stay shared with `self`.
    pub fn with_cancellation(&self, cancel: CancellationToken) -> Self {
        Self {
            pipeline: Arc::new(self.pipeline.with_cancellation(cancel)),
            market: self.market.clone(),
        }
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    pub fn market(&self) -> Option<&str> {
        self.market.as_deref()
    }

    pub fn tracks(&self) -> TracksApi {
        TracksApi::new(self.pipeline.clone(), self.market.clone())
    }

    pub fn player(&self) -> PlayerApi {
        PlayerApi::new(self.pipeline.clone(), self.market.clone())
    }

    pub fn library(&self) -> LibraryApi {
        LibraryApi::new(self.pipeline.clone(), self.market.clone())
    }

    pub fn follow(&self) -> FollowApi {
        FollowApi::new(self.pipeline.clone())
    }

    pub fn playlists(&self) -> PlaylistsApi {
        PlaylistsApi::new(self.pipeline.clone(), self.market.clone())
    }

    pub fn search(&self) -> SearchApi {
        SearchApi::new(self.pipeline.clone(), self.market.clone())
    }
}

/// Percent-encodes one path segment built from caller input.
pub(crate) fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Picks the call's market, falling back to the client default.
pub(crate) fn pick_market<'a>(explicit: Option<&'a str>, default: Option<&'a str>) -> Option<&'a str> {
    explicit
        .filter(|m| !m.trim().is_empty())
        .or(default)
}

/// Normalizes an id or `spotify:` URI into a URI of the given kind.
///
/// ```ignore
/// assert_eq!(to_uri("track", "4iV5W9uYEdYUVa79Axb7Rh"), "spotify:track:4iV5W9uYEdYUVa79Axb7Rh");
/// assert_eq!(to_uri("track", "spotify:track:4iV5"), "spotify:track:4iV5");
/// ```
pub fn to_uri(kind: &str, id_or_uri: &str) -> String {
    let trimmed = id_or_uri.trim();
    if trimmed.starts_with("spotify:") {
        trimmed.to_string()
    } else {
        format!("spotify:{kind}:{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_become_uris() {
        assert_eq!(to_uri("album", " 4aawyAB9vmqN3uQ7FjRGTy "), "spotify:album:4aawyAB9vmqN3uQ7FjRGTy");
        assert_eq!(to_uri("album", "spotify:album:abc"), "spotify:album:abc");
    }

    #[test]
    fn explicit_market_wins_over_default() {
        assert_eq!(pick_market(Some("DE"), Some("US")), Some("DE"));
        assert_eq!(pick_market(Some(" "), Some("US")), Some("US"));
        assert_eq!(pick_market(None, None), None);
    }

    #[test]
    fn segments_are_percent_encoded() {
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }
}
