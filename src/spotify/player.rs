use std::{fmt, sync::Arc};

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::{
    error::{ApiError, ApiResult},
    pipeline::{CursorPage, Pipeline, RequestDescriptor, Verb},
    spotify::{pick_market, to_uri},
    types::{CurrentPlaybackContext, Device, PlayHistory},
};

/// Where playback starts inside a context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PlayOffset {
    /// Zero-based position in the context.
    Position { position: u32 },
    /// A track URI inside the context.
    Uri { uri: String },
}

impl PlayOffset {
    pub fn position(position: u32) -> Self {
        PlayOffset::Position { position }
    }

    pub fn uri(uri: impl Into<String>) -> Self {
        PlayOffset::Uri { uri: uri.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatState {
    Track,
    Context,
    Off,
}

impl fmt::Display for RepeatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RepeatState::Track => "track",
            RepeatState::Context => "context",
            RepeatState::Off => "off",
        })
    }
}

/// Playback state and control of the user's devices.
pub struct PlayerApi {
    pipeline: Arc<Pipeline>,
    market: Option<String>,
}

impl PlayerApi {
    pub(crate) fn new(pipeline: Arc<Pipeline>, market: Option<String>) -> Self {
        Self { pipeline, market }
    }

    pub async fn get_devices(&self) -> ApiResult<Vec<Device>> {
        let request = self.pipeline.request(Verb::Get, "me/player/devices").build()?;
        self.pipeline.get_model_from_property(&request, "devices").await
    }

    /// Current playback state, or `None` when nothing is active (the API answers 204).
    pub async fn get_current_playback_info(
        &self,
        market: Option<&str>,
    ) -> ApiResult<Option<CurrentPlaybackContext>> {
        let request = self
            .pipeline
            .request(Verb::Get, "me/player")
            .query_opt("market", pick_market(market, self.market.as_deref()))
            .build()?;
        self.pipeline.get_model(&request).await
    }

    /// The item currently playing, or `None` when nothing is.
    pub async fn get_currently_playing(
        &self,
        market: Option<&str>,
    ) -> ApiResult<Option<CurrentPlaybackContext>> {
        let request = self
            .pipeline
            .request(Verb::Get, "me/player/currently-playing")
            .query_opt("market", pick_market(market, self.market.as_deref()))
            .build()?;
        self.pipeline.get_model(&request).await
    }

    /// Recently played tracks, newest first.
    ///
    /// # Arguments
    ///
    /// * `limit` - page size, 1 to 50
    /// * `after` - only items played after this Unix time in milliseconds
    /// * `before` - only items played before this Unix time in milliseconds
    ///
    /// At most one of `after` and `before` may be given. The returned page derives
    /// further requests through [`CursorPage::next_request`].
    pub async fn get_recently_played_tracks(
        &self,
        limit: u32,
        after: Option<i64>,
        before: Option<i64>,
    ) -> ApiResult<CursorPage<PlayHistory>> {
        let request = self.recently_played_request(limit, after, before)?;
        self.pipeline.get_model(&request).await
    }

    pub fn recently_played_request(
        &self,
        limit: u32,
        after: Option<i64>,
        before: Option<i64>,
    ) -> ApiResult<RequestDescriptor> {
        if after.is_some() && before.is_some() {
            return Err(ApiError::validation(
                "Only one of after and before can be specified.",
            ));
        }
        self.pipeline
            .request(Verb::Get, "me/player/recently-played")
            .require_range("limit", limit.into(), 1, 50)
            .query("limit", limit)
            .query_opt("after", after.map(|a| a.to_string()))
            .query_opt("before", before.map(|b| b.to_string()))
            .build()
    }

    /// Resumes playback on the active or given device.
    pub async fn play(&self, device_id: Option<&str>) -> ApiResult<()> {
        self.start(device_id, Map::new()).await
    }

    /// Plays the given tracks (ids or URIs) in order.
    pub async fn play_tracks(
        &self,
        tracks: &[&str],
        offset: Option<PlayOffset>,
        device_id: Option<&str>,
    ) -> ApiResult<()> {
        if tracks.is_empty() {
            return Err(ApiError::validation("At least one track has to be supplied."));
        }
        let uris: Vec<String> = tracks.iter().map(|t| to_uri("track", t)).collect();
        let mut body = Map::new();
        body.insert("uris".into(), json!(uris));
        if let Some(offset) = offset {
            body.insert("offset".into(), serde_json::to_value(offset)?);
        }
        self.start(device_id, body).await
    }

    pub async fn play_album(
        &self,
        album: &str,
        offset: Option<PlayOffset>,
        device_id: Option<&str>,
    ) -> ApiResult<()> {
        self.play_context("album", album, offset, device_id).await
    }

    pub async fn play_artist(&self, artist: &str, device_id: Option<&str>) -> ApiResult<()> {
        self.play_context("artist", artist, None, device_id).await
    }

    pub async fn play_playlist(
        &self,
        playlist: &str,
        offset: Option<PlayOffset>,
        device_id: Option<&str>,
    ) -> ApiResult<()> {
        self.play_context("playlist", playlist, offset, device_id)
            .await
    }

    async fn play_context(
        &self,
        kind: &str,
        id_or_uri: &str,
        offset: Option<PlayOffset>,
        device_id: Option<&str>,
    ) -> ApiResult<()> {
        if id_or_uri.trim().is_empty() {
            return Err(ApiError::validation(format!("A valid {kind} has to be supplied.")));
        }
        let mut body = Map::new();
        body.insert("context_uri".into(), Value::String(to_uri(kind, id_or_uri)));
        if let Some(offset) = offset {
            body.insert("offset".into(), serde_json::to_value(offset)?);
        }
        self.start(device_id, body).await
    }

    async fn start(&self, device_id: Option<&str>, body: Map<String, Value>) -> ApiResult<()> {
        let mut builder = self
            .pipeline
            .request(Verb::Put, "me/player/play")
            .query_opt("device_id", device_id);
        if !body.is_empty() {
            builder = builder.json_body(&body);
        }
        self.pipeline.execute(&builder.build()?).await
    }

    pub async fn pause(&self, device_id: Option<&str>) -> ApiResult<()> {
        self.control(Verb::Put, "me/player/pause", device_id).await
    }

    pub async fn skip_next(&self, device_id: Option<&str>) -> ApiResult<()> {
        self.control(Verb::Post, "me/player/next", device_id).await
    }

    pub async fn skip_previous(&self, device_id: Option<&str>) -> ApiResult<()> {
        self.control(Verb::Post, "me/player/previous", device_id).await
    }

    async fn control(&self, verb: Verb, path: &str, device_id: Option<&str>) -> ApiResult<()> {
        let request = self
            .pipeline
            .request(verb, path)
            .query_opt("device_id", device_id)
            .build()?;
        self.pipeline.execute(&request).await
    }

    pub async fn seek(&self, position_ms: u64, device_id: Option<&str>) -> ApiResult<()> {
        let request = self
            .pipeline
            .request(Verb::Put, "me/player/seek")
            .query("position_ms", position_ms)
            .query_opt("device_id", device_id)
            .build()?;
        self.pipeline.execute(&request).await
    }

    pub async fn shuffle(&self, state: bool, device_id: Option<&str>) -> ApiResult<()> {
        let request = self
            .pipeline
            .request(Verb::Put, "me/player/shuffle")
            .query("state", state)
            .query_opt("device_id", device_id)
            .build()?;
        self.pipeline.execute(&request).await
    }

    /// Sets the volume in percent, 0 to 100.
    pub async fn volume(&self, volume_percent: u32, device_id: Option<&str>) -> ApiResult<()> {
        let request = self
            .pipeline
            .request(Verb::Put, "me/player/volume")
            .require_range("volume", volume_percent.into(), 0, 100)
            .query("volume_percent", volume_percent)
            .query_opt("device_id", device_id)
            .build()?;
        self.pipeline.execute(&request).await
    }

    pub async fn repeat(&self, state: RepeatState, device_id: Option<&str>) -> ApiResult<()> {
        let request = self
            .pipeline
            .request(Verb::Put, "me/player/repeat")
            .query("state", state)
            .query_opt("device_id", device_id)
            .build()?;
        self.pipeline.execute(&request).await
    }

    /// Moves playback to `device_id`; `play` forces playback to start there.
    pub async fn transfer_playback(&self, device_id: &str, play: bool) -> ApiResult<()> {
        let request = self
            .pipeline
            .request(Verb::Put, "me/player")
            .require_non_blank("device id", device_id)
            .json_body(&json!({ "device_ids": [device_id], "play": play }))
            .build()?;
        self.pipeline.execute(&request).await
    }

    /// Appends a track or episode URI to the user's queue.
    pub async fn add_to_queue(&self, uri: &str, device_id: Option<&str>) -> ApiResult<()> {
        let request = self
            .pipeline
            .request(Verb::Post, "me/player/queue")
            .require_non_blank("uri", uri)
            .query("uri", uri.trim())
            .query_opt("device_id", device_id)
            .build()?;
        self.pipeline.execute(&request).await
    }
}
