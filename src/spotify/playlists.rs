use std::sync::Arc;

use crate::{
    error::ApiResult,
    pipeline::{Page, Pipeline, RequestDescriptor, Verb},
    spotify::{pick_market, segment, to_uri},
    types::{
        AddTracksRequest, CreatePlaylistRequest, Playlist, PlaylistTrack, SimplifiedPlaylist,
        SnapshotResponse,
    },
};

const MAX_TRACK_URIS: usize = 100;

/// Playlist reads, creation and track additions.
pub struct PlaylistsApi {
    pipeline: Arc<Pipeline>,
    market: Option<String>,
}

impl PlaylistsApi {
    pub(crate) fn new(pipeline: Arc<Pipeline>, market: Option<String>) -> Self {
        Self { pipeline, market }
    }

    pub async fn get_playlist(&self, playlist_id: &str, market: Option<&str>) -> ApiResult<Playlist> {
        let request = self
            .pipeline
            .request(Verb::Get, format!("playlists/{}", segment(playlist_id)))
            .require_non_blank("playlist id", playlist_id)
            .query_opt("market", pick_market(market, self.market.as_deref()))
            .build()?;
        self.pipeline.get_model(&request).await
    }

    pub fn playlist_tracks_request(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> ApiResult<RequestDescriptor> {
        self.pipeline
            .request(Verb::Get, format!("playlists/{}/tracks", segment(playlist_id)))
            .require_non_blank("playlist id", playlist_id)
            .require_range("limit", limit.into(), 1, 100)
            .query("limit", limit)
            .query("offset", offset)
            .query_opt("market", self.market.as_deref())
            .build()
    }

    /// One page of a playlist's items, 1 to 100 per page.
    pub async fn get_playlist_tracks(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> ApiResult<Page<PlaylistTrack>> {
        let request = self.playlist_tracks_request(playlist_id, limit, offset)?;
        self.pipeline.get_model(&request).await
    }

    /// Every item of a playlist, fetched page by page.
    pub async fn get_all_playlist_tracks(
        &self,
        playlist_id: &str,
        max_pages: usize,
    ) -> ApiResult<Vec<PlaylistTrack>> {
        let first = self.playlist_tracks_request(playlist_id, 100, 0)?;
        self.pipeline.collect_pages(first, None, max_pages).await
    }

    pub async fn get_current_user_playlists(
        &self,
        limit: u32,
        offset: u32,
    ) -> ApiResult<Page<SimplifiedPlaylist>> {
        let request = self
            .pipeline
            .request(Verb::Get, "me/playlists")
            .require_range("limit", limit.into(), 1, 50)
            .require_range("offset", offset.into(), 0, 100_000)
            .query("limit", limit)
            .query("offset", offset)
            .build()?;
        self.pipeline.get_model(&request).await
    }

    /// Creates a playlist owned by `user_id`.
    ///
    /// # Errors
    ///
    /// `Validation` when the user id or name is blank.
    pub async fn create_playlist(
        &self,
        user_id: &str,
        playlist: &CreatePlaylistRequest,
    ) -> ApiResult<Playlist> {
        let request = self
            .pipeline
            .request(Verb::Post, format!("users/{}/playlists", segment(user_id)))
            .require_non_blank("user id", user_id)
            .require_non_blank("playlist name", &playlist.name)
            .json_body(playlist)
            .build()?;
        self.pipeline.get_model(&request).await
    }

    /// Adds 1 to 100 tracks (ids or URIs), optionally at `position`.
    pub async fn add_tracks(
        &self,
        playlist_id: &str,
        tracks: &[&str],
        position: Option<u32>,
    ) -> ApiResult<SnapshotResponse> {
        let body = AddTracksRequest {
            uris: tracks.iter().map(|t| to_uri("track", t)).collect(),
            position,
        };
        let request = self
            .pipeline
            .request(Verb::Post, format!("playlists/{}/tracks", segment(playlist_id)))
            .require_non_blank("playlist id", playlist_id)
            .require_ids("track uris", tracks, 1, MAX_TRACK_URIS)
            .json_body(&body)
            .build()?;
        self.pipeline.get_model(&request).await
    }
}
