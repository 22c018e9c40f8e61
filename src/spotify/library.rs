use std::sync::Arc;

use serde_json::json;

use crate::{
    error::ApiResult,
    pipeline::{Page, Pipeline, RequestDescriptor, Verb},
    spotify::pick_market,
    types::{SavedAlbum, SavedShow, SavedTrack},
};

const MAX_IDS: usize = 50;
const MAX_LIMIT: i64 = 50;

/// The saved kinds of the user's library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Saved {
    Albums,
    Shows,
    Tracks,
}

impl Saved {
    fn path(self) -> &'static str {
        match self {
            Saved::Albums => "me/albums",
            Saved::Shows => "me/shows",
            Saved::Tracks => "me/tracks",
        }
    }

    fn ids_name(self) -> &'static str {
        match self {
            Saved::Albums => "album ids",
            Saved::Shows => "show ids",
            Saved::Tracks => "track ids",
        }
    }
}

/// The user's saved albums, shows and tracks.
pub struct LibraryApi {
    pipeline: Arc<Pipeline>,
    market: Option<String>,
}

impl LibraryApi {
    pub(crate) fn new(pipeline: Arc<Pipeline>, market: Option<String>) -> Self {
        Self { pipeline, market }
    }

    pub async fn check_saved_albums(&self, ids: &[&str]) -> ApiResult<Vec<bool>> {
        self.check(Saved::Albums, ids).await
    }

    pub async fn check_saved_shows(&self, ids: &[&str]) -> ApiResult<Vec<bool>> {
        self.check(Saved::Shows, ids).await
    }

    /// One flag per id, in request order, telling whether the track is saved.
    pub async fn check_saved_tracks(&self, ids: &[&str]) -> ApiResult<Vec<bool>> {
        self.check(Saved::Tracks, ids).await
    }

    async fn check(&self, kind: Saved, ids: &[&str]) -> ApiResult<Vec<bool>> {
        let request = self
            .pipeline
            .request(Verb::Get, format!("{}/contains", kind.path()))
            .require_ids(kind.ids_name(), ids, 1, MAX_IDS)
            .query_csv("ids", ids)
            .build()?;
        self.pipeline.get_model(&request).await
    }

    pub fn saved_albums_request(
        &self,
        limit: u32,
        offset: u32,
        market: Option<&str>,
    ) -> ApiResult<RequestDescriptor> {
        self.page_request(Saved::Albums, limit, offset, market)
    }

    pub fn saved_tracks_request(
        &self,
        limit: u32,
        offset: u32,
        market: Option<&str>,
    ) -> ApiResult<RequestDescriptor> {
        self.page_request(Saved::Tracks, limit, offset, market)
    }

    fn page_request(
        &self,
        kind: Saved,
        limit: u32,
        offset: u32,
        market: Option<&str>,
    ) -> ApiResult<RequestDescriptor> {
        self.pipeline
            .request(Verb::Get, kind.path())
            .require_range("limit", limit.into(), 1, MAX_LIMIT)
            .query("limit", limit)
            .query("offset", offset)
            .query_opt("market", pick_market(market, self.market.as_deref()))
            .build()
    }

    /// One page of saved albums, most recently saved first.
    ///
    /// # Arguments
    ///
    /// * `limit` - page size, 1 to 50
    /// * `offset` - index of the first item
    /// * `market` - country code applied for track relinking
    pub async fn get_saved_albums(
        &self,
        limit: u32,
        offset: u32,
        market: Option<&str>,
    ) -> ApiResult<Page<SavedAlbum>> {
        let request = self.saved_albums_request(limit, offset, market)?;
        self.pipeline.get_model(&request).await
    }

    pub async fn get_saved_tracks(
        &self,
        limit: u32,
        offset: u32,
        market: Option<&str>,
    ) -> ApiResult<Page<SavedTrack>> {
        let request = self.saved_tracks_request(limit, offset, market)?;
        self.pipeline.get_model(&request).await
    }

    // the shows endpoint takes no market
    pub async fn get_saved_shows(&self, limit: u32, offset: u32) -> ApiResult<Page<SavedShow>> {
        let request = self
            .pipeline
            .request(Verb::Get, Saved::Shows.path())
            .require_range("limit", limit.into(), 1, MAX_LIMIT)
            .query("limit", limit)
            .query("offset", offset)
            .build()?;
        self.pipeline.get_model(&request).await
    }

    pub async fn save_albums(&self, ids: &[&str]) -> ApiResult<()> {
        self.save(Saved::Albums, ids).await
    }

    pub async fn save_shows(&self, ids: &[&str]) -> ApiResult<()> {
        self.save(Saved::Shows, ids).await
    }

    pub async fn save_tracks(&self, ids: &[&str]) -> ApiResult<()> {
        self.save(Saved::Tracks, ids).await
    }

    async fn save(&self, kind: Saved, ids: &[&str]) -> ApiResult<()> {
        let request = self
            .pipeline
            .request(Verb::Put, kind.path())
            .require_ids(kind.ids_name(), ids, 1, MAX_IDS)
            .json_body(&json!({ "ids": ids }))
            .build()?;
        self.pipeline.execute(&request).await
    }

    pub async fn remove_saved_albums(&self, ids: &[&str]) -> ApiResult<()> {
        self.remove(Saved::Albums, ids, None).await
    }

    pub async fn remove_saved_shows(&self, ids: &[&str], market: Option<&str>) -> ApiResult<()> {
        let market = pick_market(market, self.market.as_deref());
        self.remove(Saved::Shows, ids, market).await
    }

    pub async fn remove_saved_tracks(&self, ids: &[&str]) -> ApiResult<()> {
        self.remove(Saved::Tracks, ids, None).await
    }

    async fn remove(&self, kind: Saved, ids: &[&str], market: Option<&str>) -> ApiResult<()> {
        let request = self
            .pipeline
            .request(Verb::Delete, kind.path())
            .require_ids(kind.ids_name(), ids, 1, MAX_IDS)
            .query_csv("ids", ids)
            .query_opt("market", market)
            .build()?;
        self.pipeline.execute(&request).await
    }
}
