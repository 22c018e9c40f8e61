use std::sync::Arc;

use crate::{
    error::ApiResult,
    pipeline::{Pipeline, Verb},
    spotify::{pick_market, segment},
    types::{Track, TrackAudioAnalysis, TrackAudioFeatures},
};

const MAX_TRACK_IDS: usize = 50;
const MAX_AUDIO_FEATURE_IDS: usize = 100;

/// Catalog track lookups.
pub struct TracksApi {
    pipeline: Arc<Pipeline>,
    market: Option<String>,
}

impl TracksApi {
    pub(crate) fn new(pipeline: Arc<Pipeline>, market: Option<String>) -> Self {
        Self { pipeline, market }
    }

    /// Retrieves catalog information for a single track.
    ///
    /// # Arguments
    ///
    /// * `id` - Spotify track id
    /// * `market` - ISO 3166-1 alpha-2 country code; falls back to the client market
    ///
    /// # Errors
    ///
    /// `Validation` for a blank id, `NotFound` when the id does not exist.
    pub async fn get_track(&self, id: &str, market: Option<&str>) -> ApiResult<Track> {
        let request = self
            .pipeline
            .request(Verb::Get, format!("tracks/{}", segment(id)))
            .require_non_blank("track id", id)
            .query_opt("market", pick_market(market, self.market.as_deref()))
            .build()?;
        self.pipeline.get_model(&request).await
    }

    /// Retrieves up to 50 tracks in one call. Unknown ids are skipped by the API.
    pub async fn get_tracks(&self, ids: &[&str], market: Option<&str>) -> ApiResult<Vec<Track>> {
        let request = self
            .pipeline
            .request(Verb::Get, "tracks")
            .require_ids("track ids", ids, 1, MAX_TRACK_IDS)
            .query_csv("ids", ids)
            .query_opt("market", pick_market(market, self.market.as_deref()))
            .build()?;
        let tracks: Vec<Option<Track>> = self
            .pipeline
            .get_model_from_property(&request, "tracks")
            .await?;
        Ok(tracks.into_iter().flatten().collect())
    }

    pub async fn get_track_audio_features(&self, id: &str) -> ApiResult<TrackAudioFeatures> {
        let request = self
            .pipeline
            .request(Verb::Get, format!("audio-features/{}", segment(id)))
            .require_non_blank("track id", id)
            .build()?;
        self.pipeline.get_model(&request).await
    }

    /// Audio features for up to 100 tracks, read from the `audio_features` property.
    pub async fn get_tracks_audio_features(&self, ids: &[&str]) -> ApiResult<Vec<TrackAudioFeatures>> {
        let request = self
            .pipeline
            .request(Verb::Get, "audio-features")
            .require_ids("track ids", ids, 1, MAX_AUDIO_FEATURE_IDS)
            .query_csv("ids", ids)
            .build()?;
        let features: Vec<Option<TrackAudioFeatures>> = self
            .pipeline
            .get_model_from_property(&request, "audio_features")
            .await?;
        Ok(features.into_iter().flatten().collect())
    }

    pub async fn get_track_audio_analysis(&self, id: &str) -> ApiResult<TrackAudioAnalysis> {
        let request = self
            .pipeline
            .request(Verb::Get, format!("audio-analysis/{}", segment(id)))
            .require_non_blank("track id", id)
            .build()?;
        self.pipeline.get_model(&request).await
    }
}
