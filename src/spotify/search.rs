use std::{fmt, str::FromStr, sync::Arc};

use crate::{
    error::{ApiError, ApiResult},
    pipeline::{Pipeline, Verb},
    spotify::pick_market,
    types::SearchResults,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    Album,
    Artist,
    Playlist,
    Track,
}

impl SearchType {
    fn as_str(self) -> &'static str {
        match self {
            SearchType::Album => "album",
            SearchType::Artist => "artist",
            SearchType::Playlist => "playlist",
            SearchType::Track => "track",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "album" => Ok(SearchType::Album),
            "artist" => Ok(SearchType::Artist),
            "playlist" => Ok(SearchType::Playlist),
            "track" => Ok(SearchType::Track),
            other => Err(ApiError::validation(format!("unknown search type {other:?}"))),
        }
    }
}

pub struct SearchApi {
    pipeline: Arc<Pipeline>,
    market: Option<String>,
}

impl SearchApi {
    pub(crate) fn new(pipeline: Arc<Pipeline>, market: Option<String>) -> Self {
        Self { pipeline, market }
    }

    /// Searches the catalog.
    ///
    /// The response carries one offset page per requested type under the type's
    /// plural name (`tracks`, `artists`, ...).
    ///
    /// # Arguments
    ///
    /// * `query` - search terms, including field filters such as `artist:`
    /// * `types` - at least one item type
    /// * `limit` - 1 to 50 results per type
    /// * `offset` - 0 to 1000
    pub async fn search(
        &self,
        query: &str,
        types: &[SearchType],
        market: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> ApiResult<SearchResults> {
        let type_names: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
        let request = self
            .pipeline
            .request(Verb::Get, "search")
            .require_non_blank("query", query)
            .require_ids("types", &type_names, 1, 4)
            .require_range("limit", limit.into(), 1, 50)
            .require_range("offset", offset.into(), 0, 1000)
            .query("q", query)
            .query_csv("type", &type_names)
            .query_opt("market", pick_market(market, self.market.as_deref()))
            .query("limit", limit)
            .query("offset", offset)
            .build()?;
        self.pipeline.get_model(&request).await
    }
}
