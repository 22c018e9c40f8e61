use std::{fmt, sync::Arc};

use serde_json::json;

use crate::{
    error::ApiResult,
    pipeline::{CursorPage, Pipeline, RequestDescriptor, Verb},
    spotify::segment,
    types::Artist,
};

const MAX_IDS: usize = 50;
const MAX_PLAYLIST_FOLLOWER_IDS: usize = 5;

/// What a follow call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowType {
    Artist,
    User,
}

impl fmt::Display for FollowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FollowType::Artist => "artist",
            FollowType::User => "user",
        })
    }
}

/// The user's follow graph: artists, other users and playlists.
pub struct FollowApi {
    pipeline: Arc<Pipeline>,
}

impl FollowApi {
    pub(crate) fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn check_follows_artists(&self, ids: &[&str]) -> ApiResult<Vec<bool>> {
        self.check(FollowType::Artist, ids).await
    }

    pub async fn check_follows_users(&self, ids: &[&str]) -> ApiResult<Vec<bool>> {
        self.check(FollowType::User, ids).await
    }

    async fn check(&self, kind: FollowType, ids: &[&str]) -> ApiResult<Vec<bool>> {
        let request = self
            .pipeline
            .request(Verb::Get, "me/following/contains")
            .require_ids(&format!("{kind} ids"), ids, 1, MAX_IDS)
            .query("type", kind)
            .query_csv("ids", ids)
            .build()?;
        self.pipeline.get_model(&request).await
    }

    /// Whether each of up to five users follows the playlist.
    pub async fn check_users_follow_playlist(
        &self,
        playlist_id: &str,
        user_ids: &[&str],
    ) -> ApiResult<Vec<bool>> {
        let request = self
            .pipeline
            .request(
                Verb::Get,
                format!("playlists/{}/followers/contains", segment(playlist_id)),
            )
            .require_non_blank("playlist id", playlist_id)
            .require_ids("user ids", user_ids, 1, MAX_PLAYLIST_FOLLOWER_IDS)
            .query_csv("ids", user_ids)
            .build()?;
        self.pipeline.get_model(&request).await
    }

    pub async fn follow_artists(&self, ids: &[&str]) -> ApiResult<()> {
        self.change(Verb::Put, FollowType::Artist, ids).await
    }

    pub async fn follow_users(&self, ids: &[&str]) -> ApiResult<()> {
        self.change(Verb::Put, FollowType::User, ids).await
    }

    pub async fn unfollow_artists(&self, ids: &[&str]) -> ApiResult<()> {
        self.change(Verb::Delete, FollowType::Artist, ids).await
    }

    pub async fn unfollow_users(&self, ids: &[&str]) -> ApiResult<()> {
        self.change(Verb::Delete, FollowType::User, ids).await
    }

    async fn change(&self, verb: Verb, kind: FollowType, ids: &[&str]) -> ApiResult<()> {
        let request = self
            .pipeline
            .request(verb, "me/following")
            .require_ids(&format!("{kind} ids"), ids, 1, MAX_IDS)
            .query("type", kind)
            .query_csv("ids", ids)
            .build()?;
        self.pipeline.execute(&request).await
    }

    /// Follows a playlist, listing it on the user's profile when `public` is set.
    pub async fn follow_playlist(&self, playlist_id: &str, public: bool) -> ApiResult<()> {
        let request = self
            .pipeline
            .request(
                Verb::Put,
                format!("playlists/{}/followers", segment(playlist_id)),
            )
            .require_non_blank("playlist id", playlist_id)
            .json_body(&json!({ "public": public }))
            .build()?;
        self.pipeline.execute(&request).await
    }

    pub async fn unfollow_playlist(&self, playlist_id: &str) -> ApiResult<()> {
        let request = self
            .pipeline
            .request(
                Verb::Delete,
                format!("playlists/{}/followers", segment(playlist_id)),
            )
            .require_non_blank("playlist id", playlist_id)
            .build()?;
        self.pipeline.execute(&request).await
    }

    pub fn followed_artists_request(
        &self,
        limit: u32,
        after: Option<&str>,
    ) -> ApiResult<RequestDescriptor> {
        self.pipeline
            .request(Verb::Get, "me/following")
            .require_range("limit", limit.into(), 1, 50)
            .query("type", FollowType::Artist)
            .query("limit", limit)
            .query_opt("after", after)
            .build()
    }

    /// One cursor page of followed artists, read from the `artists` property.
    ///
    /// # Arguments
    ///
    /// * `limit` - page size, 1 to 50
    /// * `after` - the last artist id of the previous page
    pub async fn get_followed_artists(
        &self,
        limit: u32,
        after: Option<&str>,
    ) -> ApiResult<CursorPage<Artist>> {
        let request = self.followed_artists_request(limit, after)?;
        self.pipeline
            .get_model_from_property(&request, "artists")
            .await
    }

    /// Walks every followed artist page, at most `max_pages` of them.
    pub async fn get_all_followed_artists(&self, max_pages: usize) -> ApiResult<Vec<Artist>> {
        let first = self.followed_artists_request(50, None)?;
        self.pipeline
            .collect_cursor_pages(first, Some("artists"), max_pages)
            .await
    }
}
