use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::{
    pipeline::{CursorPage, Page},
    utils::format_duration,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Followers {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimplifiedArtist {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub followers: Option<Followers>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimplifiedAlbum {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub album_type: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub release_date_precision: Option<String>,
    #[serde(default)]
    pub total_tracks: Option<u32>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub album_type: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub tracks: Page<SimplifiedTrack>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimplifiedTrack {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub track_number: Option<u32>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub uri: Option<String>,
}

/// Full track object. `id` is absent for local files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub track_number: Option<u32>,
    #[serde(default)]
    pub disc_number: Option<u32>,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default)]
    pub is_playable: Option<bool>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub album: Option<SimplifiedAlbum>,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackAudioFeatures {
    pub id: String,
    #[serde(default)]
    pub acousticness: f32,
    #[serde(default)]
    pub danceability: f32,
    #[serde(default)]
    pub energy: f32,
    #[serde(default)]
    pub instrumentalness: f32,
    #[serde(default)]
    pub key: i32,
    #[serde(default)]
    pub liveness: f32,
    #[serde(default)]
    pub loudness: f32,
    #[serde(default)]
    pub mode: i32,
    #[serde(default)]
    pub speechiness: f32,
    #[serde(default)]
    pub tempo: f32,
    #[serde(default)]
    pub time_signature: i32,
    #[serde(default)]
    pub valence: f32,
    #[serde(default)]
    pub duration_ms: u64,
}

/// Only the summary sections are modelled; bars, beats and segments stay raw.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackAudioAnalysis {
    #[serde(default)]
    pub track: serde_json::Value,
    #[serde(default)]
    pub bars: Vec<serde_json::Value>,
    #[serde(default)]
    pub beats: Vec<serde_json::Value>,
    #[serde(default)]
    pub sections: Vec<serde_json::Value>,
    #[serde(default)]
    pub segments: Vec<serde_json::Value>,
    #[serde(default)]
    pub tatums: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub device_type: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_private_session: bool,
    #[serde(default)]
    pub is_restricted: bool,
    #[serde(default)]
    pub volume_percent: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaybackContext {
    #[serde(default, rename = "type")]
    pub context_type: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentPlaybackContext {
    #[serde(default)]
    pub device: Option<Device>,
    #[serde(default)]
    pub repeat_state: Option<String>,
    #[serde(default)]
    pub shuffle_state: Option<bool>,
    #[serde(default)]
    pub context: Option<PlaybackContext>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub currently_playing_type: Option<String>,
    /// A track, or an episode when `currently_playing_type` is `episode`.
    #[serde(default)]
    pub item: Option<serde_json::Value>,
}

impl CurrentPlaybackContext {
    /// The playing item as a track, if it is one.
    pub fn track(&self) -> Option<Track> {
        match self.currently_playing_type.as_deref() {
            Some("track") | None => self
                .item
                .clone()
                .and_then(|item| serde_json::from_value(item).ok()),
            Some(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayHistory {
    pub track: Track,
    #[serde(default)]
    pub played_at: Option<String>,
    #[serde(default)]
    pub context: Option<PlaybackContext>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavedTrack {
    #[serde(default)]
    pub added_at: Option<String>,
    pub track: Track,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavedAlbum {
    #[serde(default)]
    pub added_at: Option<String>,
    pub album: Album,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Show {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub total_episodes: Option<u32>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavedShow {
    #[serde(default)]
    pub added_at: Option<String>,
    pub show: Show,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistTrack {
    #[serde(default)]
    pub added_at: Option<String>,
    #[serde(default)]
    pub added_by: Option<PublicUser>,
    #[serde(default)]
    pub is_local: bool,
    /// `null` when the track is no longer available.
    #[serde(default)]
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimplifiedPlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub collaborative: bool,
    #[serde(default)]
    pub owner: Option<PublicUser>,
    #[serde(default)]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub collaborative: bool,
    #[serde(default)]
    pub owner: Option<PublicUser>,
    #[serde(default)]
    pub followers: Option<Followers>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub tracks: Page<PlaylistTrack>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub public: bool,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub snapshot_id: String,
}

/// Search answers with one offset page per requested type, each under its own key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub tracks: Option<Page<Track>>,
    #[serde(default)]
    pub artists: Option<Page<Artist>>,
    #[serde(default)]
    pub albums: Option<Page<SimplifiedAlbum>>,
    #[serde(default)]
    pub playlists: Option<Page<Option<SimplifiedPlaylist>>>,
}

pub type FollowedArtists = CursorPage<Artist>;
pub type RecentlyPlayed = CursorPage<PlayHistory>;

#[derive(Tabled)]
pub struct TrackTableRow {
    pub name: String,
    pub artists: String,
    pub album: String,
    pub duration: String,
    pub id: String,
}

impl From<&Track> for TrackTableRow {
    fn from(track: &Track) -> Self {
        TrackTableRow {
            name: track.name.clone(),
            artists: track
                .artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            album: track
                .album
                .as_ref()
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            duration: format_duration(track.duration_ms),
            id: track.id.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Tabled)]
pub struct ArtistTableRow {
    pub name: String,
    pub genres: String,
    pub followers: String,
}

impl From<&Artist> for ArtistTableRow {
    fn from(artist: &Artist) -> Self {
        ArtistTableRow {
            name: artist.name.clone(),
            genres: artist
                .genres
                .iter()
                .take(3)
                .cloned()
                .collect::<Vec<_>>()
                .join(","),
            followers: artist
                .followers
                .as_ref()
                .map(|f| f.total.to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
pub struct DeviceTableRow {
    pub name: String,
    #[tabled(rename = "type")]
    pub device_type: String,
    pub active: String,
    pub volume: String,
    pub id: String,
}

impl From<&Device> for DeviceTableRow {
    fn from(device: &Device) -> Self {
        DeviceTableRow {
            name: device.name.clone(),
            device_type: device.device_type.clone(),
            active: if device.is_active { "yes" } else { "" }.to_string(),
            volume: device
                .volume_percent
                .map(|v| format!("{v}%"))
                .unwrap_or_default(),
            id: device.id.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}
