//! # CLI Module
//!
//! Command implementations for the `sporlapi` binary. Each command takes a ready
//! [`SpotifyClient`](crate::spotify::SpotifyClient), shows a spinner while the call is
//! in flight and prints the result as a table or a status line.
//!
//! ## Commands
//!
//! - [`track`], [`tracks`] - Catalog track lookups
//! - [`devices`], [`playing`] - Playback state
//! - [`saved`] - Saved tracks or albums of the user
//! - [`following`], [`follows`] - Followed artists and follow checks
//! - [`search`] - Catalog search
//! - [`playlist`] - Playlist details and items
//!
//! ## Error Handling
//!
//! Failures end the process through the `error!` macro with the classified
//! [`ApiError`](crate::error::ApiError) as message. Validation errors are reported
//! before any request is sent.
//!
//! ## Usage
//!
//! ```bash
//! sporlapi track 11dFghVXANMlKmJXsNCbNl
//! sporlapi tracks 11dFghVXANMlKmJXsNCbNl,7ouMYWpwJ422jRcDASZB7P
//! sporlapi search "daft punk" --type artist --type album
//! sporlapi following --all
//! ```

mod follow;
mod library;
mod player;
mod playlist;
mod search;
mod tracks;

pub use follow::{following, follows};
pub use library::{SavedKind, saved};
pub use player::{devices, playing};
pub use playlist::playlist;
pub use search::search;
pub use tracks::{track, tracks};
