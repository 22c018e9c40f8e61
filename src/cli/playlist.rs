use crate::{error, info, spotify::SpotifyClient, utils, warning};

const MAX_PLAYLIST_PAGES: usize = 50;

/// Prints a playlist's details followed by all of its tracks.
pub async fn playlist(client: &SpotifyClient, id: &str) {
    let id = utils::extract_id(id);
    let playlists = client.playlists();

    let pb = utils::spinner("Fetching playlist...");
    let details = playlists.get_playlist(&id, None).await;
    let items = match &details {
        Ok(_) => Some(playlists.get_all_playlist_tracks(&id, MAX_PLAYLIST_PAGES).await),
        Err(_) => None,
    };
    pb.finish_and_clear();

    let playlist = match details {
        Ok(playlist) => playlist,
        Err(e) => error!("Cannot fetch playlist {}. Err: {}", id, e),
    };

    let owner = playlist
        .owner
        .as_ref()
        .map(|o| o.display_name.clone().unwrap_or_else(|| o.id.clone()))
        .unwrap_or_default();
    info!("{} by {} ({} tracks)", playlist.name, owner, playlist.tracks.total);
    if let Some(description) = playlist.description.filter(|d| !d.is_empty()) {
        info!("{}", description);
    }

    match items {
        Some(Ok(items)) => {
            let unavailable = items.iter().filter(|i| i.track.is_none()).count();
            let tracks: Vec<_> = items.into_iter().filter_map(|i| i.track).collect();
            super::tracks::print_tracks(&tracks);
            if unavailable > 0 {
                warning!("{} items are no longer available", unavailable);
            }
        }
        Some(Err(e)) => error!("Cannot fetch playlist tracks. Err: {}", e),
        None => {}
    }
}
