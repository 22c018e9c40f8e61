use tabled::Table;

use crate::{
    error, info,
    spotify::SpotifyClient,
    types::{Track, TrackTableRow},
    utils, warning,
};

pub async fn track(client: &SpotifyClient, id: &str) {
    let id = utils::extract_id(id);
    let pb = utils::spinner("Fetching track...");
    let result = client.tracks().get_track(&id, None).await;
    pb.finish_and_clear();

    match result {
        Ok(track) => print_tracks(&[track]),
        Err(e) => error!("Cannot fetch track {}. Err: {}", id, e),
    }
}

pub async fn tracks(client: &SpotifyClient, ids: &[String]) {
    let ids = utils::parse_ids(ids);
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

    let pb = utils::spinner("Fetching tracks...");
    let result = client.tracks().get_tracks(&id_refs, None).await;
    pb.finish_and_clear();

    match result {
        Ok(found) => {
            if found.len() < ids.len() {
                warning!("{} of {} ids were not found", ids.len() - found.len(), ids.len());
            }
            print_tracks(&found);
        }
        Err(e) => error!("Cannot fetch tracks. Err: {}", e),
    }
}

pub(crate) fn print_tracks(tracks: &[Track]) {
    if tracks.is_empty() {
        info!("No tracks found");
        return;
    }
    let rows: Vec<TrackTableRow> = tracks.iter().map(TrackTableRow::from).collect();
    println!("{}", Table::new(rows));
}
