use clap::ValueEnum;
use tabled::{Table, Tabled};

use crate::{error, info, spotify::SpotifyClient, utils};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SavedKind {
    Tracks,
    Albums,
}

#[derive(Tabled)]
struct SavedAlbumRow {
    added: String,
    name: String,
    artists: String,
    released: String,
}

pub async fn saved(client: &SpotifyClient, kind: SavedKind, limit: u32, offset: u32) {
    let pb = utils::spinner("Fetching library...");
    let library = client.library();

    match kind {
        SavedKind::Tracks => {
            let result = library.get_saved_tracks(limit, offset, None).await;
            pb.finish_and_clear();
            match result {
                Ok(page) => {
                    let tracks: Vec<_> = page.items.into_iter().map(|s| s.track).collect();
                    super::tracks::print_tracks(&tracks);
                    info!(
                        "Showing {}-{} of {} saved tracks",
                        page.offset + 1,
                        page.offset as usize + tracks.len(),
                        page.total
                    );
                }
                Err(e) => error!("Cannot fetch saved tracks. Err: {}", e),
            }
        }
        SavedKind::Albums => {
            let result = library.get_saved_albums(limit, offset, None).await;
            pb.finish_and_clear();
            match result {
                Ok(page) => {
                    let rows: Vec<SavedAlbumRow> = page
                        .items
                        .iter()
                        .map(|saved| SavedAlbumRow {
                            added: saved
                                .added_at
                                .as_deref()
                                .and_then(|a| a.get(..10))
                                .unwrap_or("-")
                                .to_string(),
                            name: saved.album.name.clone(),
                            artists: saved
                                .album
                                .artists
                                .iter()
                                .map(|a| a.name.as_str())
                                .collect::<Vec<_>>()
                                .join(", "),
                            released: saved.album.release_date.clone().unwrap_or_default(),
                        })
                        .collect();
                    let shown = rows.len();
                    println!("{}", Table::new(rows));
                    info!(
                        "Showing {}-{} of {} saved albums",
                        page.offset + 1,
                        page.offset as usize + shown,
                        page.total
                    );
                }
                Err(e) => error!("Cannot fetch saved albums. Err: {}", e),
            }
        }
    }
}
