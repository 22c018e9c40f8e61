use tabled::{Table, Tabled};

use crate::{
    error, info,
    spotify::{SearchType, SpotifyClient},
    types::{ArtistTableRow, SimplifiedAlbum},
    utils,
};

#[derive(Tabled)]
struct AlbumRow {
    name: String,
    artists: String,
    released: String,
    id: String,
}

impl From<&SimplifiedAlbum> for AlbumRow {
    fn from(album: &SimplifiedAlbum) -> Self {
        AlbumRow {
            name: album.name.clone(),
            artists: album
                .artists
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            released: album.release_date.clone().unwrap_or_default(),
            id: album.id.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct PlaylistRow {
    name: String,
    owner: String,
    id: String,
}

pub async fn search(client: &SpotifyClient, query: &str, types: &[SearchType], limit: u32) {
    let types = if types.is_empty() {
        vec![SearchType::Track]
    } else {
        types.to_vec()
    };

    let pb = utils::spinner("Searching...");
    let result = client.search().search(query, &types, None, limit, 0).await;
    pb.finish_and_clear();

    let results = match result {
        Ok(results) => results,
        Err(e) => error!("Search failed. Err: {}", e),
    };

    if let Some(page) = results.tracks {
        info!("Tracks ({} total)", page.total);
        super::tracks::print_tracks(&page.items);
    }
    if let Some(page) = results.artists {
        info!("Artists ({} total)", page.total);
        let rows: Vec<ArtistTableRow> = page.items.iter().map(ArtistTableRow::from).collect();
        println!("{}", Table::new(rows));
    }
    if let Some(page) = results.albums {
        info!("Albums ({} total)", page.total);
        let rows: Vec<AlbumRow> = page.items.iter().map(AlbumRow::from).collect();
        println!("{}", Table::new(rows));
    }
    if let Some(page) = results.playlists {
        info!("Playlists ({} total)", page.total);
        // the API returns null entries for playlists it cannot show
        let rows: Vec<PlaylistRow> = page
            .items
            .iter()
            .flatten()
            .map(|p| PlaylistRow {
                name: p.name.clone(),
                owner: p
                    .owner
                    .as_ref()
                    .map(|o| o.display_name.clone().unwrap_or_else(|| o.id.clone()))
                    .unwrap_or_default(),
                id: p.id.clone(),
            })
            .collect();
        println!("{}", Table::new(rows));
    }
}
