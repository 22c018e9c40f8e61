use tabled::{Table, Tabled};

use crate::{
    error, info,
    spotify::SpotifyClient,
    success,
    types::ArtistTableRow,
    utils,
};

const MAX_FOLLOWED_PAGES: usize = 100;

/// Lists followed artists; one page, or every page with `all`.
pub async fn following(client: &SpotifyClient, limit: u32, all: bool) {
    let pb = utils::spinner("Fetching followed artists...");
    let follow = client.follow();
    let result = if all {
        follow.get_all_followed_artists(MAX_FOLLOWED_PAGES).await
    } else {
        follow
            .get_followed_artists(limit, None)
            .await
            .map(|page| page.items)
    };
    pb.finish_and_clear();

    match result {
        Ok(mut artists) => {
            if artists.is_empty() {
                info!("Not following any artists");
                return;
            }
            utils::sort_artists_by_name(&mut artists);
            let rows: Vec<ArtistTableRow> = artists.iter().map(ArtistTableRow::from).collect();
            println!("{}", Table::new(rows));
            success!("{} followed artists", artists.len());
        }
        Err(e) => error!("Cannot fetch followed artists. Err: {}", e),
    }
}

#[derive(Tabled)]
struct FollowCheckRow {
    id: String,
    following: String,
}

/// Checks whether the user follows each of the given artists.
pub async fn follows(client: &SpotifyClient, ids: &[String]) {
    let ids = utils::parse_ids(ids);
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

    let pb = utils::spinner("Checking follows...");
    let result = client.follow().check_follows_artists(&id_refs).await;
    pb.finish_and_clear();

    match result {
        Ok(flags) => {
            let rows: Vec<FollowCheckRow> = ids
                .iter()
                .zip(flags)
                .map(|(id, following)| FollowCheckRow {
                    id: id.clone(),
                    following: if following { "yes" } else { "no" }.to_string(),
                })
                .collect();
            println!("{}", Table::new(rows));
        }
        Err(e) => error!("Cannot check follows. Err: {}", e),
    }
}
