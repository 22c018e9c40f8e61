use tabled::Table;

use crate::{
    error, info,
    spotify::SpotifyClient,
    types::DeviceTableRow,
    utils, warning,
};

pub async fn devices(client: &SpotifyClient) {
    let pb = utils::spinner("Fetching devices...");
    let result = client.player().get_devices().await;
    pb.finish_and_clear();

    match result {
        Ok(devices) if devices.is_empty() => warning!("No devices available"),
        Ok(devices) => {
            let rows: Vec<DeviceTableRow> = devices.iter().map(DeviceTableRow::from).collect();
            println!("{}", Table::new(rows));
        }
        Err(e) => error!("Cannot fetch devices. Err: {}", e),
    }
}

pub async fn playing(client: &SpotifyClient) {
    let pb = utils::spinner("Fetching playback state...");
    let result = client.player().get_currently_playing(None).await;
    pb.finish_and_clear();

    match result {
        Ok(None) => info!("Nothing is playing right now"),
        Ok(Some(context)) => match context.track() {
            Some(track) => {
                let artists = track
                    .artists
                    .iter()
                    .map(|a| a.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let progress = context.progress_ms.map(utils::format_duration);
                info!(
                    "{} {} - {} [{} / {}]",
                    if context.is_playing { "Playing" } else { "Paused" },
                    artists,
                    track.name,
                    progress.unwrap_or_else(|| "-".to_string()),
                    utils::format_duration(track.duration_ms)
                );
            }
            None => info!(
                "Playing a {}",
                context
                    .currently_playing_type
                    .unwrap_or_else(|| "non-track item".to_string())
            ),
        },
        Err(e) => error!("Cannot fetch playback state. Err: {}", e),
    }
}
