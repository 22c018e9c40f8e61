use sporlapi::types::{Artist, Device, DeviceTableRow, Track, TrackTableRow};
use sporlapi::utils::*;

// Helper function to create a test artist
fn create_test_artist(id: &str, name: &str) -> Artist {
    Artist {
        id: id.to_string(),
        name: name.to_string(),
        ..Artist::default()
    }
}

#[test]
fn test_extract_id_from_plain_id() {
    assert_eq!(extract_id("4iV5W9uYEdYUVa79Axb7Rh"), "4iV5W9uYEdYUVa79Axb7Rh");
    assert_eq!(extract_id("  4iV5W9uYEdYUVa79Axb7Rh \n"), "4iV5W9uYEdYUVa79Axb7Rh");
}

#[test]
fn test_extract_id_from_uri() {
    assert_eq!(extract_id("spotify:track:4iV5W9uYEdYUVa79Axb7Rh"), "4iV5W9uYEdYUVa79Axb7Rh");
    assert_eq!(extract_id("spotify:user:someone:playlist:37i9dQZF1"), "37i9dQZF1");
}

#[test]
fn test_extract_id_from_link() {
    assert_eq!(
        extract_id("https://open.spotify.com/track/4iV5W9uYEdYUVa79Axb7Rh?si=abc"),
        "4iV5W9uYEdYUVa79Axb7Rh"
    );
    assert_eq!(
        extract_id("https://open.spotify.com/intl-de/album/1DFixLWuPkv3KT3TnV35m3/"),
        "1DFixLWuPkv3KT3TnV35m3"
    );
}

#[test]
fn test_parse_ids_splits_and_dedupes() {
    let inputs = vec![
        "a,b".to_string(),
        "spotify:track:c".to_string(),
        " b , ,a".to_string(),
    ];
    assert_eq!(parse_ids(&inputs), vec!["a", "b", "c"]);
}

#[test]
fn test_parse_ids_empty_input() {
    assert!(parse_ids(&[]).is_empty());
    assert!(parse_ids(&[" , ".to_string()]).is_empty());
}

#[test]
fn test_format_duration() {
    assert_eq!(format_duration(0), "0:00");
    assert_eq!(format_duration(207_959), "3:27");
    assert_eq!(format_duration(3_725_000), "1:02:05");
}

#[test]
fn test_sort_artists_by_name_ignores_case() {
    let mut artists = vec![
        create_test_artist("1", "beta"),
        create_test_artist("2", "Alpha"),
        create_test_artist("3", "Gamma"),
    ];
    sort_artists_by_name(&mut artists);

    let names: Vec<_> = artists.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "beta", "Gamma"]);
}

#[test]
fn test_track_table_row() {
    let track: Track = serde_json::from_value(serde_json::json!({
        "id": "t1",
        "name": "Song",
        "duration_ms": 61_000,
        "artists": [{ "name": "A" }, { "name": "B" }],
        "album": { "name": "Record" }
    }))
    .unwrap();

    let row = TrackTableRow::from(&track);
    assert_eq!(row.artists, "A, B");
    assert_eq!(row.album, "Record");
    assert_eq!(row.duration, "1:01");
    assert_eq!(row.id, "t1");
}

#[test]
fn test_device_table_row_without_id() {
    let device = Device {
        name: "Web Player".to_string(),
        device_type: "Computer".to_string(),
        is_active: true,
        volume_percent: Some(55),
        ..Device::default()
    };

    let row = DeviceTableRow::from(&device);
    assert_eq!(row.id, "-");
    assert_eq!(row.active, "yes");
    assert_eq!(row.volume, "55%");
}
