use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use sporlapi::{
    ErrorKind, Pipeline, SpotifyClient,
    pipeline::{CredentialSource, RetryPolicy},
    spotify::{FollowType, PlayOffset, RepeatState, SearchType},
    types::CreatePlaylistRequest,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

fn client(server: &MockServer) -> SpotifyClient {
    let pipeline = Pipeline::new(
        Client::new(),
        format!("{}/v1", server.uri()),
        CredentialSource::StaticToken("test-token".into()),
        RetryPolicy::default().with_backoff(Duration::from_millis(5), Duration::from_millis(20)),
    );
    SpotifyClient::new(pipeline)
}

fn ids(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("id{i}")).collect()
}

#[tokio::test]
async fn get_track_sends_bearer_and_market() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/11dFghVXANMlKmJXsNCbNl"))
        .and(query_param("market", "DE"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "11dFghVXANMlKmJXsNCbNl",
            "name": "Cut To The Feeling",
            "duration_ms": 207959,
            "artists": [{ "id": "6sFIWsNpZYqfjUpaCgueju", "name": "Carly Rae Jepsen" }],
            "album": { "id": "0tGPJ0bkWOUmH7MEOR77qc", "name": "Cut To The Feeling" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let track = client(&server)
        .tracks()
        .get_track("11dFghVXANMlKmJXsNCbNl", Some("DE"))
        .await
        .unwrap();

    assert_eq!(track.name, "Cut To The Feeling");
    assert_eq!(track.artists[0].name, "Carly Rae Jepsen");
    assert_eq!(track.album.unwrap().name, "Cut To The Feeling");
}

#[tokio::test]
async fn client_market_is_the_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks/abc"))
        .and(query_param("market", "SE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "abc", "name": "x" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).with_market("SE");
    client.tracks().get_track("abc", None).await.unwrap();
}

#[tokio::test]
async fn get_tracks_reads_the_tracks_property_and_skips_nulls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tracks"))
        .and(query_param("ids", "a,b,c"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": [{ "id": "a", "name": "A" }, null, { "id": "c", "name": "C" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tracks = client(&server)
        .tracks()
        .get_tracks(&["a", "b", "c"], None)
        .await
        .unwrap();

    let names: Vec<_> = tracks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["A", "C"]);
}

#[tokio::test]
async fn audio_features_batch_reads_nested_property() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/audio-features"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "audio_features": [{ "id": "a", "tempo": 118.2, "energy": 0.8 }]
        })))
        .mount(&server)
        .await;

    let features = client(&server)
        .tracks()
        .get_tracks_audio_features(&["a"])
        .await
        .unwrap();
    assert_eq!(features.len(), 1);
    assert!((features[0].tempo - 118.2).abs() < 1e-3);
}

#[tokio::test]
async fn devices_are_read_from_their_property() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": [{ "id": "d1", "name": "Kitchen", "type": "Speaker", "is_active": true }]
        })))
        .mount(&server)
        .await;

    let devices = client(&server).player().get_devices().await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].id.as_deref(), Some("d1"));
    assert_eq!(devices[0].device_type, "Speaker");
}

#[tokio::test]
async fn missing_devices_property_is_an_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let devices = client(&server).player().get_devices().await.unwrap();
    assert!(devices.is_empty());
}

#[tokio::test]
async fn no_content_playback_state_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let state = client(&server)
        .player()
        .get_current_playback_info(None)
        .await
        .unwrap();
    assert!(state.is_none());
}

#[tokio::test]
async fn currently_playing_exposes_the_track() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/currently-playing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_playing": true,
            "progress_ms": 42000,
            "currently_playing_type": "track",
            "item": { "id": "t1", "name": "Song", "duration_ms": 180000 }
        })))
        .mount(&server)
        .await;

    let context = client(&server)
        .player()
        .get_currently_playing(None)
        .await
        .unwrap()
        .unwrap();
    assert!(context.is_playing);
    assert_eq!(context.track().unwrap().name, "Song");
}

#[tokio::test]
async fn play_album_sends_context_uri_and_offset() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/me/player/play"))
        .and(query_param("device_id", "dev"))
        .and(body_json(json!({
            "context_uri": "spotify:album:5ht7ItJgpBH7W6vJ5BqpPr",
            "offset": { "position": 5 }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .player()
        .play_album("5ht7ItJgpBH7W6vJ5BqpPr", Some(PlayOffset::position(5)), Some("dev"))
        .await
        .unwrap();
    server.verify().await;
}

#[tokio::test]
async fn play_tracks_accepts_ids_and_uris() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/me/player/play"))
        .and(body_json(json!({
            "uris": ["spotify:track:a", "spotify:track:b"],
            "offset": { "uri": "spotify:track:b" }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .player()
        .play_tracks(&["a", "spotify:track:b"], Some(PlayOffset::uri("spotify:track:b")), None)
        .await
        .unwrap();
    server.verify().await;
}

#[tokio::test]
async fn playback_controls_use_their_verbs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/me/player/next"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/me/player/repeat"))
        .and(query_param("state", "context"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/me/player/volume"))
        .and(query_param("volume_percent", "40"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let player = client(&server).player();
    player.skip_next(None).await.unwrap();
    player.repeat(RepeatState::Context, None).await.unwrap();
    player.volume(40, None).await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn invalid_player_arguments_send_nothing() {
    let server = MockServer::start().await;
    let player = client(&server).player();

    let err = player.volume(101, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = player.add_to_queue("", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = player
        .get_recently_played_tracks(20, Some(1), Some(2))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn transfer_playback_sends_device_list() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/me/player"))
        .and(body_json(json!({ "device_ids": ["dev"], "play": true })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).player().transfer_playback("dev", true).await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn recently_played_is_a_cursor_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/recently-played"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "track": { "id": "a", "name": "A" }, "played_at": "2024-01-01T10:00:00Z" },
                { "track": { "id": "b", "name": "B" }, "played_at": "2024-01-01T09:55:00Z" }
            ],
            "cursors": { "after": "1704103200000", "before": "1704102900000" },
            "limit": 2
        })))
        .mount(&server)
        .await;

    let player = client(&server).player();
    let page = player.get_recently_played_tracks(2, None, None).await.unwrap();
    assert_eq!(page.items.len(), 2);

    let current = player.recently_played_request(2, None, None).unwrap();
    let previous = page.previous_request(&current).unwrap();
    assert_eq!(previous.query_value("before").as_deref(), Some("1704102900000"));
    assert_eq!(previous.query_value("after"), None);
}

#[tokio::test]
async fn id_batches_outside_bounds_issue_no_request() {
    let server = MockServer::start().await;
    let library = client(&server).library();

    for count in [0usize, 51] {
        let batch = ids(count);
        let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
        let err = library.check_saved_tracks(&refs).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status, None);
    }

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn id_batches_within_bounds_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/tracks/contains"))
        .respond_with(|req: &wiremock::Request| {
            let count = req
                .url
                .query_pairs()
                .find(|(k, _)| k == "ids")
                .map(|(_, v)| v.split(',').count())
                .unwrap_or(0);
            ResponseTemplate::new(200).set_body_json(vec![true; count])
        })
        .expect(3)
        .mount(&server)
        .await;

    let library = client(&server).library();
    for count in [1usize, 25, 50] {
        let batch = ids(count);
        let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
        let flags = library.check_saved_tracks(&refs).await.unwrap();
        assert_eq!(flags.len(), count);
    }
    server.verify().await;
}

#[tokio::test]
async fn save_tracks_puts_ids_in_the_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/me/tracks"))
        .and(body_json(json!({ "ids": ["a", "b"] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).library().save_tracks(&["a", "b"]).await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn remove_saved_albums_sends_ids_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/me/albums"))
        .and(query_param("ids", "a,b"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).library().remove_saved_albums(&["a", "b"]).await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn saved_tracks_page_derives_the_next_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/tracks"))
        .and(query_param("limit", "10"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "added_at": "2024-01-01T00:00:00Z", "track": { "id": "a", "name": "A" } }],
            "limit": 10,
            "offset": 0,
            "total": 25
        })))
        .mount(&server)
        .await;

    let library = client(&server).library();
    let page = library.get_saved_tracks(10, 0, None).await.unwrap();
    assert!(page.has_next());

    let current = library.saved_tracks_request(10, 0, None).unwrap();
    let next = page.next_request(&current).unwrap();
    assert_eq!(next.query_value("offset").as_deref(), Some("10"));
}

#[tokio::test]
async fn saved_albums_limit_is_validated() {
    let server = MockServer::start().await;
    let err = client(&server)
        .library()
        .get_saved_albums(0, 0, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn follow_artists_puts_type_and_ids() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/me/following"))
        .and(query_param("type", "artist"))
        .and(query_param("ids", "a,b"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).follow().follow_artists(&["a", "b"]).await.unwrap();
    server.verify().await;
    assert_eq!(FollowType::User.to_string(), "user");
}

#[tokio::test]
async fn follow_playlist_sends_public_flag() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/playlists/pl1/followers"))
        .and(body_json(json!({ "public": false })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).follow().follow_playlist("pl1", false).await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn playlist_follower_check_allows_five_users() {
    let server = MockServer::start().await;
    let batch = ids(6);
    let refs: Vec<&str> = batch.iter().map(String::as_str).collect();

    let err = client(&server)
        .follow()
        .check_users_follow_playlist("pl1", &refs)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn followed_artists_come_from_the_artists_property() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/following"))
        .and(query_param("type", "artist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artists": {
                "items": [{ "id": "ar1", "name": "Artist One", "genres": ["pop"] }],
                "cursors": { "after": "ar1" },
                "total": 2,
                "limit": 1
            }
        })))
        .mount(&server)
        .await;

    let page = client(&server)
        .follow()
        .get_followed_artists(1, None)
        .await
        .unwrap();
    assert_eq!(page.items[0].name, "Artist One");
    assert_eq!(page.page_cursor().after.as_deref(), Some("ar1"));
}

#[tokio::test]
async fn playlist_ids_are_percent_encoded_in_the_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/playlists/a%20b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "a b", "name": "P" })))
        .expect(1)
        .mount(&server)
        .await;

    let playlist = client(&server)
        .playlists()
        .get_playlist("a b", None)
        .await
        .unwrap();
    assert_eq!(playlist.name, "P");
    server.verify().await;
}

#[tokio::test]
async fn create_playlist_posts_the_request_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/users/me1/playlists"))
        .and(body_json(json!({
            "name": "Road Trip",
            "public": false,
            "collaborative": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "new",
            "name": "Road Trip",
            "snapshot_id": "s1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let playlist = client(&server)
        .playlists()
        .create_playlist(
            "me1",
            &CreatePlaylistRequest {
                name: "Road Trip".into(),
                description: None,
                public: false,
                collaborative: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(playlist.id, "new");
}

#[tokio::test]
async fn add_tracks_returns_the_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/playlists/pl1/tracks"))
        .and(body_json(json!({ "uris": ["spotify:track:a"], "position": 0 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "snapshot_id": "s2" })))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = client(&server)
        .playlists()
        .add_tracks("pl1", &["a"], Some(0))
        .await
        .unwrap();
    assert_eq!(snapshot.snapshot_id, "s2");
}

#[tokio::test]
async fn search_encodes_query_and_joins_types() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("q", "AC/DC"))
        .and(query_param("type", "track,artist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": { "items": [{ "id": "t", "name": "Thunderstruck" }], "limit": 5, "offset": 0, "total": 1 },
            "artists": { "items": [{ "id": "a", "name": "AC/DC" }], "limit": 5, "offset": 0, "total": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results = client(&server)
        .search()
        .search("AC/DC", &[SearchType::Track, SearchType::Artist], None, 5, 0)
        .await
        .unwrap();

    assert_eq!(results.tracks.unwrap().items[0].name, "Thunderstruck");
    assert_eq!(results.artists.unwrap().items[0].name, "AC/DC");
    assert!(results.albums.is_none());
}

#[tokio::test]
async fn search_requires_a_query_and_a_type() {
    let server = MockServer::start().await;
    let search = client(&server).search();

    let err = search.search(" ", &[SearchType::Track], None, 5, 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = search.search("x", &[], None, 5, 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert!(server.received_requests().await.unwrap().is_empty());
}
