use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use tvscout::browse::{BrowseController, Completion, CountryPick, Phase, Selection};
use tvscout::catalog::Catalog;
use tvscout::config::{FetchConfig, RelayConfig};
use tvscout::fetcher::{FetchError, PLAYLIST_ACCEPT, PlaylistFetcher};
use tvscout::playlist::{AccessFilter, PlaylistScheme, parse_playlist};

const PLAYLIST: &str = r#"#EXTM3U
#EXTINF:-1 tvg-id="news1.us" tvg-logo="https://logos.example/news1.png" group-title="News",News One
https://streams.example/news1.m3u8
#EXTINF:-1 tvg-id="sport1.uk" group-title="Sports",Sport One
https://streams.example/sport1.m3u8
"#;

const RELAYED_PLAYLIST: &str = r#"#EXTM3U
#EXTINF:-1 tvg-id="relay.fr" group-title="Movies",Relayed Channel
https://streams.example/relayed.m3u8
"#;

fn fetcher(relays: Vec<RelayConfig>, timeout_secs: u64) -> PlaylistFetcher {
    let settings = FetchConfig {
        direct_timeout_secs: timeout_secs,
        relay_timeout_secs: timeout_secs,
        relays,
        ..FetchConfig::default()
    };
    PlaylistFetcher::with_settings(&settings, AccessFilter::default()).unwrap()
}

fn prefix_relay(server: &MockServer, name: &str) -> RelayConfig {
    RelayConfig::prefix(&format!("{}/{}?url=", server.uri(), name))
}

#[tokio::test]
async fn test_direct_fetch_parses_and_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/index.m3u"))
        .and(|req: &Request| {
            req.headers
                .get("accept")
                .and_then(|v| v.to_str().ok())
                == Some(PLAYLIST_ACCEPT)
        })
        .respond_with(ResponseTemplate::new(200).set_body_string(PLAYLIST))
        .mount(&server)
        .await;

    let fetcher = fetcher(Vec::new(), 5);
    let channels = fetcher
        .fetch(&format!("{}/index.m3u", server.uri()), None)
        .await
        .unwrap();

    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].name, "News One");
    assert_eq!(channels[0].id, "news1.us");
    assert_eq!(channels[0].category.as_deref(), Some("News"));
    assert_eq!(channels[1].name, "Sport One");
}

#[tokio::test]
async fn test_falls_back_to_prefix_relay_on_error_status() {
    let server = MockServer::start().await;
    let target = format!("{}/index.m3u", server.uri());

    Mock::given(method("GET"))
        .and(path("/index.m3u"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/relay1"))
        .and(query_param("url", target.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(RELAYED_PLAYLIST))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(vec![prefix_relay(&server, "relay1")], 5);
    let channels = fetcher.fetch(&target, None).await.unwrap();

    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].name, "Relayed Channel");
}

#[tokio::test]
async fn test_json_relay_unwraps_content() {
    let server = MockServer::start().await;
    let target = format!("{}/missing.m3u", server.uri());

    Mock::given(method("GET"))
        .and(path("/get"))
        .and(query_param("url", target.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "content": RELAYED_PLAYLIST,
        })))
        .mount(&server)
        .await;

    let fetcher = fetcher(vec![RelayConfig::json(&format!("{}/get", server.uri()))], 5);
    let channels = fetcher.fetch(&target, None).await.unwrap();

    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].id, "relay.fr");
}

#[tokio::test]
async fn test_json_relay_failure_moves_to_next_relay() {
    let server = MockServer::start().await;
    let target = format!("{}/missing.m3u", server.uri());

    Mock::given(method("GET"))
        .and(path("/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/relay2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PLAYLIST))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(
        vec![
            RelayConfig::json(&format!("{}/get", server.uri())),
            prefix_relay(&server, "relay2"),
        ],
        5,
    );
    let channels = fetcher.fetch(&target, None).await.unwrap();
    assert_eq!(channels.len(), 2);
}

#[tokio::test]
async fn test_empty_body_counts_as_failure() {
    let server = MockServer::start().await;
    let target = format!("{}/index.m3u", server.uri());

    Mock::given(method("GET"))
        .and(path("/index.m3u"))
        .respond_with(ResponseTemplate::new(200).set_body_string("   \n"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/relay1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RELAYED_PLAYLIST))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(vec![prefix_relay(&server, "relay1")], 5);
    let channels = fetcher.fetch(&target, None).await.unwrap();
    assert_eq!(channels[0].name, "Relayed Channel");
}

#[tokio::test]
async fn test_all_paths_failing_is_exhausted() {
    let server = MockServer::start().await;
    let target = format!("{}/index.m3u", server.uri());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = fetcher(
        vec![prefix_relay(&server, "relay1"), prefix_relay(&server, "relay2")],
        5,
    );

    match fetcher.fetch(&target, None).await {
        Err(FetchError::Exhausted { location, attempts }) => {
            assert_eq!(location, target);
            assert_eq!(attempts, 3);
        }
        other => panic!("expected Exhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_playlist_without_entries_is_empty() {
    let server = MockServer::start().await;
    let target = format!("{}/index.m3u", server.uri());

    Mock::given(method("GET"))
        .and(path("/index.m3u"))
        .respond_with(ResponseTemplate::new(200).set_body_string("#EXTM3U\n# nothing here\n"))
        .mount(&server)
        .await;

    let fetcher = fetcher(Vec::new(), 5);
    let result = fetcher.fetch(&target, None).await;
    assert!(matches!(result, Err(FetchError::EmptyPlaylist { .. })));
}

#[tokio::test]
async fn test_every_channel_rejected_is_no_accessible_channels() {
    let server = MockServer::start().await;
    let target = format!("{}/index.m3u", server.uri());

    let body = r#"#EXTM3U
#EXTINF:-1,Plain HTTP
http://a.example/live.m3u8
#EXTINF:-1,Bare IP
https://10.0.0.1/live.m3u8
#EXTINF:-1,Tokenised
https://b.example/live.m3u8?token=abc
"#;

    Mock::given(method("GET"))
        .and(path("/index.m3u"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let fetcher = fetcher(Vec::new(), 5);
    match fetcher.fetch(&target, None).await {
        Err(FetchError::NoAccessibleChannels { parsed, .. }) => assert_eq!(parsed, 3),
        other => panic!("expected NoAccessibleChannels, got {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_paths_time_out_until_one_answers() {
    let server = MockServer::start().await;
    let target = format!("{}/index.m3u", server.uri());
    let slow = Duration::from_secs(3);

    Mock::given(method("GET"))
        .and(path("/index.m3u"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PLAYLIST)
                .set_delay(slow),
        )
        .mount(&server)
        .await;

    for name in ["/relay1", "/relay2"] {
        Mock::given(method("GET"))
            .and(path(name))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(PLAYLIST)
                    .set_delay(slow),
            )
            .mount(&server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/relay3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RELAYED_PLAYLIST))
        .mount(&server)
        .await;

    let fetcher = fetcher(
        vec![
            prefix_relay(&server, "relay1"),
            prefix_relay(&server, "relay2"),
            prefix_relay(&server, "relay3"),
        ],
        1,
    );

    let channels = fetcher.fetch(&target, None).await.unwrap();
    assert_eq!(channels, parse_playlist(RELAYED_PLAYLIST));
}

#[tokio::test]
async fn test_superseded_load_is_discarded() {
    let server = MockServer::start().await;
    let catalog = Catalog::embedded().unwrap();

    Mock::given(method("GET"))
        .and(path("/countries/france.m3u"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RELAYED_PLAYLIST))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/countries/germany.m3u"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PLAYLIST))
        .mount(&server)
        .await;

    let mut france = catalog
        .countries
        .iter()
        .find(|c| c.name == "France")
        .cloned()
        .unwrap();
    let mut germany = catalog
        .countries
        .iter()
        .find(|c| c.name == "Germany")
        .cloned()
        .unwrap();
    // Derive locations from the mock server instead of the catalog URLs
    france.playlist_url.clear();
    germany.playlist_url.clear();

    let mut controller = BrowseController::new(PlaylistScheme::new(&server.uri()), 50);
    let fetcher = fetcher(Vec::new(), 5);

    let first = controller
        .select(Selection::Country(Some(CountryPick::country(france))))
        .unwrap();
    let second = controller
        .select(Selection::Country(Some(CountryPick::country(germany))))
        .unwrap();

    let first_result = fetcher.fetch(&first.location, Some(&first.context)).await;
    let second_result = fetcher.fetch(&second.location, Some(&second.context)).await;

    assert_eq!(controller.complete(second.generation, second_result), Completion::Applied);
    assert_eq!(controller.complete(first.generation, first_result), Completion::Stale);

    assert_eq!(controller.phase(), Phase::Loaded);
    let names: Vec<&str> = controller.displayed().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["News One", "Sport One"]);
}
