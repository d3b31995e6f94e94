use genrify_application::disambiguation::{Disambiguator, FailOnAmbiguity, PromptResolver};
use genrify_application::providers::{
    DiscogsProvider, LastFmProvider, MusicBrainzProvider, TagProvider, WhatCdProvider,
};
use genrify_application::ProviderError;
use genrify_domain::ReleaseQuery;
use genrify_metadata::discogs::DiscogsClient;
use genrify_metadata::lastfm::LastFmClient;
use genrify_metadata::musicbrainz::MusicBrainzClient;
use genrify_metadata::whatcd::WhatCdClient;
use genrify_tags::{GenreLists, ScoringSettings, TagStore};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PORTISHEAD_MBID: &str = "8f6bd1e4-fbe1-4f50-aa9b-94c450ec0f11";
const CAFE_DEL_MAR_MBID: &str = "0b7e1b5b-3e2a-3c4b-9a52-1f2d35b1c0aa";

fn store() -> TagStore {
    TagStore::new(GenreLists::default(), ScoringSettings::default())
}

fn unattended() -> Disambiguator {
    Disambiguator::new(Arc::new(FailOnAmbiguity))
}

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("tag present");
    assert!((actual - expected).abs() < 1e-9, "{} != {}", actual, expected);
}

async fn mount_whatcd_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login.php"))
        .and(body_string_contains("username=alice"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/index.php"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_whatcd_artist_and_album_tags() {
    let server = MockServer::start().await;
    mount_whatcd_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .and(query_param("action", "artist"))
        .and(query_param("artistname", "portishead"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "response": {"tags": [
                {"name": "trip.hop", "count": 50},
                {"name": "staff.picks", "count": 90},
                {"name": "electronic", "count": 20}
            ]}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .and(query_param("action", "browse"))
        .and(query_param("searchstr", "portishead dummy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "response": {"results": [
                {
                    "groupId": 72, "groupName": "Dummy", "artist": "Portishead",
                    "groupYear": 1994, "releaseType": 1,
                    "tags": ["trip.hop", "downtempo", "vanity.house"]
                },
                {
                    "groupId": 99, "groupName": "Dummy (Remastered)", "artist": "Portishead",
                    "groupYear": 2008, "releaseType": 7,
                    "tags": ["rock"]
                }
            ]}
        })))
        .mount(&server)
        .await;

    let client = WhatCdClient::builder("alice", "secret")
        .base_url(server.uri())
        .rate_limit_interval(Duration::ZERO)
        .build()
        .unwrap();
    let provider = WhatCdProvider::new(client, unattended());
    let mut store = store();

    let report = provider
        .fetch_tags(&ReleaseQuery::new("Portishead", "Dummy").year(1994), &mut store)
        .await
        .unwrap();

    assert_eq!(report.release_type.as_deref(), Some("Album"));
    // artist 1.5, album 0.85 * 1.5, merged with bonus
    assert_close(store.score("Trip-Hop"), (1.5 + 1.275) * 1.05);
    assert_close(store.score("Downtempo"), 1.275);
    assert_close(store.score("Electronic"), 0.6);
    assert_eq!(store.score("Staff Picks"), None);
    assert_eq!(store.select(4), vec!["Trip-Hop", "Downtempo"]);
}

#[tokio::test]
async fn test_whatcd_ambiguous_album_still_uses_artist_tags() {
    let server = MockServer::start().await;
    mount_whatcd_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .and(query_param("action", "artist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "response": {"tags": [{"name": "jazz", "count": 10}]}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .and(query_param("action", "browse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "response": {"results": [
                {"groupId": 1, "groupName": "Live", "groupYear": 1961, "tags": ["jazz"]},
                {"groupId": 2, "groupName": "Live", "groupYear": 1964, "tags": ["jazz"]}
            ]}
        })))
        .mount(&server)
        .await;

    let client = WhatCdClient::builder("alice", "secret")
        .base_url(server.uri())
        .rate_limit_interval(Duration::ZERO)
        .build()
        .unwrap();
    let provider = WhatCdProvider::new(client, unattended());
    let mut store = store();

    let report = provider
        .fetch_tags(&ReleaseQuery::new("Bill Evans", "Live"), &mut store)
        .await
        .unwrap();

    assert_eq!(report.release_type, None);
    assert_close(store.score("Jazz"), 1.5);
}

#[tokio::test]
async fn test_lastfm_filters_noise_and_tolerates_album_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("method", "artist.gettoptags"))
        .and(query_param("artist", "portishead"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "toptags": {"tag": [
                {"name": "trip-hop", "count": 100},
                {"name": "Portishead", "count": 90},
                {"name": "seen live", "count": 40},
                {"name": "electronic", "count": "2"}
            ]}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("method", "album.gettoptags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": 6,
            "message": "Album not found"
        })))
        .mount(&server)
        .await;

    let client = LastFmClient::new("key".to_string(), Some(format!("{}/2.0/", server.uri())));
    let provider = LastFmProvider::new(client);
    let mut store = store();

    provider
        .fetch_tags(&ReleaseQuery::new("Portishead", "Dummy"), &mut store)
        .await
        .unwrap();

    assert_eq!(store.len(), 1);
    assert_close(store.score("Trip-Hop"), 0.7);
}

#[tokio::test]
async fn test_lastfm_various_artists_queries_album_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("method", "artist.gettoptags"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("method", "album.gettoptags"))
        .and(query_param("artist", "various artists"))
        .and(query_param("album", "cafe del mar 5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "toptags": {"tag": {"name": "chillout", "count": 12}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = LastFmClient::new("key".to_string(), Some(format!("{}/2.0/", server.uri())));
    let provider = LastFmProvider::new(client);
    let mut store = store();

    provider
        .fetch_tags(
            &ReleaseQuery::new("", "Café del Mar Vol. 5").various_artists(),
            &mut store,
        )
        .await
        .unwrap();

    assert_close(store.score("Chillout"), 0.7);
}

#[tokio::test]
async fn test_lastfm_all_lookups_failing_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down for maintenance"))
        .mount(&server)
        .await;

    let client = LastFmClient::new("key".to_string(), Some(format!("{}/2.0/", server.uri())));
    let provider = LastFmProvider::new(client);
    let mut store = store();

    let result = provider
        .fetch_tags(&ReleaseQuery::new("Portishead", "Dummy"), &mut store)
        .await;

    assert!(matches!(result, Err(ProviderError::Transport(_))));
    assert!(store.is_empty());
}

fn musicbrainz(server: &MockServer) -> MusicBrainzProvider {
    let client = MusicBrainzClient::builder()
        .base_url(server.uri())
        .rate_limit_interval(Duration::ZERO)
        .build()
        .unwrap();
    MusicBrainzProvider::new(client)
}

#[tokio::test]
async fn test_musicbrainz_top_match_tags() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/artist"))
        .and(query_param("query", "artist:\"portishead\""))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artists": [{"id": PORTISHEAD_MBID, "name": "Portishead", "score": 100}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/artist/{}", PORTISHEAD_MBID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": PORTISHEAD_MBID,
            "tags": [{"name": "trip hop", "count": 10}, {"name": "british", "count": 5}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/release-group"))
        .and(query_param("query", "artist:\"portishead\" AND releasegroup:\"dummy\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "release-groups": []
        })))
        .mount(&server)
        .await;

    let mut store = store();
    musicbrainz(&server)
        .fetch_tags(&ReleaseQuery::new("Portishead", "Dummy"), &mut store)
        .await
        .unwrap();

    assert_close(store.score("Trip-Hop"), 0.8);
    assert_close(store.score("British"), 0.4);
}

#[tokio::test]
async fn test_musicbrainz_various_artists_release_group() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/artist"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/release-group"))
        .and(query_param("query", "releasegroup:\"cafe del mar\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "release-groups": [{"id": CAFE_DEL_MAR_MBID, "title": "Café del Mar", "score": 100}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/release-group/{}", CAFE_DEL_MAR_MBID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": CAFE_DEL_MAR_MBID,
            "tags": [{"name": "chillout", "count": 4}]
        })))
        .mount(&server)
        .await;

    let mut store = store();
    musicbrainz(&server)
        .fetch_tags(
            &ReleaseQuery::new("", "Café del Mar").various_artists(),
            &mut store,
        )
        .await
        .unwrap();

    assert_close(store.score("Chillout"), 0.8);
}

#[tokio::test]
async fn test_musicbrainz_no_match_is_no_tags() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/release-group"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "release-groups": []
        })))
        .mount(&server)
        .await;

    let result = musicbrainz(&server)
        .fetch_tags(
            &ReleaseQuery::new("", "Unheard Of").various_artists(),
            &mut store(),
        )
        .await;

    assert_eq!(result, Err(ProviderError::NoTags("album")));
}

async fn mount_nevermind_masters(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/database/search"))
        .and(query_param("type", "master"))
        .and(query_param("release_title", "nevermind"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {
                    "id": 13814, "title": "Nirvana - Nevermind", "year": "1991",
                    "genre": ["Rock"], "style": ["Grunge"]
                },
                {
                    "id": 99999, "title": "Nirvana - Nevermind", "year": 2011,
                    "genre": ["Rock"], "style": ["Alternative Rock"]
                },
                {
                    "id": 55555, "title": "Various - Nevermind Tribute", "year": 2004,
                    "genre": ["Pop"], "style": []
                }
            ]
        })))
        .mount(server)
        .await;
}

fn discogs_client(server: &MockServer) -> DiscogsClient {
    DiscogsClient::with_rate_limit(None, Some(server.uri()), Duration::ZERO)
}

#[tokio::test]
async fn test_discogs_ambiguous_without_operator() {
    let server = MockServer::start().await;
    mount_nevermind_masters(&server).await;

    let provider = DiscogsProvider::new(discogs_client(&server), unattended());
    let result = provider
        .fetch_tags(&ReleaseQuery::new("Nirvana", "Nevermind"), &mut store())
        .await;

    assert_eq!(result, Err(ProviderError::TooManyResults(2)));
}

#[tokio::test]
async fn test_discogs_year_narrows_to_one() {
    let server = MockServer::start().await;
    mount_nevermind_masters(&server).await;

    let provider = DiscogsProvider::new(discogs_client(&server), unattended());
    let mut store = store();
    provider
        .fetch_tags(&ReleaseQuery::new("Nirvana", "Nevermind").year(1992), &mut store)
        .await
        .unwrap();

    assert_close(store.score("Grunge"), 0.85);
    assert_close(store.score("Rock"), 0.85);
    assert_eq!(store.score("Alternative Rock"), None);
}

#[tokio::test]
async fn test_discogs_operator_picks_candidate() {
    let server = MockServer::start().await;
    mount_nevermind_masters(&server).await;

    let resolver = PromptResolver::new(Cursor::new(b"2\n".to_vec()), Vec::new());
    let provider = DiscogsProvider::new(
        discogs_client(&server),
        Disambiguator::new(Arc::new(resolver)),
    );
    let mut store = store();
    provider
        .fetch_tags(&ReleaseQuery::new("Nirvana", "Nevermind"), &mut store)
        .await
        .unwrap();

    assert!(store.score("Alternative Rock").is_some());
    assert_eq!(store.score("Grunge"), None);
}
