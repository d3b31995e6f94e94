use genrify_metadata::musicbrainz::{MusicBrainzClient, MusicBrainzError, SearchQuery};
use genrify_metadata::TagCount;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RADIOHEAD_MBID: &str = "a74b1b7f-71a5-4011-9441-d0b5e4122711";
const OK_COMPUTER_MBID: &str = "b1392450-e666-3926-a536-22c65f834433";

fn client(server: &MockServer) -> MusicBrainzClient {
    MusicBrainzClient::builder()
        .base_url(server.uri())
        .rate_limit_interval(Duration::ZERO)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_search_and_artist_tags() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/artist"))
        .and(query_param("query", "artist:\"radiohead\""))
        .and(query_param("limit", "1"))
        .and(query_param("fmt", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "created": "2026-01-08T12:00:00.000Z",
            "count": 1,
            "offset": 0,
            "artists": [{"id": RADIOHEAD_MBID, "name": "Radiohead", "score": 100}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/artist/{}", RADIOHEAD_MBID)))
        .and(query_param("inc", "tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": RADIOHEAD_MBID,
            "name": "Radiohead",
            "tags": [
                {"name": "alternative rock", "count": 15},
                {"name": "art rock", "count": 9}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let hits = client
        .search_artists(SearchQuery::artist("radiohead").limit(1))
        .await
        .unwrap();
    assert_eq!(hits[0].id, Uuid::parse_str(RADIOHEAD_MBID).unwrap());

    let tags = client.artist_tags(hits[0].id).await.unwrap();
    assert_eq!(
        tags,
        vec![TagCount::new("alternative rock", 15), TagCount::new("art rock", 9)]
    );

    // served from cache, the lookup mock expects a single call
    client.artist_tags(hits[0].id).await.unwrap();
}

#[tokio::test]
async fn test_release_group_tags() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/release-group"))
        .and(query_param(
            "query",
            "artist:\"radiohead\" AND releasegroup:\"ok computer\"",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "release-groups": [{"id": OK_COMPUTER_MBID, "title": "OK Computer", "score": 100}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/release-group/{}", OK_COMPUTER_MBID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": OK_COMPUTER_MBID,
            "title": "OK Computer",
            "tags": [{"name": "alternative rock", "count": 20}]
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let hits = client
        .search_release_groups(SearchQuery::release_group(Some("radiohead"), "ok computer").limit(1))
        .await
        .unwrap();
    assert_eq!(hits[0].title.as_deref(), Some("OK Computer"));

    let tags = client.release_group_tags(hits[0].id).await.unwrap();
    assert_eq!(tags, vec![TagCount::new("alternative rock", 20)]);
}

#[tokio::test]
async fn test_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = client(&server)
        .release_group_tags(Uuid::parse_str(OK_COMPUTER_MBID).unwrap())
        .await;
    assert!(matches!(result, Err(MusicBrainzError::NotFound(_))));
}

#[tokio::test]
async fn test_service_unavailable_is_rate_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = client(&server)
        .search_artists(SearchQuery::artist("anyone"))
        .await;
    assert!(matches!(result, Err(MusicBrainzError::RateLimitExceeded)));
}

#[tokio::test]
async fn test_malformed_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client(&server)
        .search_artists(SearchQuery::artist("anyone"))
        .await;
    assert!(matches!(result, Err(MusicBrainzError::InvalidResponse(_))));
}
