#![allow(clippy::unwrap_used)]
// Integration tests for `RelationshipClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use melodex_api::{Error, RelationshipClient, RelationshipKind};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RelationshipClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/api", server.uri())).unwrap();
    let client = RelationshipClient::with_client(reqwest::Client::new(), base_url).unwrap();
    (server, client)
}

fn token() -> SecretString {
    SecretString::from("test-token".to_string())
}

// ── Status checks ───────────────────────────────────────────────────

#[tokio::test]
async fn test_check_favorite_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/favorites/42/status"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let status = client
        .check(RelationshipKind::Favorite, "42", &token())
        .await
        .unwrap();
    assert!(status);
}

#[tokio::test]
async fn test_check_encodes_string_ids() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/follows/artist%20one/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": false
        })))
        .mount(&server)
        .await;

    let status = client
        .check(RelationshipKind::Follow, "artist one", &token())
        .await
        .unwrap();
    assert!(!status);
}

#[tokio::test]
async fn test_check_missing_data_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/likes/9/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let result = client.check(RelationshipKind::Like, "9", &token()).await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_check_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.check(RelationshipKind::Favorite, "7", &token()).await;
    assert!(
        matches!(result, Err(Error::AuthRequired { .. })),
        "expected AuthRequired error, got: {result:?}"
    );
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_add_like_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/likes/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "liked"
        })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .add(RelationshipKind::Like, "9", &token())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_remove_with_no_content() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/follows/3"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client
        .remove(RelationshipKind::Follow, "3", &token())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_add_conflict_is_already_in_desired_state() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/favorites/42"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let err = client
        .add(RelationshipKind::Favorite, "42", &token())
        .await
        .unwrap_err();
    assert!(err.is_idempotent(), "got: {err:?}");
}

#[tokio::test]
async fn test_structured_code_wins_over_message() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/likes/9"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "message": "Something happened",
            "code": "NOT_EXISTS"
        })))
        .mount(&server)
        .await;

    let result = client.remove(RelationshipKind::Like, "9", &token()).await;
    assert!(
        matches!(result, Err(Error::NotInDesiredState { .. })),
        "expected NotInDesiredState, got: {result:?}"
    );
}

#[tokio::test]
async fn test_legacy_already_liked_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/likes/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Album already liked"
        })))
        .mount(&server)
        .await;

    let result = client.add(RelationshipKind::Like, "9", &token()).await;
    match result {
        Err(Error::AlreadyInDesiredState { ref message }) => {
            assert!(message.contains("already liked"), "got: {message}");
        }
        other => panic!("expected AlreadyInDesiredState, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_legacy_localized_not_followed_message() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/follows/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "未关注该歌手"
        })))
        .mount(&server)
        .await;

    let result = client.remove(RelationshipKind::Follow, "3", &token()).await;
    assert!(
        matches!(result, Err(Error::NotInDesiredState { .. })),
        "expected NotInDesiredState, got: {result:?}"
    );
}

#[tokio::test]
async fn test_unclassified_failure_is_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/favorites/7"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "message": "database unavailable"
        })))
        .mount(&server)
        .await;

    let err = client
        .add(RelationshipKind::Favorite, "7", &token())
        .await
        .unwrap_err();

    match err {
        Error::Api {
            status,
            ref message,
            ..
        } => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        ref other => panic!("expected Api error, got: {other:?}"),
    }
    assert!(err.is_transient());
    assert!(!err.is_idempotent());
}

#[tokio::test]
async fn test_non_json_error_body() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let result = client.remove(RelationshipKind::Favorite, "7", &token()).await;
    match result {
        Err(Error::Api { status: 502, ref message, code: None }) => {
            assert_eq!(message, "Bad Gateway");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_each_call_issues_exactly_one_request() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/favorites/1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.add(RelationshipKind::Favorite, "1", &token()).await;
    assert!(result.is_err());
    // `expect(1)` is verified when the server drops.
}
