//! Authentication integration tests.
//!
//! Tests verify:
//! - Registration stores a hash, never the plaintext
//! - Login failures do not reveal whether the account exists
//! - Session tokens verify, expire and carry the admin flag
//! - The admin gate answers 401 for bad tokens and 403 for non-admins

use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;

use quizmaker::{verify_password, SessionTokenAuth, SESSION_TTL};

use super::test_utils::{
    create_quiz, send_json, send_raw, test_router, token_for, MockStore, TEST_SECRET,
};

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

// =============================================================================
// Register
// =============================================================================

#[tokio::test]
async fn test_register_stores_hashed_password() {
    let store = MockStore::new();
    let router = test_router(store.clone());

    let (status, body) = send_json(
        &router,
        Method::POST,
        "/api/register",
        Some(json!({"username": "alice", "password": "hunter2"})),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"success": true}));

    let account = store.account("alice").unwrap();
    assert_ne!(account.password_hash, "hunter2");
    assert!(!account.is_admin);
    assert!(verify_password("hunter2", &account.password_hash).await);
    assert!(!verify_password("hunter3", &account.password_hash).await);
}

#[tokio::test]
async fn test_register_requires_both_fields() {
    let router = test_router(MockStore::new());

    for body in [
        json!({"username": "alice"}),
        json!({"password": "pw"}),
        json!({"username": "", "password": "pw"}),
        json!({}),
    ] {
        let (status, response) =
            send_json(&router, Method::POST, "/api/register", Some(body), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], "username & password required");
    }
}

#[tokio::test]
async fn test_register_duplicate_is_store_error() {
    let router = test_router(MockStore::new());
    let body = json!({"username": "alice", "password": "pw"});

    let (status, _) =
        send_json(&router, Method::POST, "/api/register", Some(body.clone()), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, response) =
        send_json(&router, Method::POST, "/api/register", Some(body), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response["error"]
        .as_str()
        .unwrap()
        .contains("duplicate key value"));
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_returns_verifiable_token() {
    let store = MockStore::new();
    store.add_account("alice", "pw", false).await;
    let router = test_router(store);

    let (status, body) = send_json(
        &router,
        Method::POST,
        "/api/login",
        Some(json!({"username": "alice", "password": "pw"})),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["admin"], false);

    let token = body["token"].as_str().unwrap();
    let claims = SessionTokenAuth::new(TEST_SECRET).verify(token).unwrap();
    assert_eq!(claims.username, "alice");
    assert!(!claims.admin);
    assert_eq!(claims.exp - claims.iat, SESSION_TTL.as_secs());
}

#[tokio::test]
async fn test_login_reports_admin_flag() {
    let store = MockStore::new();
    store.add_account("root", "pw", true).await;
    let router = test_router(store);

    let (status, body) = send_json(
        &router,
        Method::POST,
        "/api/login",
        Some(json!({"username": "root", "password": "pw"})),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admin"], true);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let store = MockStore::new();
    store.add_account("alice", "pw", false).await;
    let router = test_router(store);

    let wrong_password = send_json(
        &router,
        Method::POST,
        "/api/login",
        Some(json!({"username": "alice", "password": "nope"})),
        None,
    )
    .await;
    let unknown_user = send_json(
        &router,
        Method::POST,
        "/api/login",
        Some(json!({"username": "mallory", "password": "nope"})),
        None,
    )
    .await;

    assert_eq!(wrong_password.0, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_password, unknown_user);
    assert_eq!(wrong_password.1["error"], "invalid credentials");
}

#[tokio::test]
async fn test_login_with_bcrypt_account() {
    let store = MockStore::new();
    store.add_bcrypt_account("dave", "legacy-pw");
    let router = test_router(store);

    let (status, body) = send_json(
        &router,
        Method::POST,
        "/api/login",
        Some(json!({"username": "dave", "password": "legacy-pw"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send_json(
        &router,
        Method::POST,
        "/api/login",
        Some(json!({"username": "dave", "password": "wrong"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid credentials");
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let router = test_router(MockStore::new());
    let (status, body) = send_json(
        &router,
        Method::POST,
        "/api/login",
        Some(json!({"username": "alice"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "username & password required");
}

#[tokio::test]
async fn test_register_then_login() {
    let router = test_router(MockStore::new());
    let credentials = json!({"username": "carol", "password": "s3cret"});

    let (status, _) = send_json(
        &router,
        Method::POST,
        "/api/register",
        Some(credentials.clone()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        send_json(&router, Method::POST, "/api/login", Some(credentials), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().unwrap().contains('.'));
}

// =============================================================================
// Admin Gate
// =============================================================================

#[tokio::test]
async fn test_admin_route_without_header() {
    let router = test_router(MockStore::new());
    let (status, body) = send_json(&router, Method::GET, "/supa/slug/1", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No authorization header");
}

#[tokio::test]
async fn test_admin_route_with_malformed_header() {
    let router = test_router(MockStore::new());
    let request = Request::builder()
        .uri("/supa/slug/1")
        .header(header::AUTHORIZATION, "Bearer")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send_raw(&router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Invalid auth header"));
}

#[tokio::test]
async fn test_admin_route_with_garbage_token() {
    let router = test_router(MockStore::new());
    let (status, body) =
        send_json(&router, Method::GET, "/supa/slug/1", None, Some("not-a-token")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_admin_route_with_foreign_secret() {
    let router = test_router(MockStore::new());
    let token = SessionTokenAuth::new("some-other-secret").issue("root", true);

    let (status, body) = send_json(&router, Method::GET, "/supa/slug/1", None, Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_admin_route_with_expired_token() {
    let router = test_router(MockStore::new());
    let issued = now_secs() - SESSION_TTL.as_secs() - 10;
    let token = SessionTokenAuth::new(TEST_SECRET).issue_at("root", true, issued);

    let (status, body) = send_json(&router, Method::GET, "/supa/slug/1", None, Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_admin_route_rejects_non_admin() {
    let router = test_router(MockStore::new());
    let token = token_for("alice", false);

    let (status, body) = send_json(&router, Method::GET, "/supa/slug/1", None, Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");

    let (status, _) = send_json(
        &router,
        Method::PUT,
        "/supa/slug/1",
        Some(json!({"slug": "stolen"})),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_route_accepts_admin_from_login() {
    let store = MockStore::new();
    store.add_account("root", "pw", true).await;
    let router = test_router(store);

    let quiz = create_quiz(&router, "Capitals").await;
    let (_, login) = send_json(
        &router,
        Method::POST,
        "/api/login",
        Some(json!({"username": "root", "password": "pw"})),
        None,
    )
    .await;
    let token = login["token"].as_str().unwrap();

    let uri = format!("/supa/slug/{}", quiz["id"]);
    let (status, body) = send_json(&router, Method::GET, &uri, None, Some(token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["quiz"]["slug"], quiz["slug"]);
}

#[tokio::test]
async fn test_public_routes_ignore_bad_tokens() {
    let router = test_router(MockStore::new());
    let (status, _) = send_json(&router, Method::GET, "/api/ping", None, Some("garbage")).await;
    assert_eq!(status, StatusCode::OK);
}
