//! Router-level tests over in-memory stores, covering the register, login,
//! protected call and logout lifecycle.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use gatehouse_api::{AppState, router};
use gatehouse_core::auth::jwt::TokenCodec;
use gatehouse_core::auth::password::BcryptHasher;
use gatehouse_core::auth::service::AuthService;
use gatehouse_core::config::AuthConfig;
use gatehouse_core::store::{MemoryTokenStore, MemoryUserStore};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "test-secret";

fn app_with(config: AuthConfig) -> Router {
    let users = MemoryUserStore::new();
    let auth = AuthService::new(
        &config,
        Arc::new(MemoryTokenStore::with_users(&users)),
        Arc::new(users),
        Arc::new(BcryptHasher::with_cost(4)),
    );
    router(AppState { auth })
}

fn app() -> Router {
    app_with(AuthConfig::new(SECRET))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_bearer(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn register_and_login(app: &Router) -> Value {
    let (status, _) = send(
        app,
        post_json("/v1/auth/register", json!({"email": "a@x.com", "password": "p"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, tokens) = send(
        app,
        post_json("/v1/auth/login", json!({"email": "a@x.com", "password": "p"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    tokens
}

#[tokio::test]
async fn register_login_me_logout_lifecycle() {
    let app = app();

    let (status, user) = send(
        &app,
        post_json("/v1/auth/register", json!({"email": "a@x.com", "password": "p"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "a@x.com");
    assert!(user.get("password_hash").is_none());

    let (status, tokens) = send(
        &app,
        post_json("/v1/auth/login", json!({"email": "a@x.com", "password": "p"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access = tokens["access_token"].as_str().unwrap().to_string();
    assert!(!access.is_empty());
    assert!(!tokens["refresh_token"].as_str().unwrap().is_empty());
    assert_eq!(tokens["expires_in"], 24 * 60 * 60);
    assert_eq!(tokens["token_type"], "Bearer");

    let (status, me) = send(&app, with_bearer("GET", "/v1/user/me", &access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "a@x.com");

    let (status, body) = send(&app, with_bearer("POST", "/v1/auth/logout", &access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // Still signed and unexpired, but its record is gone.
    let (status, body) = send(&app, with_bearer("GET", "/v1/user/me", &access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn expires_in_follows_configured_access_lifetime() {
    let app = app_with(AuthConfig::new(SECRET).with_access_ttl(chrono::Duration::minutes(15)));
    let tokens = register_and_login(&app).await;
    assert_eq!(tokens["expires_in"], 900);
}

#[tokio::test]
async fn refresh_requires_refresh_token() {
    let app = app();
    let tokens = register_and_login(&app).await;
    let access = tokens["access_token"].as_str().unwrap();
    let refresh = tokens["refresh_token"].as_str().unwrap();

    let (status, _) = send(&app, with_bearer("POST", "/v1/auth/refresh", access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, refreshed) = send(&app, with_bearer("POST", "/v1/auth/refresh", refresh)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["refresh_token"], refresh);
    assert_ne!(refreshed["access_token"], access);

    let new_access = refreshed["access_token"].as_str().unwrap();
    let (status, _) = send(&app, with_bearer("GET", "/v1/user/me", new_access)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn refresh_without_header_is_unauthorized() {
    let app = app();
    let req = Request::builder()
        .method("POST")
        .uri("/v1/auth/refresh")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_token_cannot_call_protected_routes() {
    let app = app();
    let tokens = register_and_login(&app).await;
    let refresh = tokens["refresh_token"].as_str().unwrap();

    let (status, _) = send(&app, with_bearer("GET", "/v1/user/me", refresh)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_reject_missing_or_malformed_headers() {
    let app = app();
    let tokens = register_and_login(&app).await;
    let access = tokens["access_token"].as_str().unwrap();

    let no_header = Request::builder()
        .uri("/v1/user/me")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, no_header).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let wrong_scheme = Request::builder()
        .uri("/v1/user/me")
        .header(header::AUTHORIZATION, format!("Token {access}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, wrong_scheme).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_other_secret_is_rejected() {
    let app = app();
    register_and_login(&app).await;

    let forged = TokenCodec::new(&AuthConfig::new("other-secret"))
        .issue_access(1, "a@x.com")
        .unwrap();
    let (status, _) = send(&app, with_bearer("GET", "/v1/user/me", &forged.token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_by_id() {
    let app = app();
    let tokens = register_and_login(&app).await;
    let access = tokens["access_token"].as_str().unwrap();

    let (status, user) = send(&app, with_bearer("GET", "/v1/user/1", access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["id"], 1);
    assert_eq!(user["email"], "a@x.com");

    let (status, _) = send(&app, with_bearer("GET", "/v1/user/42", access)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, with_bearer("GET", "/v1/user/abc", access)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn register_validation_and_conflicts() {
    let app = app();

    let (status, _) = send(
        &app,
        post_json("/v1/auth/register", json!({"email": "a@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let bad_json = Request::builder()
        .method("POST")
        .uri("/v1/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app, bad_json).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let first = json!({"email": "a@x.com", "password": "p", "username": "alice"});
    let (status, user) = send(&app, post_json("/v1/auth/register", first.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["username"], "alice");

    let (status, body) = send(&app, post_json("/v1/auth/register", first)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn login_rejects_bad_credentials_uniformly() {
    let app = app();
    register_and_login(&app).await;

    let (wrong_pw, wrong_pw_body) = send(
        &app,
        post_json("/v1/auth/login", json!({"email": "a@x.com", "password": "nope"})),
    )
    .await;
    let (no_user, no_user_body) = send(
        &app,
        post_json("/v1/auth/login", json!({"email": "b@x.com", "password": "p"})),
    )
    .await;

    assert_eq!(wrong_pw, StatusCode::UNAUTHORIZED);
    assert_eq!(no_user, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw_body, no_user_body);
}

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn unconfigured_secret_rejects_tokens_signed_with_empty_key() {
    let app = app_with(AuthConfig::new(""));
    let (status, _) = send(
        &app,
        post_json("/v1/auth/register", json!({"email": "a@x.com", "password": "p"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let now = chrono::Utc::now().timestamp();
    let forged = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &json!({
            "user_id": 1,
            "email": "a@x.com",
            "token_id": "abc",
            "type": "access",
            "iat": now,
            "nbf": now,
            "exp": now + 3600,
        }),
        &jsonwebtoken::EncodingKey::from_secret(b""),
    )
    .unwrap();

    let (status, _) = send(&app, with_bearer("POST", "/v1/auth/logout", &forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, with_bearer("GET", "/v1/user/me", &forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rotated_refresh_token_cannot_be_replayed() {
    let app = app_with(AuthConfig::new(SECRET).with_refresh_rotation(true));
    let tokens = register_and_login(&app).await;
    let refresh = tokens["refresh_token"].as_str().unwrap();

    let (status, rotated) = send(&app, with_bearer("POST", "/v1/auth/refresh", refresh)).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["refresh_token"], refresh);

    let (status, _) = send(&app, with_bearer("POST", "/v1/auth/refresh", refresh)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
