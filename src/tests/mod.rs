//! End-to-end tests for the request-authorization pipeline: the full
//! router with a counting in-memory store and a fixed-token verifier.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use axum::{Router, body::Body};
use bytes::Bytes;
use http::{Request, StatusCode, header};
use tower::ServiceExt;

use crate::{
    AppState,
    auth::{AuthError, TokenVerifier},
    authz::PatternCache,
    build_app,
    config::GatewayConfig,
    store::{KeyValueStore, MemoryStore, StoreResult},
};

const TEST_TOKEN: &str = "test-token";

/// Verifier accepting a single fixed token with a fixed grant list.
struct FixedVerifier {
    permissions: Vec<String>,
}

#[async_trait]
impl TokenVerifier for FixedVerifier {
    async fn verify(&self, token: &str) -> Result<Vec<String>, AuthError> {
        if token == TEST_TOKEN {
            Ok(self.permissions.clone())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

/// Store wrapper counting backend calls, for asserting that rejected
/// requests never reach the backend.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }
}

fn auth_enabled_config() -> GatewayConfig {
    GatewayConfig::from_str(
        r#"
[auth]
type = "jwt"
domain = "tenant.example.com"
"#,
    )
    .expect("test config should parse")
}

fn auth_disabled_config() -> GatewayConfig {
    GatewayConfig::from_str("").expect("test config should parse")
}

fn build_state(
    config: &GatewayConfig,
    store: Arc<CountingStore>,
    permissions: &[&str],
) -> AppState {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let verifier: Option<Arc<dyn TokenVerifier>> = config.auth.is_enabled().then(|| {
        Arc::new(FixedVerifier {
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }) as Arc<dyn TokenVerifier>
    });

    AppState {
        config: Arc::new(config.clone()),
        store,
        verifier,
        patterns: Arc::new(PatternCache::new()),
    }
}

/// Router with authentication enabled and the given grant list bound to
/// [`TEST_TOKEN`].
fn app_with_auth(store: Arc<CountingStore>, permissions: &[&str]) -> Router {
    let config = auth_enabled_config();
    let state = build_state(&config, store, permissions);
    build_app(&config, state)
}

fn app_without_auth(store: Arc<CountingStore>) -> Router {
    let config = auth_disabled_config();
    let state = build_state(&config, store, &[]);
    build_app(&config, state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Body,
) -> (StatusCode, Bytes) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body)
}

#[tokio::test]
async fn test_health_is_public_with_auth_enabled() {
    let app = app_with_auth(Arc::new(CountingStore::default()), &[]);

    let (status, body) = send(&app, "GET", "/health", None, Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_missing_header_is_401_and_backend_untouched() {
    let store = Arc::new(CountingStore::default());
    let app = app_with_auth(store.clone(), &["read:*"]);

    let (status, body) = send(&app, "GET", "/redis/foo", None, Body::empty()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.is_empty());
    assert_eq!(store.gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_non_bearer_scheme_is_401() {
    let store = Arc::new(CountingStore::default());
    let app = app_with_auth(store.clone(), &["read:*"]);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/redis/foo")
                .header(header::AUTHORIZATION, "Basic dXNlcjpwdw==")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(store.gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_token_is_401() {
    let store = Arc::new(CountingStore::default());
    let app = app_with_auth(store.clone(), &["read:*"]);

    let (status, _) = send(&app, "GET", "/redis/foo", Some("forged"), Body::empty()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(store.gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_read_star_allows_any_key() {
    let store = Arc::new(CountingStore::default());
    store.inner.set("kave:foo", b"value").await.unwrap();
    store.inner.set("kave:usersession:abc", b"other").await.unwrap();
    let app = app_with_auth(store.clone(), &["read:*"]);

    for (key, expected) in [("foo", b"value" as &[u8]), ("usersession:abc", b"other")] {
        let uri = format!("/redis/{}", key);
        let (status, body) = send(&app, "GET", &uri, Some(TEST_TOKEN), Body::empty()).await;
        assert_eq!(status, StatusCode::OK, "key {key}");
        assert_eq!(&body[..], expected);
    }
}

#[tokio::test]
async fn test_non_matching_grant_is_403_and_backend_untouched() {
    let store = Arc::new(CountingStore::default());
    store.inner.set("kave:foo", b"value").await.unwrap();
    let app = app_with_auth(store.clone(), &["read:nothing"]);

    let (status, body) = send(&app, "GET", "/redis/foo", Some(TEST_TOKEN), Body::empty()).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.is_empty());
    assert_eq!(store.gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_read_only_token_cannot_write() {
    let store = Arc::new(CountingStore::default());
    let app = app_with_auth(store.clone(), &["read:*"]);

    let (status, _) = send(
        &app,
        "POST",
        "/redis/foo",
        Some(TEST_TOKEN),
        Body::from("{}"),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(store.sets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_write_then_read_round_trips() {
    let store = Arc::new(CountingStore::default());
    let app = app_with_auth(store.clone(), &["read:kave:*", "write:kave:*"]);

    let (status, body) = send(
        &app,
        "POST",
        "/redis/foo",
        Some(TEST_TOKEN),
        Body::from("{}"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.is_empty());

    let (status, body) = send(&app, "GET", "/redis/foo", Some(TEST_TOKEN), Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"{}");
}

#[tokio::test]
async fn test_namespace_prefix_applied_to_backend_key() {
    let store = Arc::new(CountingStore::default());
    let app = app_with_auth(store.clone(), &["write:kave:*"]);

    let (status, _) = send(
        &app,
        "POST",
        "/redis/foo",
        Some(TEST_TOKEN),
        Body::from("value"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // The caller-supplied key lands in the store under the namespace prefix.
    assert_eq!(store.inner.get("kave:foo").await.unwrap(), b"value");
    assert!(store.inner.get("foo").await.is_err());
}

#[tokio::test]
async fn test_missing_key_is_404_with_empty_body() {
    let store = Arc::new(CountingStore::default());
    let app = app_with_auth(store.clone(), &["read:*"]);

    let (status, body) = send(
        &app,
        "GET",
        "/redis/notfound",
        Some(TEST_TOKEN),
        Body::empty(),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
    assert_eq!(store.gets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unsupported_method_is_denied_without_pattern_check() {
    let store = Arc::new(CountingStore::default());
    // Even a fully-permissive grant list cannot authorize a DELETE.
    let app = app_with_auth(store.clone(), &["read:*", "write:*", "*"]);

    let (status, _) = send(
        &app,
        "DELETE",
        "/redis/foo",
        Some(TEST_TOKEN),
        Body::empty(),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(store.gets.load(Ordering::SeqCst), 0);
    assert_eq!(store.sets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_body_read_failure_is_500_and_set_never_invoked() {
    let store = Arc::new(CountingStore::default());
    let app = app_with_auth(store.clone(), &["write:kave:*"]);

    // A body stream that fails mid-upload, as when the client disconnects.
    let body = Body::from_stream(futures::stream::once(async {
        Err::<Bytes, std::io::Error>(std::io::Error::other("client disconnected"))
    }));

    let (status, _) = send(&app, "POST", "/redis/foo", Some(TEST_TOKEN), body).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(store.sets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_auth_disabled_requires_no_token() {
    let store = Arc::new(CountingStore::default());
    let app = app_without_auth(store.clone());

    let (status, _) = send(&app, "POST", "/redis/foo", None, Body::from("v1")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "GET", "/redis/foo", None, Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"v1");
}

#[tokio::test]
async fn test_auth_disabled_ignores_token_header() {
    let store = Arc::new(CountingStore::default());
    let app = app_without_auth(store.clone());

    // With authentication off the pipeline never inspects the header, so
    // even a garbage credential changes nothing.
    let (status, _) = send(
        &app,
        "POST",
        "/redis/foo",
        Some("garbage"),
        Body::from("v1"),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_response_carries_request_id() {
    let app = app_with_auth(Arc::new(CountingStore::default()), &[]);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .header("X-Request-Id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("X-Request-Id").unwrap(),
        "req-42"
    );
}
