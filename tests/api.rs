use std::{io, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::ConnectInfo,
    http::{HeaderMap, Request, StatusCode, header},
};
use futures::future::BoxFuture;
use serde_json::{Value, json};
use time::OffsetDateTime;
use tower::ServiceExt;

use player_scores_back::{
    config::{AppConfig, Environment, RateLimitConfig},
    dao::{
        models::PlayerEntity,
        player_store::{MemoryPlayerStore, PlayerStore},
        storage::{StorageError, StorageResult},
    },
    routes,
    state::{
        AppState,
        player::{Score, Username},
    },
};

fn test_config() -> AppConfig {
    AppConfig {
        client_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("client"),
        ..AppConfig::default()
    }
}

fn app_with(config: AppConfig, store: Arc<dyn PlayerStore>) -> Router {
    routes::router(AppState::new(config, store))
}

fn app() -> Router {
    app_with(test_config(), Arc::new(MemoryPlayerStore::new()))
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply {
        status,
        headers,
        body,
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

struct FailingStore;

fn unavailable<T: Send + 'static>() -> BoxFuture<'static, StorageResult<T>> {
    Box::pin(async {
        Err(StorageError::backend(
            "postgres",
            io::Error::other("connection refused"),
        ))
    })
}

impl PlayerStore for FailingStore {
    fn upsert_player(
        &self,
        _username: Username,
        _score: Score,
        _now: OffsetDateTime,
    ) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        unavailable()
    }

    fn find_player(
        &self,
        _username: Username,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        unavailable()
    }

    fn list_top_players(&self, _limit: u32) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        unavailable()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        unavailable()
    }
}

#[tokio::test]
async fn add_then_read_back_through_every_route() {
    let app = app();

    let added = send(
        &app,
        post_json("/api/player/add", json!({ "username": " Alice ", "score": 42.5 })),
    )
    .await;
    assert_eq!(added.status, StatusCode::CREATED);
    assert_eq!(added.body["success"], true);
    assert_eq!(added.body["data"]["username"], "alice");
    assert_eq!(added.body["data"]["score"], 42.5);
    assert!(added.body["data"]["timestamp"].is_string());

    let score = send(&app, post_json("/api/player/get", json!({ "username": "ALICE" }))).await;
    assert_eq!(score.status, StatusCode::OK);
    assert_eq!(
        score.body,
        json!({ "success": true, "data": { "username": "alice", "score": 42.5 } })
    );

    let detail = send(&app, get("/api/player/Alice")).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["data"]["username"], "alice");
    assert_eq!(
        detail.body["data"]["createdAt"],
        detail.body["data"]["updatedAt"]
    );
    assert_eq!(detail.body["data"]["updatedAt"], added.body["data"]["timestamp"]);
}

#[tokio::test]
async fn invalid_payloads_are_bad_requests() {
    let app = app();

    let missing = send(&app, post_json("/api/player/add", json!({}))).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        missing.body,
        json!({ "success": false, "error": "Score is required; Username is required" })
    );

    let negative = send(
        &app,
        post_json("/api/player/add", json!({ "username": "ab", "score": -1 })),
    )
    .await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);
    assert_eq!(negative.body["error"], "Score must be non-negative");

    for score in [json!(1e130), json!("1e-140")] {
        let unstorable = send(
            &app,
            post_json("/api/player/add", json!({ "username": "ab", "score": score })),
        )
        .await;
        assert_eq!(unstorable.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            unstorable.body["error"],
            "Score must be 0 or between 1e-130 and 9.99e125"
        );
    }

    let charset = send(
        &app,
        post_json("/api/player/add", json!({ "username": "bob@home", "score": 1 })),
    )
    .await;
    assert_eq!(charset.status, StatusCode::BAD_REQUEST);

    let not_numeric = send(
        &app,
        post_json("/api/player/add", json!({ "username": "bob", "score": "lots" })),
    )
    .await;
    assert_eq!(not_numeric.status, StatusCode::BAD_REQUEST);
    assert_eq!(not_numeric.body["error"], "Score must be a number");

    let malformed = Request::post("/api/player/add")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let malformed = send(&app, malformed).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.body["success"], false);
    assert!(malformed.body["error"].is_string());

    let blank = send(&app, post_json("/api/player/get", json!({ "username": "  " }))).await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert_eq!(blank.body["error"], "Username is required");
}

#[tokio::test]
async fn unknown_players_are_not_found() {
    let app = app();

    let by_body = send(&app, post_json("/api/player/get", json!({ "username": "nobody" }))).await;
    assert_eq!(by_body.status, StatusCode::NOT_FOUND);
    assert_eq!(
        by_body.body,
        json!({ "success": false, "error": "Player not found" })
    );

    let by_path = send(&app, get("/api/player/nobody")).await;
    assert_eq!(by_path.status, StatusCode::NOT_FOUND);

    let unstorable = send(&app, get("/api/player/no%20such%20player")).await;
    assert_eq!(unstorable.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_path_username_is_a_bad_request() {
    let app = app();

    for uri in ["/api/player/%20", "/api/player/%20%20%20", "/player/%09"] {
        let reply = send(&app, get(uri)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            reply.body,
            json!({ "success": false, "error": "Username is required" }),
            "{uri}"
        );
    }
}

#[tokio::test]
async fn listing_orders_by_score_and_validates_limit() {
    let app = app();
    for (name, score) in [("a", 50), ("b", 10), ("c", 90), ("d", 30)] {
        let reply = send(
            &app,
            post_json("/api/player/add", json!({ "username": name, "score": score })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::CREATED);
    }

    let top = send(&app, get("/api/player?limit=3")).await;
    assert_eq!(top.status, StatusCode::OK);
    assert_eq!(top.body["count"], 3);
    let scores: Vec<f64> = top.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|player| player["score"].as_f64().unwrap())
        .collect();
    assert_eq!(scores, vec![90.0, 50.0, 30.0]);

    let all = send(&app, get("/api/player")).await;
    assert_eq!(all.body["count"], 4);

    for uri in ["/api/player?limit=0", "/api/player?limit=1001", "/api/player?limit=abc"] {
        let reply = send(&app, get(uri)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(reply.body["success"], false);
    }
}

#[tokio::test]
async fn legacy_prefix_serves_the_same_routes() {
    let app = app();

    let added = send(
        &app,
        post_json("/player/add", json!({ "username": "Legacy", "score": 7 })),
    )
    .await;
    assert_eq!(added.status, StatusCode::CREATED);

    let fetched = send(&app, get("/api/player/legacy")).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["data"]["score"], 7.0);

    let invalid = send(&app, post_json("/player/add", json!({ "username": "x" }))).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn static_segments_win_over_usernames() {
    let app = app();
    let reply = send(&app, get("/api/player/add")).await;
    assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn health_reports_storage_status() {
    let healthy = send(&app(), get("/health")).await;
    assert_eq!(healthy.status, StatusCode::OK);
    assert_eq!(healthy.body["success"], true);
    assert_eq!(healthy.body["environment"], "development");
    assert_eq!(healthy.body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(healthy.body["storage"], "ok");

    let degraded = send(&app_with(test_config(), Arc::new(FailingStore)), get("/health")).await;
    assert_eq!(degraded.status, StatusCode::OK);
    assert_eq!(degraded.body["storage"], "degraded");
}

#[tokio::test]
async fn storage_failures_hide_detail_only_in_production() {
    let request = || post_json("/api/player/add", json!({ "username": "alice", "score": 1 }));

    let development = send(&app_with(test_config(), Arc::new(FailingStore)), request()).await;
    assert_eq!(development.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(development.body["success"], false);
    let detail = development.body["error"].as_str().unwrap();
    assert!(detail.contains("connection refused"), "{detail}");

    let production_config = AppConfig {
        environment: Environment::Production,
        ..test_config()
    };
    let production = send(&app_with(production_config, Arc::new(FailingStore)), request()).await;
    assert_eq!(production.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        production.body,
        json!({ "success": false, "error": "Internal server error" })
    );
}

fn rate_limited_config(trust_proxy: bool) -> AppConfig {
    AppConfig {
        rate_limit: RateLimitConfig {
            max_requests: 2,
            window: Duration::from_secs(60),
        },
        trust_proxy,
        ..test_config()
    }
}

fn health_from(peer: [u8; 4], forwarded_for: &str) -> Request<Body> {
    let mut request = Request::get("/health")
        .header("x-forwarded-for", forwarded_for)
        .body(Body::empty())
        .unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((peer, 40_000))));
    request
}

#[tokio::test]
async fn rate_limit_rejects_requests_over_budget() {
    let app = app_with(rate_limited_config(false), Arc::new(MemoryPlayerStore::new()));

    let first = send(&app, health_from([198, 51, 100, 1], "203.0.113.1")).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.headers["ratelimit-limit"], "2");
    assert_eq!(first.headers["ratelimit-remaining"], "1");

    send(&app, health_from([198, 51, 100, 1], "203.0.113.1")).await;
    let limited = send(&app, health_from([198, 51, 100, 1], "203.0.113.1")).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers.contains_key(header::RETRY_AFTER));
    assert_eq!(limited.body["success"], false);
    assert_eq!(
        limited.body["error"],
        "Too many requests from this IP, please try again later."
    );
    assert!(limited.body["retryAfter"].as_u64().unwrap() >= 1);

    let other_peer = send(&app, health_from([198, 51, 100, 2], "203.0.113.1")).await;
    assert_eq!(other_peer.status, StatusCode::OK);
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_escape_the_limit() {
    let app = app_with(rate_limited_config(false), Arc::new(MemoryPlayerStore::new()));

    let mut statuses = Vec::new();
    for i in 0..10 {
        let reply = send(&app, health_from([198, 51, 100, 7], &format!("10.9.9.{i}"))).await;
        statuses.push(reply.status);
    }
    assert_eq!(statuses[..2], [StatusCode::OK, StatusCode::OK]);
    assert!(
        statuses[2..]
            .iter()
            .all(|status| *status == StatusCode::TOO_MANY_REQUESTS),
        "{statuses:?}"
    );

    // Without a socket peer every request shares the unknown-client window.
    let app = app_with(rate_limited_config(false), Arc::new(MemoryPlayerStore::new()));
    for i in 0..2 {
        let request = Request::get("/health")
            .header("x-forwarded-for", format!("10.9.9.{i}"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, request).await.status, StatusCode::OK);
    }
    let request = Request::get("/health")
        .header("x-forwarded-for", "10.9.9.2")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn trusted_proxy_keys_on_forwarded_for() {
    let app = app_with(rate_limited_config(true), Arc::new(MemoryPlayerStore::new()));
    let proxy = [10, 0, 0, 1];

    send(&app, health_from(proxy, "203.0.113.1")).await;
    send(&app, health_from(proxy, "203.0.113.1")).await;
    let limited = send(&app, health_from(proxy, "203.0.113.1")).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);

    let other_client = send(&app, health_from(proxy, "203.0.113.2")).await;
    assert_eq!(other_client.status, StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let reply = send(&app(), get("/health")).await;
    assert_eq!(reply.headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(reply.headers[header::X_FRAME_OPTIONS], "SAMEORIGIN");
    assert!(reply.headers.contains_key(header::CONTENT_SECURITY_POLICY));
}

#[tokio::test]
async fn static_client_is_served_at_the_root() {
    let app = app();

    let index = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(index.status(), StatusCode::OK);
    let content_type = index.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"), "{content_type}");

    let script = app.clone().oneshot(get("/js/add-player.js")).await.unwrap();
    assert_eq!(script.status(), StatusCode::OK);

    let missing = app.oneshot(get("/does-not-exist.html")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let reply = send(&app(), get("/api-doc/openapi.json")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body["paths"]["/api/player/add"].is_object());
}
