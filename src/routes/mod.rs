//! HTTP surface: route tables, the layer stack and the static client fallback.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
};
use tracing::warn;

use crate::{
    config::AppConfig,
    middleware::{error_detail::render_error_detail, rate_limit::enforce_rate_limit},
    state::SharedState,
};

/// Swagger UI and OpenAPI document.
pub mod docs;
/// Extractors rejecting with the JSON error envelope.
pub mod extract;
/// `GET /health`.
pub mod health;
/// Player routes, mounted under `/api/player` and `/player`.
pub mod player;

/// Largest request body accepted.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

const CONTENT_SECURITY_POLICY: &str =
    "default-src 'self'; style-src 'self' 'unsafe-inline'; script-src 'self'; img-src 'self' data:";

/// Compose all route trees, wiring in shared state, documentation routes,
/// the static client and the cross-cutting layers.
pub fn router(state: SharedState) -> Router<()> {
    let config = state.config();

    let api_router = health::router()
        .nest("/api/player", player::router())
        .nest("/player", player::router());

    let docs_router = docs::router(state.clone());
    let client = ServeDir::new(&config.client_dir);

    api_router
        .merge(docs_router)
        .fallback_service(client)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            render_error_detail,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_rate_limit,
        ))
        .layer(security_header(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(security_header(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(security_header(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors_layer(config))
        .with_state(state)
}

fn security_header(name: HeaderName, value: HeaderValue) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(name, value)
}

/// Development origins plus the configured ones; only the configured ones in production.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%origin, error = %err, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
