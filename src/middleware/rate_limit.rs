use std::{net::SocketAddr, time::Duration};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::{task::JoinHandle, time::Instant};
use tracing::{debug, warn};

use crate::{config::RateLimitConfig, error::AppError, state::SharedState};

const FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");
const LIMIT_HEADER: HeaderName = HeaderName::from_static("ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RESET_HEADER: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Identity used when the client address cannot be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

/// Outcome of counting one request against its client's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request fits in the current window.
    Allowed {
        /// Requests allowed per window.
        limit: u32,
        /// Requests left in the current window.
        remaining: u32,
        /// Seconds until the window resets.
        reset_secs: u64,
    },
    /// The client spent its budget for the current window.
    Limited {
        /// Requests allowed per window.
        limit: u32,
        /// Seconds until the window resets.
        retry_after_secs: u64,
    },
}

/// Fixed-window request counter keyed by client identity.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    /// Create a limiter with no tracked clients.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    /// Budget and window length in use.
    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Count a request from `client` and decide whether it may proceed.
    pub fn check(&self, client: &str) -> Decision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> Decision {
        let limit = self.config.max_requests;
        let window = self.config.window;

        let mut entry = self
            .windows
            .entry(client.to_owned())
            .or_insert(Window {
                started: now,
                hits: 0,
            });
        if now.duration_since(entry.started) >= window {
            entry.started = now;
            entry.hits = 0;
        }
        entry.hits = entry.hits.saturating_add(1);

        let reset_secs = ceil_secs(window.saturating_sub(now.duration_since(entry.started)));
        if entry.hits > limit {
            Decision::Limited {
                limit,
                retry_after_secs: reset_secs,
            }
        } else {
            Decision::Allowed {
                limit,
                remaining: limit - entry.hits,
                reset_secs,
            }
        }
    }

    /// Drop windows that have fully elapsed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now.duration_since(window.started) < self.config.window);
        before.saturating_sub(self.windows.len())
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    secs.max(1)
}

/// Resolve the client address from the socket peer.
///
/// With `trust_proxy` set, the first `X-Forwarded-For` hop and then
/// `X-Real-IP` take precedence over the peer. Without it those headers are
/// client-controlled and ignored.
pub fn client_identity(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy: bool,
) -> String {
    let forwarded = if trust_proxy {
        forwarded_client(headers)
    } else {
        None
    };
    forwarded
        .map(str::to_owned)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_owned())
}

fn forwarded_client(headers: &HeaderMap) -> Option<&str> {
    let header_value = |name: &HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    header_value(&FORWARDED_FOR)
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .or_else(|| header_value(&REAL_IP))
}

/// Reject clients that exhausted their window; annotate every other response
/// with the standard `RateLimit-*` headers.
pub async fn enforce_rate_limit(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_identity(req.headers(), peer, state.config().trust_proxy);

    match state.rate_limiter().check(&client) {
        Decision::Allowed {
            limit,
            remaining,
            reset_secs,
        } => {
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert(LIMIT_HEADER, HeaderValue::from(limit));
            headers.insert(REMAINING_HEADER, HeaderValue::from(remaining));
            headers.insert(RESET_HEADER, HeaderValue::from(reset_secs));
            response
        }
        Decision::Limited {
            limit,
            retry_after_secs,
        } => {
            warn!(client = %client, retry_after_secs, "rate limit exceeded");
            let mut response = AppError::TooManyRequests { retry_after_secs }.into_response();
            let headers = response.headers_mut();
            headers.insert(LIMIT_HEADER, HeaderValue::from(limit));
            headers.insert(REMAINING_HEADER, HeaderValue::from(0u32));
            headers.insert(RESET_HEADER, HeaderValue::from(retry_after_secs));
            response
        }
    }
}

/// Periodically forget clients whose window has elapsed.
pub fn spawn_window_purge(state: SharedState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = state.rate_limiter().config().window;
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let purged = state.rate_limiter().purge_expired();
            if purged > 0 {
                debug!(purged, "purged expired rate limit windows");
            }
        }
    })
}
