//! Shared application state and the player domain types.

/// Player domain types.
pub mod player;

use std::sync::Arc;

use crate::{config::AppConfig, dao::player_store::PlayerStore, middleware::rate_limit::RateLimiter};

/// State handle passed to handlers and services.
pub type SharedState = Arc<AppState>;

/// Central application state: immutable configuration, the storage handle
/// and the rate limiter windows.
pub struct AppState {
    config: AppConfig,
    player_store: Arc<dyn PlayerStore>,
    rate_limiter: RateLimiter,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, player_store: Arc<dyn PlayerStore>) -> SharedState {
        let rate_limiter = RateLimiter::new(config.rate_limit);
        Arc::new(Self {
            config,
            player_store,
            rate_limiter,
        })
    }

    /// Configuration read at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle to the storage backend selected at startup.
    pub fn player_store(&self) -> Arc<dyn PlayerStore> {
        self.player_store.clone()
    }

    /// Per-client request windows.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}
