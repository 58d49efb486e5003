//! Request middleware wrapped around every route.

/// Development-only error detail rendering.
pub mod error_detail;
/// Per-client fixed-window rate limiting.
pub mod rate_limit;
