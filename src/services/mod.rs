//! Business operations invoked by the route handlers.

/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Player upsert, lookup and listing.
pub mod player_service;
