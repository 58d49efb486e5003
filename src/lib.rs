//! Library crate for player-scores-back, exposing modules for binaries and integration tests.

pub mod config;
pub mod dao;
mod dto;
mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
