//! KDP Desk API server library.
//!
//! Exposes config, state, error handling, routes and the ingestion engine
//! so integration tests and the binary entrypoint share the same pieces.

pub mod auth;
pub mod background;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod rates;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
