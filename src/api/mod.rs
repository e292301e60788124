//! HTTP API for the session engine
//!
//! Thin axum surface over the engine's client-facing actions. The engine is
//! transport-agnostic; real-time event delivery to clients is handled by the
//! surrounding transport, which subscribes to the broadcaster.

pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
