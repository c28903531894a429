//! HTTP API layer — axum router, middleware, and endpoint handlers.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;
