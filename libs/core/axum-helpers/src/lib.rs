//! # Axum Helpers
//!
//! Shared utilities for building the workspace's Axum services.
//!
//! - **[`errors`]**: structured error responses ([`AppError`], [`ErrorResponse`])
//! - **[`health`]**: health and readiness endpoints
//! - **[`server`]**: router composition (OpenAPI docs, tracing) and server startup
//! - **[`shutdown`]**: graceful-shutdown signal handling

pub mod errors;
pub mod health;
pub mod server;
pub mod shutdown;

pub use errors::{AppError, ErrorResponse};
pub use health::{HealthResponse, health_handler, ready_handler};
pub use server::{create_app, create_router};
pub use shutdown::shutdown_signal;
