//! REST API for the FAQ and certificate pipelines
//!
//! Uses axum for routing and schemars for schema generation. Every response is
//! wrapped in the [`types::BaseResponse`] envelope.

pub mod handlers;
pub mod middleware;
pub mod routing;
pub mod startup;
pub mod state;
pub mod types;
