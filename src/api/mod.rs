//! REST API module
//!
//! This module provides the HTTP server and REST API endpoints including:
//! - API routing and request handling
//! - Trace ID and security header middleware
//! - Todo and system handlers

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use middleware::{trace_id_middleware, TraceId, TRACE_ID_HEADER};
pub use models::ErrorResponse;
pub use server::ApiServer;
