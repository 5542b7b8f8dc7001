//! HTTP/REST API layer for personachat.
//!
//! Axum-based REST API at `/api/` with per-client rate limiting,
//! envelope response format, and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod ratelimit;
pub mod response;
pub mod router;
