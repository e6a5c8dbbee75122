//! HTTP API layer for the GAD portal.
//!
//! This crate provides the REST API and real-time streaming:
//!
//! - **Endpoints**: JSON resources under `/api`
//! - **Extractors**: Authenticated, administrator and anonymous callers
//! - **Middleware**: Bearer-token authentication
//! - **Streaming**: Server-Sent Events per collection and per user
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod sse;

pub use endpoints::router;
pub use sse::{SseBroadcaster, SseEvent};
