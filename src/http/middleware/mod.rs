//! Dynamic middleware subsystem.
//!
//! # Data Flow
//! ```text
//! Route resolved → terminal handler
//!     → chain.rs (snapshot current list, compose around handler)
//!     → m0(req, next) → m1(req, next) → ... → handler(req)
//!     → response travels back out through the same middlewares
//! ```
//!
//! Built-ins:
//! - request_id.rs (assign / propagate `x-request-id`)
//! - access_log.rs (structured access log + latency metrics)

pub mod access_log;
pub mod chain;
pub mod request_id;

pub use access_log::AccessLog;
pub use chain::{BoxMiddleware, Middleware, MiddlewareChain, Next};
pub use request_id::{RequestId, RequestIdExt, RequestIdMiddleware, X_REQUEST_ID};
