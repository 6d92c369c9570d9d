//! Dynamic Router Library
//!
//! Runtime-mutable HTTP routing: a route table keyed by path, domain pattern
//! and method, resolved by specificity, plus a mutable middleware chain
//! composed around the selected handler.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ http::resolver ──▶ routing::table
//!                                           │                (best entry)
//!                                           ▼
//!                                 middleware::chain ──▶ handler
//!
//!     admin API / config reload ──▶ routing::table, middleware::chain
//!                                   (copy-on-write, next request sees it)
//! ```

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use http::{HttpServer, Resolver};
pub use lifecycle::Shutdown;
pub use routing::{AddOptions, DomainPattern, MethodFilter, RouteError, RouteTable};
