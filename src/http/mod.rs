//! HTTP host integration subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, timeout + trace layers)
//!     → resolver.rs (Host/method/path → route table → best entry)
//!     → middleware/chain.rs (snapshot composed around the handler)
//!     → handler.rs (terminal handler produces the response)
//!     → Send to client
//! ```

pub mod handler;
pub mod middleware;
pub mod resolver;
pub mod server;

pub use handler::{boxed, BoxHandler, Handler, StaticResponse};
pub use middleware::{Middleware, MiddlewareChain, Next, RequestId, RequestIdExt, X_REQUEST_ID};
pub use resolver::{HandlerTable, MatchOutcome, Resolver, ResolverService};
pub use server::HttpServer;
