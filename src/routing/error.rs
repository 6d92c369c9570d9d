//! Routing error definitions.

use thiserror::Error;

/// Errors returned by the route table and middleware chain mutation API.
///
/// Resolution misses are not errors; see [`Resolution`](super::table::Resolution).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// An entry with the same domain, method and path already exists and
    /// overwriting was not allowed.
    #[error("route already exists: {method} {path} on domain '{domain}'")]
    DuplicateEntry {
        domain: String,
        method: String,
        path: String,
    },

    /// The domain pattern could not be parsed.
    #[error("invalid domain pattern '{pattern}': {reason}")]
    InvalidDomainPattern { pattern: String, reason: &'static str },

    /// The method token is neither `*` nor a valid HTTP method.
    #[error("invalid method '{0}'")]
    InvalidMethod(String),

    /// Routes are keyed by a non-empty path.
    #[error("route path must not be empty")]
    EmptyPath,

    /// Middleware index outside the current chain.
    #[error("middleware index {index} out of range (chain length {len})")]
    IndexOutOfRange { index: usize, len: usize },
}
