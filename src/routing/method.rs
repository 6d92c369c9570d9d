//! Method filters.
//!
//! A route either names one concrete HTTP method or accepts any method (`*`).
//! A concrete method is always more specific than `*`; two different concrete
//! methods never compete for the same request.

use std::fmt;
use std::str::FromStr;

use axum::http::Method;

use crate::routing::error::RouteError;
use crate::routing::matcher::{Rank, Specificity};

/// Token for the any-method filter.
pub const ANY_METHOD: &str = "*";

/// Methods reported in `Allow` when an any-method route exists.
pub const STANDARD_METHODS: [Method; 9] = [
    Method::CONNECT,
    Method::HEAD,
    Method::GET,
    Method::DELETE,
    Method::OPTIONS,
    Method::PATCH,
    Method::POST,
    Method::PUT,
    Method::TRACE,
];

/// Method condition of a route entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MethodFilter {
    /// Matches every method not claimed by a concrete entry.
    Any,
    /// Matches exactly this method.
    Exact(Method),
}

impl MethodFilter {
    /// True if the filter accepts requests with `method`.
    pub fn accepts(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Exact(m) => m == method,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, MethodFilter::Any)
    }
}

impl Rank for MethodFilter {
    fn rank(&self, other: &Self) -> Specificity {
        match (self, other) {
            (MethodFilter::Any, MethodFilter::Any) => Specificity::Equal,
            (MethodFilter::Exact(_), MethodFilter::Any) => Specificity::MoreSpecific,
            (MethodFilter::Any, MethodFilter::Exact(_)) => Specificity::LessSpecific,
            (MethodFilter::Exact(a), MethodFilter::Exact(b)) if a == b => Specificity::Equal,
            (MethodFilter::Exact(_), MethodFilter::Exact(_)) => Specificity::Incomparable,
        }
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        MethodFilter::Exact(method)
    }
}

impl FromStr for MethodFilter {
    type Err = RouteError;

    /// Parses `*` or a method token, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token == ANY_METHOD {
            return Ok(MethodFilter::Any);
        }
        if token.is_empty() {
            return Err(RouteError::InvalidMethod(s.to_string()));
        }
        Method::from_bytes(token.to_ascii_uppercase().as_bytes())
            .map(MethodFilter::Exact)
            .map_err(|_| RouteError::InvalidMethod(s.to_string()))
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodFilter::Any => f.write_str(ANY_METHOD),
            MethodFilter::Exact(m) => f.write_str(m.as_str()),
        }
    }
}
