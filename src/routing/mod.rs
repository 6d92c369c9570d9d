//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, method, path)
//!     → table.rs (entries stored under the exact path)
//!     → domain.rs (which domain patterns match the host)
//!     → method.rs (which entries accept the method)
//!     → matcher.rs (rank survivors: domain, then method, then insertion order)
//!     → Return: Found / MethodNotAllowed / NotFound
//!
//! Mutation (any time after startup):
//!     add / remove / remove_domain / clear
//!     → copy current table, apply change
//!     → atomic swap of Arc<RouteSet>
//! ```
//!
//! # Design Decisions
//! - Tables are mutable at runtime; readers never block
//! - No regex in hot path (label-wise domain matching)
//! - Deterministic: same table and input always select the same entry
//! - Explicit MethodNotAllowed and NotFound rather than silent default

pub mod domain;
pub mod error;
pub mod matcher;
pub mod method;
pub mod table;

pub use domain::{normalize_host, DomainPattern, ANY_DOMAIN};
pub use error::RouteError;
pub use matcher::{Rank, Specificity};
pub use method::{MethodFilter, ANY_METHOD};
pub use table::{AddOptions, Resolution, RouteEntry, RouteInfo, RouteSet, RouteTable};
