//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → routes seeded into the live table
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps the seeded routes in one table update
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - An invalid file on reload is logged and the running table is kept

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, ListenerConfig, MiddlewareConfig, ObservabilityConfig, RouteConfig,
    RouterConfig, TimeoutConfig,
};
pub use validation::{parse_route, validate_config, ParsedRoute, ValidationError};
pub use watcher::ConfigWatcher;
