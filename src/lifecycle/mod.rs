//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscriber (main listener, admin listener, reload loop)
//!     → stop accepting → drain in-flight requests → exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans the shutdown out to all long-running tasks
//! - Listeners drain through axum's graceful shutdown

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
