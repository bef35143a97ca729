//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → every ShutdownToken observes cancellation
//!     → HTTP server stops accepting and drains
//!     → in-flight confirmations end with an unknown outcome
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup in main: config, logging, ledger handle, listener
//! - Any startup error is fatal

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownToken};
