//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, per-request metrics)
//!     → handlers.rs (decode JSON, call the ledger handle)
//!     → response.rs (map ledger errors to status codes)
//!     → Send to client
//!
//! Paths outside /api fall through to the static frontend bundle.
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::{AppState, HttpServer};
