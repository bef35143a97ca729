//! Network layer subsystem.
//!
//! The listener is a plain Tokio `TcpListener` bound in `main`; this module
//! only adds the optional TLS termination.

pub mod tls;
