//! Ledger client subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (session.rs):
//!     LedgerConfig → connection.rs (gRPC channel, TLS)
//!     IdentityConfig → identity.rs (mnemonic → HD key → address)
//!     codec.rs (encoding registry)
//!     → ClientContext + TxFactory (context.rs) → LedgerHandle
//!
//! Per operation:
//!     request → messages.rs (pure builder) → LedgerMsg
//!     → broadcast.rs: pack → account → simulate → sign → submit → await
//!     → rpc.rs (LedgerRpc) → node
//! ```
//!
//! # Design Decisions
//! - Setup happens once; a failed setup never yields a partial handle
//! - Context and factory are immutable values with `with_*` setters
//! - The pipeline never retries; unobserved outcomes are reported as unknown

pub mod broadcast;
pub mod codec;
pub mod connection;
pub mod context;
pub mod identity;
pub mod messages;
pub mod rpc;
pub mod session;
pub mod types;

pub use broadcast::broadcast_tx;
pub use codec::{EncodingRegistry, LedgerMsg, NftData};
pub use context::{ClientContext, TxConfig, TxFactory};
pub use identity::{AccountIdentity, KeyAlgorithm, Keyring};
pub use messages::{build_class_id, IssueClassRequest, MintRequest, UpdateDataRequest};
pub use rpc::{GrpcLedger, LedgerRpc};
pub use session::{LedgerHandle, NftReceipt};
pub use types::{BroadcastError, LedgerError, LedgerResult, SetupError, TxOutcome};
