//! Ledger-facing value types and error definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export the ledger config sections from the config module to avoid duplication
pub use crate::config::schema::{IdentityConfig, LedgerConfig};

/// Chain identifier (e.g. `coreum-devnet-1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainId(String);

impl ChainId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ChainId {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Validated once here so signing can never fail on a bad chain id.
        s.parse::<cosmrs::tendermint::chain::Id>()
            .map_err(|e| SetupError::InvalidChainId(format!("'{}': {}", s, e)))?;
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How eagerly the node acknowledges a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastMode {
    /// Return once the transaction passed CheckTx.
    #[default]
    Sync,
    /// Return immediately, before CheckTx.
    Async,
}

/// Account number and sequence as reported by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountInfo {
    pub account_number: u64,
    pub sequence: u64,
}

/// Gas figures reported by a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasEstimate {
    pub gas_wanted: u64,
    pub gas_used: u64,
}

/// Node's view of a submitted or included transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TxResponse {
    pub txhash: String,
    /// Zero while the transaction is not yet part of a block.
    pub height: i64,
    pub code: u32,
    pub codespace: String,
    pub raw_log: String,
    pub gas_wanted: i64,
    pub gas_used: i64,
}

impl TxResponse {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Successful result of the broadcast pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxOutcome {
    pub txhash: String,
    /// `None` when confirmation was not awaited.
    pub height: Option<i64>,
    pub gas_wanted: u64,
    pub gas_used: u64,
}

/// Failure to open the RPC channel.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid node address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("TLS configuration failed: {0}")]
    Tls(String),

    #[error("node {address} unreachable: {reason}")]
    Unreachable { address: String, reason: String },
}

/// Failure to derive the signing identity.
#[derive(Debug, Error)]
pub enum KeyDerivationError {
    #[error("malformed seed phrase: {0}")]
    Mnemonic(String),

    #[error("unsupported derivation path '{path}': {reason}")]
    UnsupportedPath { path: String, reason: String },

    #[error("key derivation failed: {0}")]
    Derivation(String),

    #[error("address encoding failed: {0}")]
    Address(String),

    #[error("key '{0}' already exists in keyring")]
    DuplicateKey(String),
}

/// Failure while assembling the process-wide ledger handle.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("connection failed: {0}")]
    Connection(#[from] ConnectionError),

    #[error("identity setup failed: {0}")]
    KeyDerivation(#[from] KeyDerivationError),

    #[error("invalid chain id {0}")]
    InvalidChainId(String),

    #[error("invalid ledger configuration: {0}")]
    Config(String),
}

/// Raw RPC failure, before the pipeline classifies it.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The node could not be reached or the call timed out.
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with a gRPC error status.
    #[error("node returned {code}: {message}")]
    Status { code: String, message: String },

    /// The requested entity does not exist (yet).
    #[error("not found: {0}")]
    NotFound(String),

    /// The node answered with something we cannot decode.
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Failure to construct an operation payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("client context has no from-address")]
    MissingSender,

    #[error("data item must declare at least one editor")]
    EmptyEditors,

    #[error("data payload encoding failed: {0}")]
    Payload(String),
}

/// Classified failure of the broadcast pipeline.
///
/// Everything up to and including `Rejected` happened before the transaction
/// could have been included. `DeadlineExceeded` means the pipeline ran out of
/// time before submitting, so nothing reached the node. `Execution` means it was included and failed.
/// `Unknown` means it was submitted but its fate was not observed.
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("message encoding failed: {0}")]
    Encoding(String),

    #[error("account query failed: {0}")]
    AccountQuery(String),

    #[error("simulation rejected: {0}")]
    Simulation(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("submission failed: {0}")]
    Submission(String),

    #[error("transaction rejected by node (code {code}, codespace '{codespace}'): {log}")]
    Rejected {
        code: u32,
        codespace: String,
        log: String,
    },

    #[error("transaction {txhash} failed on-chain (code {code}, codespace '{codespace}'): {log}")]
    Execution {
        txhash: String,
        code: u32,
        codespace: String,
        log: String,
    },

    #[error("deadline elapsed during {stage}, transaction not submitted")]
    DeadlineExceeded { stage: &'static str },

    #[error("outcome of transaction {txhash} unknown: {reason}")]
    Unknown { txhash: String, reason: String },
}

impl BroadcastError {
    /// Short stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            BroadcastError::Encoding(_) => "encoding",
            BroadcastError::AccountQuery(_) => "account_query",
            BroadcastError::Simulation(_) => "simulation",
            BroadcastError::Signing(_) => "signing",
            BroadcastError::Submission(_) => "submission",
            BroadcastError::Rejected { .. } => "rejected",
            BroadcastError::Execution { .. } => "execution",
            BroadcastError::DeadlineExceeded { .. } => "deadline",
            BroadcastError::Unknown { .. } => "unknown",
        }
    }

    /// Hash of the submitted transaction, when submission got that far.
    pub fn txhash(&self) -> Option<&str> {
        match self {
            BroadcastError::Execution { txhash, .. } | BroadcastError::Unknown { txhash, .. } => {
                Some(txhash)
            }
            _ => None,
        }
    }
}

/// Error of a complete ledger operation (build + broadcast).
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Message(#[from] MessageError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
