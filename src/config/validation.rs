//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, gas parameters positive)
//! - Check addresses and paths parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;
use crate::ledger::connection::node_url;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check every semantic constraint, collecting all failures.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be > 0"));
    }
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() {
            errors.push(ValidationError::new("listener.tls.cert_path", "must not be empty"));
        }
        if tls.key_path.is_empty() {
            errors.push(ValidationError::new("listener.tls.key_path", "must not be empty"));
        }
    }

    let ledger = &config.ledger;
    if let Err(e) = node_url(&ledger.node_address, ledger.tls) {
        errors.push(ValidationError::new("ledger.node_address", e.to_string()));
    }
    if ledger.chain_id.parse::<cosmrs::tendermint::chain::Id>().is_err() {
        errors.push(ValidationError::new(
            "ledger.chain_id",
            format!("'{}' is not a valid chain id", ledger.chain_id),
        ));
    }
    if ledger.address_prefix.is_empty() {
        errors.push(ValidationError::new("ledger.address_prefix", "must not be empty"));
    }
    if ledger.fee_denom.parse::<cosmrs::Denom>().is_err() {
        errors.push(ValidationError::new(
            "ledger.fee_denom",
            format!("'{}' is not a valid denom", ledger.fee_denom),
        ));
    }
    if !(ledger.gas_price.is_finite() && ledger.gas_price >= 0.0) {
        errors.push(ValidationError::new("ledger.gas_price", "must be a non-negative number"));
    }
    if !(ledger.gas_adjustment.is_finite() && ledger.gas_adjustment >= 1.0) {
        errors.push(ValidationError::new("ledger.gas_adjustment", "must be >= 1.0"));
    }
    if ledger.gas_limit == 0 {
        errors.push(ValidationError::new("ledger.gas_limit", "must be > 0"));
    }
    if ledger.await_tx && ledger.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "ledger.confirmation_timeout_secs",
            "must be > 0 when await_tx is enabled",
        ));
    }
    if ledger.poll_interval_ms == 0 {
        errors.push(ValidationError::new("ledger.poll_interval_ms", "must be > 0"));
    }
    if ledger.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("ledger.connect_timeout_secs", "must be > 0"));
    }
    if ledger.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("ledger.rpc_timeout_secs", "must be > 0"));
    }

    let identity = &config.identity;
    if identity.key_name.is_empty() {
        errors.push(ValidationError::new("identity.key_name", "must not be empty"));
    }
    match &identity.mnemonic {
        Some(mnemonic) if !mnemonic.trim().is_empty() => {}
        _ => errors.push(ValidationError::new(
            "identity.mnemonic",
            "missing (set it in the file or via NFT_GATEWAY_MNEMONIC)",
        )),
    }
    if let Some(path) = &identity.hd_path {
        if path.parse::<cosmrs::bip32::DerivationPath>().is_err() {
            errors.push(ValidationError::new(
                "identity.hd_path",
                format!("'{}' is not a derivation path", path),
            ));
        }
    }

    if config.static_files.enabled && config.static_files.dir.is_empty() {
        errors.push(ValidationError::new("static_files.dir", "must not be empty"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }
    // Account query, simulation and submission each get up to rpc_timeout_secs.
    let pipeline_secs = ledger
        .rpc_timeout_secs
        .saturating_mul(3)
        .saturating_add(if ledger.await_tx { ledger.confirmation_timeout_secs } else { 0 });
    if config.timeouts.request_secs <= pipeline_secs {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            format!(
                "must exceed 3 * ledger.rpc_timeout_secs plus ledger.confirmation_timeout_secs ({}s)",
                pipeline_secs
            ),
        ));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
