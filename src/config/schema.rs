//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ledger::identity::KeyAlgorithm;
use crate::ledger::types::BroadcastMode;

/// Root configuration for the NFT gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Ledger node and transaction parameters.
    pub ledger: LedgerConfig,

    /// Signing identity.
    pub identity: IdentityConfig,

    /// Static frontend bundle.
    pub static_files: StaticFilesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Ledger node connection and transaction parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// gRPC endpoint, `host:port` or a full URL.
    pub node_address: String,

    /// Use TLS towards the node.
    pub tls: bool,

    pub chain_id: String,

    /// Bech32 human-readable prefix of account addresses.
    pub address_prefix: String,

    /// SLIP-44 coin type used for the default HD path.
    pub coin_type: u32,

    pub fee_denom: String,

    /// Price per gas unit in `fee_denom`.
    pub gas_price: f64,

    /// Multiplier applied to simulated gas usage.
    pub gas_adjustment: f64,

    /// Gas limit used when simulation is disabled.
    pub gas_limit: u64,

    /// Simulate before signing to size the gas limit.
    pub simulate_and_execute: bool,

    pub broadcast_mode: BroadcastMode,

    /// Wait for block inclusion before answering.
    pub await_tx: bool,

    pub confirmation_timeout_secs: u64,

    pub poll_interval_ms: u64,

    pub connect_timeout_secs: u64,

    /// Per-call RPC timeout in seconds.
    pub rpc_timeout_secs: u64,

    pub memo: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            node_address: "full-node.devnet-1.coreum.dev:9090".to_string(),
            tls: true,
            chain_id: "coreum-devnet-1".to_string(),
            address_prefix: "devcore".to_string(),
            coin_type: 990,
            fee_denom: "udevcore".to_string(),
            gas_price: 0.0625,
            gas_adjustment: 1.2,
            gas_limit: 200_000,
            simulate_and_execute: true,
            broadcast_mode: BroadcastMode::Sync,
            await_tx: true,
            confirmation_timeout_secs: 30,
            poll_interval_ms: 1000,
            connect_timeout_secs: 10,
            rpc_timeout_secs: 10,
            memo: String::new(),
        }
    }
}

/// Signing identity derived at startup.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Keyring label of the identity.
    pub key_name: String,

    /// BIP-39 seed phrase. Usually supplied through `NFT_GATEWAY_MNEMONIC`.
    #[serde(skip_serializing)]
    pub mnemonic: Option<String>,

    #[serde(skip_serializing)]
    pub passphrase: String,

    /// Full BIP-44 path; defaults to `m/44'/{coin_type}'/0'/0/0`.
    pub hd_path: Option<String>,

    pub algorithm: KeyAlgorithm,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            key_name: "key-name".to_string(),
            mnemonic: None,
            passphrase: String::new(),
            hd_path: None,
            algorithm: KeyAlgorithm::Secp256k1,
        }
    }
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("key_name", &self.key_name)
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "<redacted>"))
            .field("passphrase", &"<redacted>")
            .field("hd_path", &self.hd_path)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Static file serving for the frontend bundle.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub enabled: bool,

    /// Directory served for every path outside `/api`.
    pub dir: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "./frontend/build".to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 90 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9100".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.ledger.chain_id, "coreum-devnet-1");
        assert_eq!(config.ledger.coin_type, 990);
        assert!(config.ledger.simulate_and_execute);
        assert_eq!(config.identity.key_name, "key-name");
        assert_eq!(config.static_files.dir, "./frontend/build");
    }

    #[test]
    fn test_partial_sections() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [ledger]
            node_address = "localhost:9090"
            tls = false
            broadcast_mode = "async"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.ledger.node_address, "localhost:9090");
        assert!(!config.ledger.tls);
        assert_eq!(config.ledger.broadcast_mode, BroadcastMode::Async);
        assert_eq!(config.ledger.fee_denom, "udevcore");
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_identity_secrets_hidden() {
        let identity = IdentityConfig {
            mnemonic: Some("abandon abandon about".into()),
            passphrase: "hunter2".into(),
            ..Default::default()
        };
        let debug = format!("{:?}", identity);
        assert!(!debug.contains("abandon"));
        assert!(!debug.contains("hunter2"));

        let serialized = toml::to_string(&identity).unwrap();
        assert!(!serialized.contains("abandon"));
        assert!(!serialized.contains("hunter2"));
    }
}
