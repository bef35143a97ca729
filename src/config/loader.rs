//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "NFT_GATEWAY_CONFIG";

/// Environment variable overriding `identity.mnemonic`.
pub const MNEMONIC_ENV: &str = "NFT_GATEWAY_MNEMONIC";

/// Environment variable overriding `identity.passphrase`.
pub const PASSPHRASE_ENV: &str = "NFT_GATEWAY_PASSPHRASE";

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "gateway.toml";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file, applying env overrides.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, |key| std::env::var(key).ok())
}

/// Parse and validate TOML text. `env` resolves override variables.
pub fn parse_config<F>(content: &str, env: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: GatewayConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config, env);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Resolve the config path: explicit flag, then env, then the default file.
pub fn resolve_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn apply_env_overrides<F>(config: &mut GatewayConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(mnemonic) = env(MNEMONIC_ENV).filter(|m| !m.trim().is_empty()) {
        tracing::debug!("Identity mnemonic taken from {}", MNEMONIC_ENV);
        config.identity.mnemonic = Some(mnemonic);
    }
    if let Some(passphrase) = env(PASSPHRASE_ENV) {
        config.identity.passphrase = passphrase;
    }
}
