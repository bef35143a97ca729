//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` wins over the configured level

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::{LogFormat, ObservabilityConfig};

/// Filter used when neither `RUST_LOG` nor the config names one.
pub const DEFAULT_FILTER: &str = "nft_gateway=info,tower_http=info";

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(&config.log_level)))?;

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
        LogFormat::Pretty => registry.with(fmt::layer()).try_init()?,
    }

    Ok(())
}

/// A bare level applies to this crate and tower_http; anything else is used verbatim.
fn filter_directive(log_level: &str) -> String {
    match log_level.trim() {
        "" => DEFAULT_FILTER.to_string(),
        level @ ("trace" | "debug" | "info" | "warn" | "error") => {
            format!("nft_gateway={level},tower_http={level}")
        }
        directive => directive.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(""), DEFAULT_FILTER);
        assert_eq!(filter_directive("debug"), "nft_gateway=debug,tower_http=debug");
        assert_eq!(filter_directive("nft_gateway=trace"), "nft_gateway=trace");
    }
}
