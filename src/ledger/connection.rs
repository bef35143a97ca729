//! gRPC channel setup towards the ledger node.
//!
//! # Responsibilities
//! - Normalize the configured node address into an endpoint URI
//! - Negotiate TLS (rustls, TLS 1.2 minimum) with the node host as SNI name
//! - Bound DNS resolution and handshake with a connect timeout
//!
//! No retry happens here; a failed connect is reported to the caller.

use std::time::Duration;

use tonic::transport::{Channel, ClientTlsConfig, Endpoint};

use crate::ledger::types::{ConnectionError, LedgerConfig};
use crate::net::tls::install_crypto_provider;

/// Open a channel to the configured node.
pub async fn connect(config: &LedgerConfig) -> Result<Channel, ConnectionError> {
    let endpoint = endpoint(config)?;

    let channel = endpoint.connect().await.map_err(|e| ConnectionError::Unreachable {
        address: config.node_address.clone(),
        reason: e.to_string(),
    })?;

    tracing::info!(
        node = %config.node_address,
        tls = config.tls,
        "Ledger channel established"
    );

    Ok(channel)
}

/// Build the endpoint without connecting.
pub fn endpoint(config: &LedgerConfig) -> Result<Endpoint, ConnectionError> {
    let url = node_url(&config.node_address, config.tls)?;

    let mut endpoint = Endpoint::from_shared(url.to_string())
        .map_err(|e| ConnectionError::InvalidAddress {
            address: config.node_address.clone(),
            reason: e.to_string(),
        })?
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.rpc_timeout_secs));

    if config.tls {
        install_crypto_provider();
        // host_str is always present: node_url rejects URLs without a host.
        let domain = url.host_str().unwrap_or_default().to_string();
        let tls = ClientTlsConfig::new().domain_name(domain).with_native_roots();
        endpoint = endpoint
            .tls_config(tls)
            .map_err(|e| ConnectionError::Tls(e.to_string()))?;
    }

    Ok(endpoint)
}

/// Turn `host:port` or a full URL into the URL tonic expects.
///
/// A bare `host:port` gets `https://` when TLS is on and `http://` otherwise.
/// Without a port the scheme's default applies.
pub fn node_url(address: &str, tls: bool) -> Result<url::Url, ConnectionError> {
    let invalid = |reason: String| ConnectionError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    let address = address.trim();
    if address.is_empty() {
        return Err(invalid("address is empty".to_string()));
    }

    let with_scheme = if address.contains("://") {
        address.to_string()
    } else if tls {
        format!("https://{}", address)
    } else {
        format!("http://{}", address)
    };

    let url = url::Url::parse(&with_scheme).map_err(|e| invalid(e.to_string()))?;

    match url.scheme() {
        "https" if !tls => return Err(invalid("https scheme with tls disabled".to_string())),
        "http" if tls => return Err(invalid("http scheme with tls enabled".to_string())),
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    Ok(url)
}
