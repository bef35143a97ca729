//! TLS configuration and certificate loading for the listener.
//!
//! Both the listener (axum-server) and the node channel (tonic) run on
//! rustls. Their features pull in two crypto backends, so rustls cannot pick
//! one on its own; [`install_crypto_provider`] selects `ring` for the whole
//! process and must run before the first handshake.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

/// Install `ring` as the process-wide rustls crypto provider.
///
/// Idempotent: later calls, or a provider installed elsewhere, are left alone.
pub fn install_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        // Losing a race to another installer is fine; one provider is set either way.
        let _ = rustls::crypto::ring::default_provider().install_default();
    }
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, std::io::Error> {
    install_crypto_provider();

    for (what, path) in [("Certificate", cert_path), ("Private key", key_path)] {
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} file not found: {}", what, path.display()),
            ));
        }
    }

    RustlsConfig::from_pem_file(cert_path, key_path).await
}
