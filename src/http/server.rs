//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the API handlers
//! - Serve the static frontend for every other path
//! - Wire up middleware (tracing, limits, request ID, metrics)
//! - Bind server to listener, optionally over TLS
//! - Drain in-flight requests on shutdown

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{GatewayConfig, ListenerConfig};
use crate::http::{handlers, request};
use crate::ledger::LedgerHandle;
use crate::lifecycle::ShutdownToken;
use crate::net::tls::load_tls_config;

/// Grace period given to open connections once shutdown starts.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Time kept back from the request timeout for writing the response.
const RESPONSE_MARGIN: Duration = Duration::from_secs(1);

/// Pipeline budget that expires before the request timeout does, so a slow
/// ledger answers with its own outcome rather than a bare timeout.
fn pipeline_deadline(request_timeout: Duration) -> Duration {
    request_timeout
        .saturating_sub(RESPONSE_MARGIN)
        .max(request_timeout / 2)
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerHandle>,
}

/// HTTP server for the NFT gateway.
///
/// Keeps only the listener settings; everything else is baked into the router.
pub struct HttpServer {
    router: Router,
    listener: ListenerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &GatewayConfig, ledger: LedgerHandle) -> Self {
        let request_timeout = Duration::from_secs(config.timeouts.request_secs);
        let ledger = Arc::new(ledger.with_deadline(pipeline_deadline(request_timeout)));

        let router = Self::build_router(config, AppState { ledger });
        Self {
            router,
            listener: config.listener.clone(),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let api = Router::new()
            .route("/api/hello", get(handlers::hello))
            .route("/api/status", get(handlers::status))
            .route("/api/create-class", post(handlers::create_class))
            .route("/api/mint", post(handlers::mint))
            .route("/api/update", post(handlers::update))
            .with_state(state);

        let app = if config.static_files.enabled {
            api.fallback_service(ServeDir::new(&config.static_files.dir))
        } else {
            api
        };

        app.layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(middleware::from_fn(request::track_metrics))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request::request_id(req.headers()),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires, then drain.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownToken) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;

        match &self.listener.tls {
            None => {
                tracing::info!(address = %addr, "HTTP server starting");
                axum::serve(listener, self.router)
                    .with_graceful_shutdown(async move { shutdown.cancelled().await })
                    .await?;
            }
            Some(tls) => {
                tracing::info!(address = %addr, "HTTPS server starting");
                let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;

                let handle = axum_server::Handle::new();
                tokio::spawn({
                    let handle = handle.clone();
                    async move {
                        shutdown.cancelled().await;
                        handle.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
                    }
                });

                axum_server::from_tcp_rustls(listener.into_std()?, rustls)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
