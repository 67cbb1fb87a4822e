//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (raw target capture, tracing, timeout)
//! - Bind server to listener
//! - Dispatch requests to the routing engine
//! - Stop accepting on shutdown and drain in-flight requests

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::assets::AssetServer;
use crate::config::{validate_config, BackendTarget, ConfigError, ProxyConfig, ValidationError};
use crate::http::request::{capture_raw_target, InboundRequest};
use crate::proxy::Forwarder;
use crate::routing::Router as ProxyRouter;

/// HTTP server for the proxy.
pub struct HttpServer {
    config: ProxyConfig,
    assets: AssetServer,
    forwarder: Forwarder,
}

impl HttpServer {
    /// Validate the configuration and prepare the request handlers.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let backend = BackendTarget::parse(&config.backend).map_err(|message| {
            ConfigError::Validation(vec![ValidationError {
                field: "backend",
                message,
            }])
        })?;
        let assets = AssetServer::new(&config.document_root, config.assets.confine_to_root)?;
        let forwarder = Forwarder::new(backend, &config.timeouts);

        Ok(Self {
            config,
            assets,
            forwarder,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Raw target capture is the outermost layer so it sees the URI exactly
    /// as hyper parsed it. The timeout layer only catches requests that outlive
    /// every backend leg together, and answers them as a gateway timeout.
    fn build_router(&self, server_name: String) -> Router {
        let state = Arc::new(ProxyRouter::new(
            self.assets.clone(),
            self.forwarder.clone(),
            server_name,
        ));
        let deadline = self.config.timeouts.request_deadline();

        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::GATEWAY_TIMEOUT,
                deadline,
            ))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(capture_raw_target))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            document_root = %self.assets.root().display(),
            backend = %self.forwarder.backend(),
            "Starting server at http://{}",
            addr
        );
        if !self.config.assets.confine_to_root {
            tracing::warn!("Assets may be served from outside the document root");
        }

        let app = self
            .build_router(addr.to_string())
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Catch-all handler: every request goes through the routing engine.
async fn dispatch(
    State(router): State<Arc<ProxyRouter>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    let inbound = InboundRequest::from_request(request);
    tracing::debug!(
        peer = %peer,
        method = %inbound.method,
        path = %inbound.decoded_path,
        "Handling request"
    );
    router.route(inbound).await
}
