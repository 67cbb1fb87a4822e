//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Classify each request into exactly one of redirect, static or proxy
//! - Build the `/_utils/` redirect
//! - Turn forwarding failures into 5xx responses
//!
//! # Design Decisions
//! - Exact `/_utils` wins over the `/_utils` prefix
//! - No method restrictions on any branch

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::assets::{AssetServer, ASSET_PREFIX};
use crate::http::request::InboundRequest;
use crate::proxy::Forwarder;

/// The handling path chosen for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Redirect,
    Static,
    Proxy,
}

/// Classify by prefix on the decoded path.
pub fn classify(decoded_path: &str) -> Route {
    if decoded_path == ASSET_PREFIX {
        Route::Redirect
    } else if decoded_path.starts_with(ASSET_PREFIX) {
        Route::Static
    } else {
        Route::Proxy
    }
}

/// Absolute URL of the asset root, reusing the client's scheme and host.
///
/// Without a `Host` header the server name is used instead.
pub fn redirect_location(scheme: Option<&str>, headers: &HeaderMap, server_name: &str) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or(server_name);

    format!("{}://{}{}/", scheme.unwrap_or("http"), host, ASSET_PREFIX)
}

/// Top-level dispatcher.
#[derive(Debug, Clone)]
pub struct Router {
    assets: AssetServer,
    forwarder: Forwarder,
    server_name: String,
}

impl Router {
    pub fn new(assets: AssetServer, forwarder: Forwarder, server_name: impl Into<String>) -> Self {
        Self {
            assets,
            forwarder,
            server_name: server_name.into(),
        }
    }

    /// Produce the single response for `request`.
    pub async fn route(&self, request: InboundRequest) -> Response {
        match classify(&request.decoded_path) {
            Route::Redirect => {
                let location =
                    redirect_location(request.uri.scheme_str(), &request.headers, &self.server_name);
                tracing::debug!(location = %location, "Redirecting to asset root");
                (
                    StatusCode::MOVED_PERMANENTLY,
                    [(header::LOCATION, location)],
                    "Moved to /_utils/\n",
                )
                    .into_response()
            }
            Route::Static => self.assets.serve(request.raw_target(true)).await,
            Route::Proxy => {
                let method = request.method.clone();
                match self.forwarder.forward(request).await {
                    Ok(response) => response.into_response(),
                    Err(e) => {
                        tracing::error!(
                            method = %method,
                            backend = %self.forwarder.backend(),
                            error = %e,
                            "Upstream request failed"
                        );
                        e.into_response()
                    }
                }
            }
        }
    }
}
