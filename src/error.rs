//! Request-time failures and their HTTP mapping.
//!
//! Every variant is scoped to a single request; none of them may stop the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("backend {addr} unreachable: {source}")]
    BackendUnreachable {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP handshake with backend failed: {0}")]
    BackendHandshake(#[source] hyper::Error),

    #[error("backend protocol error: {0}")]
    BackendProtocol(#[source] hyper::Error),

    #[error("backend did not answer within {0:?}")]
    BackendTimeout(std::time::Duration),

    #[error("request target {0:?} cannot be forwarded")]
    InvalidTarget(String),

    #[error("failed to assemble backend request: {0}")]
    InvalidRequest(#[from] axum::http::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::BackendTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), format!("{}\n", self)).into_response()
    }
}
