//! Response handling and transformation.
//!
//! # Responsibilities
//! - Hold a fully read backend response (`ProxiedResponse`)
//! - Strip hop-by-hop headers before relaying
//! - Preserve the backend's reason phrase on the way out
//!
//! # Design Decisions
//! - Backend bodies are buffered completely, then written in one go
//! - Hop-by-hop headers describe the proxy-to-backend link and never reach the client

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use hyper::ext::ReasonPhrase;

/// Headers that only apply to a single transport connection.
pub const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Whether `name` is a hop-by-hop header. Case-insensitive.
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|hop| hop.eq_ignore_ascii_case(name))
}

/// Remove every hop-by-hop header, all values included.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let hops: Vec<HeaderName> = headers
        .keys()
        .filter(|name| is_hop_by_hop(name.as_str()))
        .cloned()
        .collect();
    for name in hops {
        headers.remove(name);
    }
}

/// A backend response read in full, ready to relay to the client.
#[derive(Debug, Clone)]
pub struct ProxiedResponse {
    pub status: StatusCode,
    pub reason: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxiedResponse {
    /// Build from backend parts, dropping hop-by-hop headers.
    pub fn new(
        status: StatusCode,
        reason: Option<&[u8]>,
        mut headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        strip_hop_by_hop(&mut headers);
        let reason = reason
            .map(|r| String::from_utf8_lossy(r).into_owned())
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_default();

        Self {
            status,
            reason,
            headers,
            body,
        }
    }
}

impl IntoResponse for ProxiedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;

        if self.status.canonical_reason() != Some(self.reason.as_str()) {
            if let Ok(reason) = ReasonPhrase::try_from(self.reason) {
                response.extensions_mut().insert(reason);
            }
        }
        response
    }
}
