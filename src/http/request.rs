//! Request capture and the raw-target resolver.
//!
//! # Responsibilities
//! - Record the request-target exactly as it appeared on the request line
//! - Derive the percent-decoded path used for classification
//! - Hand the rest of the proxy a typed, request-scoped `InboundRequest`
//!
//! # Design Decisions
//! - hyper stores the request-target in `Request::uri()` without decoding it.
//!   `capture_raw_target` runs as the outermost layer and freezes a copy in the
//!   request extensions, so later layers may rewrite the URI without losing it.
//! - A missing capture is not an error: callers fall back to the decoded path.

use axum::{
    body::Body,
    extract::Request,
    http::{Extensions, HeaderMap, Method, Uri, Version},
    middleware::Next,
    response::Response,
};
use percent_encoding::percent_decode_str;

/// The request-target as received on the wire, before any decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTarget(String);

impl RawTarget {
    pub fn new(target: impl Into<String>) -> Self {
        Self(target.into())
    }

    /// Capture from a URI parsed by hyper straight off the request line.
    ///
    /// Origin-form targets render as path plus query, absolute-form targets
    /// keep their scheme and authority.
    pub fn from_uri(uri: &Uri) -> Self {
        Self(uri.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Middleware storing the untouched request-target as a [`RawTarget`] extension.
pub async fn capture_raw_target(mut request: Request, next: Next) -> Response {
    let raw = RawTarget::from_uri(request.uri());
    request.extensions_mut().insert(raw);
    next.run(request).await
}

/// Recover the literal request-target for the current request.
///
/// Falls back to `fallback` (the decoded path) when no [`RawTarget`] was
/// captured. With `strip_query` the target is cut at the first `?`; nothing
/// is decoded either way.
pub fn resolve_raw_target(extensions: &Extensions, fallback: &str, strip_query: bool) -> String {
    let target = match extensions.get::<RawTarget>() {
        Some(raw) => raw.as_str(),
        None => {
            tracing::warn!(path = %fallback, "Raw request target unavailable, using decoded path");
            fallback
        }
    };

    match (strip_query, target.find('?')) {
        (true, Some(pos)) => target[..pos].to_string(),
        _ => target.to_string(),
    }
}

/// Percent-decode a request path. Invalid UTF-8 is replaced, never rejected.
pub fn decode_path(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

/// A single inbound request, exclusively owned by the handler serving it.
#[derive(Debug)]
pub struct InboundRequest {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    /// Percent-decoded path, used only for classification.
    pub decoded_path: String,
    pub query_present: bool,
    /// Client headers; repeated names keep their arrival order.
    pub headers: HeaderMap,
    pub extensions: Extensions,
    pub body: Body,
}

impl InboundRequest {
    pub fn from_request(request: Request) -> Self {
        let (parts, body) = request.into_parts();
        let decoded_path = decode_path(parts.uri.path());
        let query_present = parts.uri.query().is_some();

        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            decoded_path,
            query_present,
            headers: parts.headers,
            extensions: parts.extensions,
            body,
        }
    }

    /// The literal request-target, see [`resolve_raw_target`].
    pub fn raw_target(&self, strip_query: bool) -> String {
        resolve_raw_target(&self.extensions, &self.decoded_path, strip_query)
    }
}
