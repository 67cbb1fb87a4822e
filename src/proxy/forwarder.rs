//! Replays client requests against the backend.
//!
//! # Responsibilities
//! - Rebuild the client request with the raw target, every client header and the body
//! - Open a fresh HTTP/1.1 connection to the backend for each request
//! - Read the complete backend response and hand back a `ProxiedResponse`
//!
//! # Design Decisions
//! - Only POST and PUT carry a body; other methods are forwarded without one
//! - Body framing headers are recomputed from the bytes actually read
//! - Connect and exchange are bounded by separate timeouts

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    http::{header, HeaderValue, Method, Request, Uri},
};
use http_body_util::{BodyExt, Full};
use hyper::{body::Body as _, client::conn::http1, ext::ReasonPhrase};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::{BackendTarget, TimeoutConfig};
use crate::error::ProxyError;
use crate::http::request::InboundRequest;
use crate::http::response::ProxiedResponse;
use crate::proxy::body::{declared_length, read_body};

/// Forwards requests to the single configured backend.
#[derive(Debug, Clone)]
pub struct Forwarder {
    backend: Arc<BackendTarget>,
    connect_timeout: Duration,
    request_timeout: Duration,
    body_timeout: Duration,
}

impl Forwarder {
    pub fn new(backend: BackendTarget, timeouts: &TimeoutConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            connect_timeout: Duration::from_secs(timeouts.connect_secs),
            request_timeout: Duration::from_secs(timeouts.request_secs),
            body_timeout: Duration::from_secs(timeouts.body_read_secs),
        }
    }

    pub fn backend(&self) -> &BackendTarget {
        &self.backend
    }

    /// Forward `request` and return the backend's full response.
    pub async fn forward(&self, request: InboundRequest) -> Result<ProxiedResponse, ProxyError> {
        let target = request.raw_target(false);
        let upstream = self.build_request(request, &target).await?;

        tracing::debug!(
            method = %upstream.method(),
            raw_target = %target,
            backend = %self.backend,
            body_len = ?upstream.body().size_hint().exact(),
            "Forwarding request"
        );

        let addr = self.backend.authority();
        let stream = timeout(self.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| ProxyError::BackendTimeout(self.connect_timeout))?
            .map_err(|source| ProxyError::BackendUnreachable {
                addr: addr.clone(),
                source,
            })?;

        let (mut sender, conn) = http1::Builder::new()
            .title_case_headers(true)
            .handshake::<_, Full<Bytes>>(TokioIo::new(stream))
            .await
            .map_err(ProxyError::BackendHandshake)?;

        tokio::spawn(async move {
            if let Err(err) = conn.await {
                tracing::debug!(error = %err, "Backend connection closed with error");
            }
        });

        let exchange = async {
            let response = sender
                .send_request(upstream)
                .await
                .map_err(ProxyError::BackendProtocol)?;
            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(ProxyError::BackendProtocol)?
                .to_bytes();
            Ok::<_, ProxyError>((parts, body))
        };

        let (parts, body) = timeout(self.request_timeout, exchange)
            .await
            .map_err(|_| ProxyError::BackendTimeout(self.request_timeout))??;

        let reason = parts.extensions.get::<ReasonPhrase>().map(ReasonPhrase::as_bytes);
        Ok(ProxiedResponse::new(parts.status, reason, parts.headers, body))
    }

    /// Assemble the backend request from the client's.
    async fn build_request(
        &self,
        request: InboundRequest,
        target: &str,
    ) -> Result<Request<Full<Bytes>>, ProxyError> {
        let uri = Uri::try_from(target).map_err(|_| ProxyError::InvalidTarget(target.to_string()))?;

        let InboundRequest {
            method,
            mut headers,
            body,
            ..
        } = request;

        let payload = if carries_body(&method) {
            Some(read_body(body, declared_length(&headers), self.body_timeout).await)
        } else {
            None
        };

        headers.remove(header::TRANSFER_ENCODING);
        headers.remove(header::CONTENT_LENGTH);
        if let Some(ref bytes) = payload {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
        }
        if !headers.contains_key(header::HOST) {
            let host = HeaderValue::try_from(self.backend.authority())
                .map_err(|_| ProxyError::InvalidTarget(target.to_string()))?;
            headers.insert(header::HOST, host);
        }

        let mut upstream = Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(payload.unwrap_or_default()))?;
        *upstream.headers_mut() = headers;
        Ok(upstream)
    }
}

fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use crate::http::request::RawTarget;

    fn forwarder() -> Forwarder {
        Forwarder::new(
            BackendTarget { host: "127.0.0.1".into(), port: 5984 },
            &TimeoutConfig::default(),
        )
    }

    fn inbound(method: Method, target: &str, body: &'static str) -> InboundRequest {
        let mut req = Request::builder()
            .method(method)
            .uri(target)
            .header("x-custom", "one")
            .header("x-custom", "two")
            .header("content-length", body.len().to_string())
            .body(Body::from(body))
            .unwrap();
        let raw = RawTarget::from_uri(req.uri());
        req.extensions_mut().insert(raw);
        InboundRequest::from_request(req)
    }

    #[test]
    fn test_carries_body() {
        assert!(carries_body(&Method::POST));
        assert!(carries_body(&Method::PUT));
        assert!(!carries_body(&Method::GET));
        assert!(!carries_body(&Method::DELETE));
    }

    #[tokio::test]
    async fn test_build_request_keeps_raw_target_and_headers() {
        let fwd = forwarder();
        let req = inbound(Method::POST, "/db%2Fname/_bulk_docs?batch=ok", "{\"docs\":[]}");
        let target = req.raw_target(false);
        let upstream = fwd.build_request(req, &target).await.unwrap();

        assert_eq!(upstream.uri().to_string(), "/db%2Fname/_bulk_docs?batch=ok");
        let customs: Vec<_> = upstream.headers().get_all("x-custom").iter().collect();
        assert_eq!(customs, vec!["one", "two"]);
        assert_eq!(upstream.headers()["content-length"], "11");
        assert_eq!(upstream.headers()["host"], "127.0.0.1:5984");
        assert_eq!(upstream.body().size_hint().exact(), Some(11));
    }

    #[tokio::test]
    async fn test_build_request_drops_body_for_get() {
        let fwd = forwarder();
        let req = inbound(Method::GET, "/_all_dbs", "stray");
        let target = req.raw_target(false);
        let upstream = fwd.build_request(req, &target).await.unwrap();

        assert!(upstream.headers().get("content-length").is_none());
        assert_eq!(upstream.body().size_hint().exact(), Some(0));
    }

    #[tokio::test]
    async fn test_refused_backend_is_bad_gateway() {
        // Port 1 on loopback is reliably closed.
        let fwd = Forwarder::new(
            BackendTarget { host: "127.0.0.1".into(), port: 1 },
            &TimeoutConfig::default(),
        );
        let err = fwd.forward(inbound(Method::GET, "/", "")).await.unwrap_err();
        assert!(matches!(err, ProxyError::BackendUnreachable { .. }));
    }
}
