//! Bounded inbound body reads.

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap},
};
use http_body_util::BodyExt;

/// The client's declared `Content-Length`, 0 when absent or unparsable.
pub fn declared_length(headers: &HeaderMap) -> usize {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

/// Read at most `declared` bytes from `body`.
///
/// Stops early on end of stream, a transport error, or when `limit` elapses,
/// returning whatever arrived by then.
pub async fn read_body(mut body: Body, declared: usize, limit: Duration) -> Bytes {
    let mut collected: Vec<u8> = Vec::with_capacity(declared.min(64 * 1024));

    let read = async {
        while collected.len() < declared {
            match body.frame().await {
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        let take = (declared - collected.len()).min(data.len());
                        collected.extend_from_slice(&data[..take]);
                    }
                }
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "Client body ended with an error");
                    break;
                }
                None => break,
            }
        }
    };

    if tokio::time::timeout(limit, read).await.is_err() {
        tracing::warn!(timeout = ?limit, "Timed out reading request body");
    }

    if collected.len() < declared {
        tracing::warn!(
            declared,
            received = collected.len(),
            "Request body shorter than declared Content-Length"
        );
    }

    Bytes::from(collected)
}
