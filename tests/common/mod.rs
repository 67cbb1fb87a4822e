//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use futon_proxy::config::ProxyConfig;
use futon_proxy::{HttpServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Response sent by the recording backend: chunked, custom reason phrase,
/// and a selection of hop-by-hop headers that must not reach the client.
pub const BACKEND_RESPONSE: &str = "HTTP/1.1 201 Created Nicely\r\n\
Content-Type: application/json\r\n\
X-Couch-Request-ID: abc123\r\n\
Keep-Alive: timeout=5\r\n\
Proxy-Authenticate: Basic\r\n\
Trailers: X-Checksum\r\n\
Transfer-Encoding: chunked\r\n\
Connection: close\r\n\
\r\n\
b\r\n{\"ok\":true}\r\n0\r\n\r\n";

/// Body carried by [`BACKEND_RESPONSE`].
pub const BACKEND_BODY: &str = "{\"ok\":true}";

/// A request as seen by the backend.
#[derive(Debug)]
pub struct Recorded {
    pub head: String,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }
}

/// Start a backend that records every request and answers with [`BACKEND_RESPONSE`].
pub async fn start_recording_backend() -> (SocketAddr, mpsc::UnboundedReceiver<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Some(recorded) = read_request(&mut socket).await {
                            let _ = tx.send(recorded);
                        }
                        let _ = socket.write_all(BACKEND_RESPONSE.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, rx)
}

async fn read_request(socket: &mut TcpStream) -> Option<Recorded> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut recorded = Recorded { head, body: Vec::new() };
    let length: usize = recorded
        .header("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    recorded.body = body;
    Some(recorded)
}

/// An address nothing listens on.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Start the proxy on an ephemeral port.
pub async fn start_proxy(document_root: &Path, backend: SocketAddr) -> (SocketAddr, Shutdown) {
    let mut config = ProxyConfig::default();
    config.listener.port = 0;
    config.backend = format!("http://{}/", backend);
    config.document_root = document_root.to_path_buf();
    config.timeouts.connect_secs = 2;
    config.timeouts.request_secs = 5;
    config.timeouts.body_read_secs = 2;

    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    (addr, shutdown)
}

/// Write `request` verbatim and read the full response.
pub async fn raw_request(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(10), stream.read_to_end(&mut response)).await;
    String::from_utf8_lossy(&response).into_owned()
}

/// HTTP client that never goes through an environment proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
