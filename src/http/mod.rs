//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, graceful shutdown)
//!     → request.rs (raw target captured, InboundRequest built)
//!     → routing layer picks redirect / static / proxy
//!     → response.rs (hop-by-hop stripped, reason phrase kept)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{capture_raw_target, resolve_raw_target, InboundRequest, RawTarget};
pub use response::{is_hop_by_hop, strip_hop_by_hop, ProxiedResponse, HOP_BY_HOP_HEADERS};
pub use server::HttpServer;
