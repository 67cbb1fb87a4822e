//! Proxy forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest (not under /_utils)
//!     → body.rs (bounded read of the declared Content-Length, POST/PUT only)
//!     → forwarder.rs (fresh backend connection, raw target replayed verbatim)
//!     → ProxiedResponse (hop-by-hop headers stripped)
//!     → client
//! ```
//!
//! # Design Decisions
//! - One backend connection per request; nothing is shared between requests
//! - The request-target is never re-encoded or normalised
//! - Backend failures become 502/504 for that request only

pub mod body;
pub mod forwarder;

pub use body::{declared_length, read_body};
pub use forwarder::Forwarder;
