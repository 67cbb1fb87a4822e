//! Static asset subsystem.
//!
//! Serves the locally edited admin application under `/_utils/` in place of
//! the copy bundled with the backend.
//!
//! # Data Flow
//! ```text
//! raw target (query stripped)
//!     → strip "/_utils" and leading slashes
//!     → join onto document root, append index.html for directories
//!     → lexical normalisation (+ confinement check)
//!     → StaticFileDescriptor (type, size, fresh ETag)
//!     → 200 with anti-cache headers, or 404
//! ```
//!
//! # Design Decisions
//! - Nothing is cached: every response forces clients to refetch
//! - Paths come from the raw target so encoded characters are not decoded twice
//! - Any method is answered as a file read; `DELETE /_utils/x.js` returns the file

pub mod files;

pub use files::{AssetServer, StaticFileDescriptor, ASSET_PREFIX};
