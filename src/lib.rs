//! Futon development proxy library.
//!
//! Serves a locally edited copy of the CouchDB admin interface under
//! `/_utils/` and forwards every other request to the real server, keeping
//! the request-target byte for byte.

pub mod assets;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
