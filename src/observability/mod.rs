//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems emit tracing events through the `tracing` facade
//!     → logging.rs installs the subscriber once at startup
//!     → tower-http TraceLayer adds one span per request
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event, no string-built log lines
//! - `RUST_LOG` overrides the configured level

pub mod logging;

pub use logging::init_logging;
