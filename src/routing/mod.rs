//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest (decoded path)
//!     → classify()
//!         "/_utils"          → Redirect  (301 to "/_utils/")
//!         "/_utils" + more   → Static    (assets::AssetServer)
//!         anything else      → Proxy     (proxy::Forwarder)
//! ```
//!
//! # Design Decisions
//! - Prefix matching only, on the decoded path
//! - Methods are never considered
//! - Immutable after construction, shared without locks

pub mod router;

pub use router::{classify, redirect_location, Route, Router};
