//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Port used when the backend address omits one.
pub const DEFAULT_BACKEND_PORT: u16 = 5984;

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address and port).
    pub listener: ListenerConfig,

    /// Backend address as supplied by the operator (`http://host:port/`, `host:port`, ...).
    pub backend: String,

    /// Directory served under `/_utils/`.
    pub document_root: PathBuf,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Static asset settings.
    pub assets: AssetConfig,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            backend: format!("127.0.0.1:{}", DEFAULT_BACKEND_PORT),
            document_root: PathBuf::from("."),
            timeouts: TimeoutConfig::default(),
            assets: AssetConfig::default(),
            log_level: "debug".to_string(),
        }
    }
}

impl ProxyConfig {
    /// Socket address string the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listener.address, self.listener.port)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// IP to use for client connections.
    pub address: String,

    /// Port to use for client connections.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Timeout configuration for the inbound and backend legs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Backend request/response exchange timeout in seconds.
    pub request_secs: u64,

    /// Upper bound for reading an inbound request body, in seconds.
    pub body_read_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            body_read_secs: 10,
        }
    }
}

impl TimeoutConfig {
    /// Longest a proxied request may legitimately take: body read, connect
    /// and exchange back to back.
    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(
            self.body_read_secs
                .saturating_add(self.connect_secs)
                .saturating_add(self.request_secs),
        )
    }
}

/// Static asset settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Refuse to serve files that resolve outside the document root.
    pub confine_to_root: bool,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            confine_to_root: true,
        }
    }
}

/// The single backend every non-asset request is forwarded to.
///
/// Fixed at startup and shared read-only by all handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTarget {
    pub host: String,
    pub port: u16,
}

impl BackendTarget {
    /// Parse an operator supplied backend address.
    ///
    /// A leading `http://` or `https://` and any trailing slashes are removed;
    /// the backend is always spoken to over plain HTTP.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        let stripped = trimmed
            .strip_prefix("http://")
            .or_else(|| trimmed.strip_prefix("https://"))
            .unwrap_or(trimmed)
            .trim_end_matches('/');

        if stripped.is_empty() {
            return Err(format!("backend address {:?} is empty", raw));
        }
        if stripped.contains('/') {
            return Err(format!("backend address {:?} must not contain a path", raw));
        }

        // Bracketed IPv6 literals keep their brackets in `host`.
        let (host, port) = match stripped.rfind(':') {
            Some(idx) if !stripped[idx..].contains(']') => {
                let port = stripped[idx + 1..]
                    .parse::<u16>()
                    .map_err(|_| format!("backend address {:?} has an invalid port", raw))?;
                (&stripped[..idx], port)
            }
            _ => (stripped, DEFAULT_BACKEND_PORT),
        };

        if host.is_empty() {
            return Err(format!("backend address {:?} has no host", raw));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// `host:port` form used for connecting.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for BackendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_scheme_and_slash_stripped() {
        let target = BackendTarget::parse("http://127.0.0.1:5984/").unwrap();
        assert_eq!(target, BackendTarget { host: "127.0.0.1".into(), port: 5984 });

        let target = BackendTarget::parse("https://couch.local:6984//").unwrap();
        assert_eq!(target.host, "couch.local");
        assert_eq!(target.port, 6984);
    }

    #[test]
    fn test_backend_default_port() {
        let target = BackendTarget::parse("couch.local").unwrap();
        assert_eq!(target.port, DEFAULT_BACKEND_PORT);
        assert_eq!(target.authority(), "couch.local:5984");
    }

    #[test]
    fn test_backend_ipv6() {
        let target = BackendTarget::parse("[::1]:5985").unwrap();
        assert_eq!(target.host, "[::1]");
        assert_eq!(target.port, 5985);

        let target = BackendTarget::parse("[::1]").unwrap();
        assert_eq!(target.host, "[::1]");
        assert_eq!(target.port, DEFAULT_BACKEND_PORT);
    }

    #[test]
    fn test_backend_rejects_garbage() {
        assert!(BackendTarget::parse("").is_err());
        assert!(BackendTarget::parse("http://").is_err());
        assert!(BackendTarget::parse("host:notaport").is_err());
        assert!(BackendTarget::parse("host:5984/db").is_err());
        assert!(BackendTarget::parse(":5984").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ProxyConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.backend, "127.0.0.1:5984");
        assert!(config.assets.confine_to_root);
    }

    #[test]
    fn test_request_deadline_covers_every_leg() {
        let timeouts = TimeoutConfig {
            connect_secs: 7,
            request_secs: 1,
            body_read_secs: 1,
        };
        // A slow connect alone must still fit inside the outer deadline.
        assert!(timeouts.request_deadline() > Duration::from_secs(timeouts.connect_secs));
        assert_eq!(timeouts.request_deadline(), Duration::from_secs(9));
        assert_eq!(TimeoutConfig::default().request_deadline(), Duration::from_secs(45));

        let huge = TimeoutConfig {
            connect_secs: u64::MAX,
            request_secs: 1,
            body_read_secs: 1,
        };
        assert_eq!(huge.request_deadline(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            backend = "http://db:5984/"
            [listener]
            port = 9000
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.port, 9000);
        assert_eq!(config.listener.address, "127.0.0.1");
        assert_eq!(config.timeouts.connect_secs, 5);
    }
}
