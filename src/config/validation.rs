//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Backend address must normalise to a usable host and port
//! - Document root must be an existing directory
//! - Timeouts must be non-zero
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function over ProxyConfig apart from the directory check
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::IpAddr;

use crate::config::schema::{BackendTarget, ProxyConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.address.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.address",
            format!("{:?} is not an IP address", config.listener.address),
        ));
    }

    if let Err(e) = BackendTarget::parse(&config.backend) {
        errors.push(ValidationError::new("backend", e));
    }

    if !config.document_root.is_dir() {
        errors.push(ValidationError::new(
            "document_root",
            format!("{:?} does not exist.", config.document_root.display().to_string()),
        ));
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.request_secs", timeouts.request_secs),
        ("timeouts.body_read_secs", timeouts.body_read_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
