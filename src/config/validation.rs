//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, limits and connection strings
//! - Check that the selected backend and gateway mode are fully configured
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{GatewayConfig, GatewayMode, StorageBackend};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., "listener.bind_address").
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

impl std::error::Error for ValidationError {}

/// Check every semantic rule and collect the failures.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let listener = &config.listener;
    if listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", listener.bind_address),
        ));
    }
    if listener.max_connections == 0 {
        errors.push(ValidationError::new(
            "listener.max_connections",
            "must be greater than zero",
        ));
    }
    if let Some(tls) = &listener.tls {
        if tls.cert_path.trim().is_empty() {
            errors.push(ValidationError::new("listener.tls.cert_path", "must not be empty"));
        }
        if tls.key_path.trim().is_empty() {
            errors.push(ValidationError::new("listener.tls.key_path", "must not be empty"));
        }
    }

    let storage = &config.storage;
    if storage.backend == StorageBackend::Mongodb {
        if !(storage.uri.starts_with("mongodb://") || storage.uri.starts_with("mongodb+srv://")) {
            errors.push(ValidationError::new(
                "storage.uri",
                "must start with mongodb:// or mongodb+srv://",
            ));
        }
        if storage.database.is_empty() {
            errors.push(ValidationError::new("storage.database", "must not be empty"));
        }
        if storage.collection.is_empty() {
            errors.push(ValidationError::new("storage.collection", "must not be empty"));
        }
    }

    let gateway = &config.gateway;
    if gateway.max_body_bytes == 0 {
        errors.push(ValidationError::new(
            "gateway.max_body_bytes",
            "must be greater than zero",
        ));
    }
    if gateway.mode == GatewayMode::Remote {
        match url::Url::parse(&gateway.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {}
            _ => errors.push(ValidationError::new(
                "gateway.endpoint",
                format!("{:?} is not an http(s) URL", gateway.endpoint),
            )),
        }
    }

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("expected one of {}", LOG_LEVELS.join(", ")),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("{:?} is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
