//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the exercise gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS, connection limits).
    pub listener: ListenerConfig,

    /// Storage backend selection and connection settings.
    pub storage: StorageConfig,

    /// How the REST translator reaches the RPC service.
    pub gateway: GatewaySection,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:10000").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// Seconds to wait for open connections on shutdown.
    pub drain_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:10000".to_string(),
            tls: None,
            max_connections: 10_000,
            drain_timeout_secs: 30,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate chain file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Which Storage Port implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Mongodb,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// MongoDB connection string.
    pub uri: String,

    pub database: String,

    pub collection: String,

    /// Connect and server selection timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            uri: "mongodb://localhost:27017".to_string(),
            database: "myDB".to_string(),
            collection: "exercises".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

/// Where REST requests are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GatewayMode {
    /// Call the RPC service in the same process.
    #[default]
    InProcess,
    /// Forward to a gRPC endpoint.
    Remote,
}

/// REST translator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewaySection {
    pub mode: GatewayMode,

    /// gRPC endpoint used in remote mode (e.g., "http://127.0.0.1:10000").
    pub endpoint: String,

    /// Maximum accepted REST request body.
    pub max_body_bytes: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            mode: GatewayMode::InProcess,
            endpoint: "http://127.0.0.1:10000".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:10000");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.database, "myDB");
        assert_eq!(config.gateway.mode, GatewayMode::InProcess);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [storage]
            backend = "mongodb"
            uri = "mongodb://db:27017"

            [gateway]
            mode = "remote"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Mongodb);
        assert_eq!(config.storage.collection, "exercises");
        assert_eq!(config.gateway.mode, GatewayMode::Remote);
        assert_eq!(config.gateway.max_body_bytes, 2 * 1024 * 1024);
    }
}
