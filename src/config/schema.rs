//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Connection fields are plain strings; an empty string means "unset".

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::driver::Selection;

/// Root configuration for the client.
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Database endpoint (e.g., "ws://localhost:8000/rpc" or "http://localhost:8000").
    pub address: String,

    /// Sign-in user. Sign-in is skipped when empty.
    pub user: String,

    /// Sign-in password.
    pub password: String,

    /// Namespace selected after sign-in.
    pub namespace: String,

    /// Database selected after sign-in.
    pub database: String,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ClientConfig {
    /// The namespace/database pair configured for construction.
    pub fn selection(&self) -> Selection {
        Selection::new(self.namespace.as_str(), self.database.as_str())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("address", &self.address)
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("timeouts", &self.timeouts)
            .field("observability", &self.observability)
            .finish()
    }
}

/// Timeout configuration for the driver and for the client's own bounded calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Per-request transport timeout in seconds.
    pub request_secs: u64,

    /// Default operation bound used by the CLI, in seconds.
    pub operation_secs: u64,

    /// Health check bound in seconds.
    pub health_check_secs: u64,

    /// Namespace/database selection bound in seconds.
    pub selection_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            operation_secs: 10,
            health_check_secs: 3,
            selection_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// One JSON object per event for log aggregation.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
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
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_unset() {
        let config = ClientConfig::default();
        assert!(config.address.is_empty());
        assert!(!config.selection().is_set());
        assert_eq!(config.timeouts.health_check_secs, 3);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_minimal_toml() {
        let config: ClientConfig = toml::from_str(
            r#"
            address = "ws://localhost:8000/rpc"
            namespace = "n"
            database = "d"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.selection(), Selection::new("n", "d"));
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.timeouts.request_secs, 30);
    }

    #[test]
    fn test_debug_hides_password() {
        let config = ClientConfig {
            password: "hunter2".into(),
            ..ClientConfig::default()
        };
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
