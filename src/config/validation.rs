//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Namespace and database are set together or not at all
//! - Timeouts are non-zero
//! - Observability values parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - The address is checked when a driver connects, since in-process drivers
//!   need none

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ClientConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Exactly one of namespace/database is set.
    PartialSelection,
    /// A timeout is zero.
    ZeroTimeout(&'static str),
    /// Unknown log level.
    LogLevel(String),
    /// Metrics address does not parse.
    MetricsAddress(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::PartialSelection => {
                write!(f, "namespace and database must be set together")
            }
            ValidationError::ZeroTimeout(name) => write!(f, "timeouts.{} must be greater than 0", name),
            ValidationError::LogLevel(level) => write!(f, "unknown log level '{}'", level),
            ValidationError::MetricsAddress(addr) => write!(f, "invalid metrics address '{}'", addr),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.namespace.is_empty() != config.database.is_empty() {
        errors.push(ValidationError::PartialSelection);
    }

    let timeouts = &config.timeouts;
    for (name, value) in [
        ("connect_secs", timeouts.connect_secs),
        ("request_secs", timeouts.request_secs),
        ("operation_secs", timeouts.operation_secs),
        ("health_check_secs", timeouts.health_check_secs),
        ("selection_secs", timeouts.selection_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
