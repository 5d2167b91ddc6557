//! Configuration loading from disk and the environment.

use std::env;
use std::fs;
use std::path::Path;

use crate::config::schema::ClientConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables that override file values, in field order.
const ENV_OVERRIDES: &[(&str, fn(&mut ClientConfig) -> &mut String)] = &[
    ("SURREAL_ADDRESS", |c| &mut c.address),
    ("SURREAL_USER", |c| &mut c.user),
    ("SURREAL_PASSWORD", |c| &mut c.password),
    ("SURREAL_NAMESPACE", |c| &mut c.namespace),
    ("SURREAL_DATABASE", |c| &mut c.database),
];

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
///
/// `SURREAL_*` environment variables take precedence over the file.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parse, apply environment overrides and validate.
pub fn parse_config(content: &str) -> Result<ClientConfig, ConfigError> {
    let mut config: ClientConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    apply_env_overrides(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overwrite connection fields from `SURREAL_*` variables that are set and non-empty.
pub fn apply_env_overrides(config: &mut ClientConfig) {
    apply_overrides(config, |name| env::var(name).ok());
}

fn apply_overrides(config: &mut ClientConfig, lookup: impl Fn(&str) -> Option<String>) {
    for (name, field) in ENV_OVERRIDES {
        if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
            tracing::debug!(variable = name, "Applying environment override");
            *field(config) = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_overrides_replace_only_set_values() {
        let vars: HashMap<&str, &str> = [
            ("SURREAL_ADDRESS", "http://db:8000"),
            ("SURREAL_USER", ""),
            ("SURREAL_NAMESPACE", "prod"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig {
            user: "root".into(),
            namespace: "dev".into(),
            ..ClientConfig::default()
        };
        apply_overrides(&mut config, |name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.address, "http://db:8000");
        assert_eq!(config.user, "root");
        assert_eq!(config.namespace, "prod");
        assert!(config.database.is_empty());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = parse_config("address = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("Parse error"));
    }
}
