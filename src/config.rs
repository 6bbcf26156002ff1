use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::Validate;

use crate::query_planner::select_rewriter::{
    materializer::CollectionPolicy, DEFAULT_ROWS_PARAMETER,
};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Rewriter configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RewriterConfig {
    /// Concrete collection type for reconstructed collection fields
    pub collection_policy: CollectionPolicy,

    /// Name of the placeholder for one raw result row
    #[validate(length(min = 1, message = "Input parameter name cannot be empty"))]
    pub input_parameter: String,

    /// Name of the flat row sequence parameter of post-processing transforms
    #[validate(length(min = 1, message = "Rows parameter name cannot be empty"))]
    pub rows_parameter: String,

    /// Execute unsupported projections unrewritten instead of failing
    pub fallback_on_unsupported: bool,
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            collection_policy: CollectionPolicy::Declared,
            input_parameter: "input".to_string(),
            rows_parameter: DEFAULT_ROWS_PARAMETER.to_string(),
            fallback_on_unsupported: true,
        }
    }
}

impl RewriterConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            collection_policy: parse_env_var("REGROUP_COLLECTION_POLICY", "declared")?,
            input_parameter: env::var("REGROUP_INPUT_PARAMETER")
                .unwrap_or_else(|_| "input".to_string()),
            rows_parameter: env::var("REGROUP_ROWS_PARAMETER")
                .unwrap_or_else(|_| DEFAULT_ROWS_PARAMETER.to_string()),
            fallback_on_unsupported: parse_env_var("REGROUP_FALLBACK", "true")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply command line overrides on top of this configuration
    pub fn merge_cli(mut self, cli: CliConfig) -> Result<Self, ConfigError> {
        if let Some(policy) = cli.collection_policy {
            self.collection_policy = policy;
        }
        if let Some(input) = cli.input_parameter {
            self.input_parameter = input;
        }
        if cli.no_fallback {
            self.fallback_on_unsupported = false;
        }

        self.validate()?;
        Ok(self)
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug, Default)]
pub struct CliConfig {
    pub collection_policy: Option<CollectionPolicy>,
    pub input_parameter: Option<String>,
    pub no_fallback: bool,
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RewriterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.collection_policy, CollectionPolicy::Declared);
        assert_eq!(config.rows_parameter, "rows");
        assert!(config.fallback_on_unsupported);
    }

    #[test]
    fn test_empty_input_parameter() {
        let config = RewriterConfig {
            input_parameter: "".to_string(), // Invalid
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        env::set_var("REGROUP_COLLECTION_POLICY", "list");
        env::set_var("REGROUP_FALLBACK", "false");
        let config = RewriterConfig::from_env();
        env::remove_var("REGROUP_COLLECTION_POLICY");
        env::remove_var("REGROUP_FALLBACK");

        let config = config.unwrap();
        assert_eq!(config.collection_policy, CollectionPolicy::List);
        assert!(!config.fallback_on_unsupported);
        assert_eq!(config.input_parameter, "input");
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_unknown_policy() {
        env::set_var("REGROUP_COLLECTION_POLICY", "bag");
        let config = RewriterConfig::from_env();
        env::remove_var("REGROUP_COLLECTION_POLICY");

        assert!(matches!(config, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "collection_policy: set\ninput_parameter: row").unwrap();

        let config = RewriterConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.collection_policy, CollectionPolicy::Set);
        assert_eq!(config.input_parameter, "row");
        // Unspecified fields keep their defaults
        assert_eq!(config.rows_parameter, "rows");
    }

    #[test]
    fn test_merge_cli_overrides() {
        let config = RewriterConfig::default()
            .merge_cli(CliConfig {
                collection_policy: Some(CollectionPolicy::Set),
                input_parameter: None,
                no_fallback: true,
            })
            .unwrap();
        assert_eq!(config.collection_policy, CollectionPolicy::Set);
        assert!(!config.fallback_on_unsupported);
    }
}
