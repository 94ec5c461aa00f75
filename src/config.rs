//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.sentiscope.toml` files.

use crate::cli::OutputFormat;
use crate::client::ClientConfig;
use crate::models::CategoryFilter;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".sentiscope.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Analysis service settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Output settings.
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Analysis service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the analysis service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the fetch-and-classify endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Path of the single-text predict endpoint.
    #[serde(default = "default_predict_endpoint")]
    pub predict_endpoint: String,

    /// Transport timeout in seconds. Fetching and classifying can be slow.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoint: default_endpoint(),
            predict_endpoint: default_predict_endpoint(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_endpoint() -> String {
    "/api/fetch-comments".to_string()
}

fn default_predict_endpoint() -> String {
    "/api/predict".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl From<&ServiceConfig> for ClientConfig {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            endpoint: config.endpoint.clone(),
            predict_endpoint: config.predict_endpoint.clone(),
            timeout_seconds: config.timeout_seconds,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Width of the probability bar in characters.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,

    /// Category shown after a successful analysis.
    #[serde(default)]
    pub default_filter: CategoryFilter,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            bar_width: default_bar_width(),
            default_filter: CategoryFilter::default(),
        }
    }
}

fn default_bar_width() -> usize {
    30
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.service_url {
            self.service.base_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.service.timeout_seconds = timeout;
        }

        if let Some(format) = args.format {
            self.display.format = format;
        }
        if let Some(width) = args.bar_width {
            self.display.bar_width = width;
        }
        if let Some(filter) = args.filter {
            self.display.default_filter = filter;
        }
    }

    /// Check values that may have come from the file rather than the CLI.
    pub fn validate(&self) -> Result<()> {
        let url = &self.service.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            bail!("Service URL must start with 'http://' or 'https://', got '{}'", url);
        }
        if self.service.timeout_seconds == 0 {
            bail!("Timeout must be at least 1 second");
        }
        if self.display.bar_width == 0 {
            bail!("Bar width must be at least 1");
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.service.endpoint, "/api/fetch-comments");
        assert_eq!(config.display.bar_width, 30);
        assert_eq!(config.display.default_filter, CategoryFilter::All);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[service]
base_url = "http://analysis.internal:8080"
timeout_seconds = 30

[display]
format = "json"
default_filter = "negative"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.service.base_url, "http://analysis.internal:8080");
        assert_eq!(config.service.timeout_seconds, 30);
        assert_eq!(config.service.endpoint, "/api/fetch-comments");
        assert_eq!(config.display.format, OutputFormat::Json);
        assert_eq!(config.display.default_filter, CategoryFilter::Negative);
        assert_eq!(config.display.bar_width, 30);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[display]\nbar_width = 12").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.display.bar_width, 12);
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[display\nbar_width = ").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_validate_rejects_zero_bar_width_from_file() {
        let config: Config = toml::from_str("[display]\nbar_width = 0").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Bar width"));

        let config: Config = toml::from_str("[service]\ntimeout_seconds = 0").unwrap();
        assert!(config.validate().is_err());

        let config: Config = toml::from_str("[service]\nbase_url = \"localhost:5000\"").unwrap();
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_after_cli_override() {
        let mut config: Config = toml::from_str("[display]\nbar_width = 0").unwrap();
        config.display.bar_width = 12;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_client_config_from_service() {
        let service = ServiceConfig {
            timeout_seconds: 5,
            ..ServiceConfig::default()
        };
        let client = ClientConfig::from(&service);
        assert_eq!(client.timeout_seconds, 5);
        assert_eq!(client.predict_endpoint, "/api/predict");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[service]"));
        assert!(toml_str.contains("[display]"));
        assert!(toml_str.contains("bar_width = 30"));
    }
}
