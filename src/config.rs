//! Configuration file handling for the inspection CLI.
//!
//! Settings come from three places with clear precedence: built-in defaults,
//! then a TOML file (`tlsinspect.toml` or `--config`), then command-line
//! arguments on top.
//!
//! # Example configuration file
//!
//! ```toml
//! hosts = ["example.com", "example.com:8443"]
//! output = "summary"
//! exit_code = 1
//! timeout_seconds = 5
//!
//! [prometheus]
//! enabled = true
//! address = "http://localhost:9091"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration. All fields are optional so partial configurations
/// merge cleanly; missing values fall back to defaults.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Hosts to inspect (bare domain, URL, or host:port)
    pub hosts: Option<Vec<String>>,
    /// Output format: text, summary, json
    pub output: Option<String>,
    /// Process exit code when any host is not Valid
    pub exit_code: Option<i32>,
    /// Connect/handshake/request timeout in seconds
    pub timeout_seconds: Option<u64>,
    /// PEM bundle to verify against instead of the platform trust store
    pub ca_file: Option<String>,
    /// Prometheus push configuration
    pub prometheus: Option<PrometheusConfig>,
}

/// Prometheus push gateway settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PrometheusConfig {
    /// Push metrics after each run
    pub enabled: Option<bool>,
    /// Push gateway address, e.g. "http://localhost:9091"
    pub address: Option<String>,
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// Built-in defaults: summary output, exit code 0, 5 second timeout,
    /// platform trust store, no prometheus push.
    pub fn defaults() -> Self {
        Config {
            hosts: None,
            output: Some("summary".to_string()),
            exit_code: Some(0),
            timeout_seconds: Some(5),
            ca_file: None,
            prometheus: Some(PrometheusConfig {
                enabled: Some(false),
                address: Some("http://localhost:9091".to_string()),
            }),
        }
    }

    /// Merges `other` over this configuration: any field `other` sets wins,
    /// fields it leaves as `None` keep the current value.
    pub fn merge_with(mut self, other: Config) -> Self {
        if other.hosts.is_some() {
            self.hosts = other.hosts;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.exit_code.is_some() {
            self.exit_code = other.exit_code;
        }
        if other.timeout_seconds.is_some() {
            self.timeout_seconds = other.timeout_seconds;
        }
        if other.ca_file.is_some() {
            self.ca_file = other.ca_file;
        }
        if let Some(other_prom) = other.prometheus {
            if let Some(ref mut self_prom) = self.prometheus {
                if other_prom.enabled.is_some() {
                    self_prom.enabled = other_prom.enabled;
                }
                if other_prom.address.is_some() {
                    self_prom.address = other_prom.address;
                }
            } else {
                self.prometheus = Some(other_prom);
            }
        }
        self
    }

    /// Packs command-line arguments into a `Config` for merging; only the
    /// arguments the user actually passed (`Some`) override anything.
    pub fn from_cli_args(
        hosts: Option<Vec<String>>,
        output: Option<String>,
        exit_code: Option<i32>,
        timeout_seconds: Option<u64>,
        ca_file: Option<String>,
        prometheus: Option<bool>,
        prometheus_address: Option<String>,
    ) -> Self {
        Config {
            hosts,
            output,
            exit_code,
            timeout_seconds,
            ca_file,
            prometheus: Some(PrometheusConfig {
                enabled: prometheus,
                address: prometheus_address,
            }),
        }
    }

    /// Sample configuration in TOML, for bootstrapping a config file.
    pub fn example_toml() -> String {
        let example = Config {
            hosts: Some(vec![
                "example.com".to_string(),
                "example.com:8443".to_string(),
                "https://secure.example.com:9443".to_string(),
            ]),
            output: Some("summary".to_string()),
            exit_code: Some(1),
            timeout_seconds: Some(5),
            ca_file: None,
            prometheus: Some(PrometheusConfig {
                enabled: Some(true),
                address: Some("http://localhost:9091".to_string()),
            }),
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Error generating example".to_string())
    }
}

/// Errors raised while loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// File could not be read
    Io(String),
    /// File is not valid TOML for this schema
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO Error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse Error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
