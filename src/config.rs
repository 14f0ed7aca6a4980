//! Configuration management for specmine
//!
//! Settings come from built-in defaults, optionally overlaid by a TOML file, and
//! finally by `SPECMINE_*` environment variables.
//!
//! # Environment Variables
//!
//! - `SPECMINE_LOG_LEVEL`: Logging level - default: "info"
//! - `SPECMINE_BEAN_INTERVAL`: Documents between checkpoints - default: "10"
//! - `SPECMINE_MIN_CONFIDENCE`: Minimum stack confidence - default: "0.3"
//! - `SPECMINE_MAX_FILE_SIZE`: Largest file scanned, in bytes - default: "1048576"
//! - `SPECMINE_MAX_FILES`: Maximum files in the inventory - default: "20000"
//! - `SPECMINE_CLONE_TIMEOUT`: Clone timeout in seconds - default: "300"
//! - `SPECMINE_FAIL_ON_GAPS`: Report failed coverage gates (true|false) - default: "false"
//! - `SPECMINE_ENRICH_ENDPOINT`: Enrichment API URL - default: unset (enrichment off)
//! - `SPECMINE_ENRICH_RPM`: Enrichment requests per minute - default: "60"
//! - `SPECMINE_ENRICH_TIMEOUT`: Enrichment request timeout in seconds - default: "30"
//!
//! # Example
//!
//! ```no_run
//! use specmine::SpecmineConfig;
//! use std::path::Path;
//!
//! let config = SpecmineConfig::load(Some(Path::new("specmine.toml"))).unwrap();
//! config.validate().unwrap();
//! ```

use crate::util::logging::parse_level;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_BEAN_INTERVAL: u64 = crate::state::DEFAULT_BEAN_INTERVAL;
const DEFAULT_MIN_CONFIDENCE: f64 = crate::stack::DEFAULT_MIN_CONFIDENCE;
const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;
const DEFAULT_MAX_FILES: usize = 20_000;
const DEFAULT_CLONE_TIMEOUT_SECS: u64 = 300;
const DEFAULT_ENRICH_RPM: u32 = 60;
const DEFAULT_ENRICH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to read config file {path}: {error}")]
    ReadError { path: String, error: String },

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpecmineConfig {
    pub log_level: String,
    pub bean_interval: u64,
    pub min_confidence: f64,
    pub max_file_size: u64,
    pub max_files: usize,
    pub clone_timeout_secs: u64,
    pub fail_on_coverage_gaps: bool,
    pub enrich_endpoint: Option<String>,
    pub enrich_requests_per_minute: u32,
    pub enrich_timeout_secs: u64,
}

/// Keys accepted in the TOML file; all optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileOverrides {
    log_level: Option<String>,
    bean_interval: Option<u64>,
    min_confidence: Option<f64>,
    max_file_size: Option<u64>,
    max_files: Option<usize>,
    clone_timeout_secs: Option<u64>,
    fail_on_coverage_gaps: Option<bool>,
    enrich_endpoint: Option<String>,
    enrich_requests_per_minute: Option<u32>,
    enrich_timeout_secs: Option<u64>,
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl Default for SpecmineConfig {
    /// Built-in defaults overridden by `SPECMINE_*` environment variables
    fn default() -> Self {
        let mut config = Self::builtin();
        config.apply_env();
        config
    }
}

impl SpecmineConfig {
    fn builtin() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            bean_interval: DEFAULT_BEAN_INTERVAL,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_files: DEFAULT_MAX_FILES,
            clone_timeout_secs: DEFAULT_CLONE_TIMEOUT_SECS,
            fail_on_coverage_gaps: false,
            enrich_endpoint: None,
            enrich_requests_per_minute: DEFAULT_ENRICH_RPM,
            enrich_timeout_secs: DEFAULT_ENRICH_TIMEOUT_SECS,
        }
    }

    /// Defaults, then the TOML file (if any), then environment variables.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::builtin();
        if let Some(path) = config_file {
            let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
            config.apply_toml(&content)?;
        }
        config.apply_env();
        Ok(config)
    }

    fn apply_toml(&mut self, content: &str) -> Result<(), ConfigError> {
        let file: FileOverrides = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            field: "config file".to_string(),
            error: e.to_string(),
        })?;

        if let Some(v) = file.log_level {
            self.log_level = v.to_lowercase();
        }
        if let Some(v) = file.bean_interval {
            self.bean_interval = v;
        }
        if let Some(v) = file.min_confidence {
            self.min_confidence = v;
        }
        if let Some(v) = file.max_file_size {
            self.max_file_size = v;
        }
        if let Some(v) = file.max_files {
            self.max_files = v;
        }
        if let Some(v) = file.clone_timeout_secs {
            self.clone_timeout_secs = v;
        }
        if let Some(v) = file.fail_on_coverage_gaps {
            self.fail_on_coverage_gaps = v;
        }
        if let Some(v) = file.enrich_endpoint {
            self.enrich_endpoint = Some(v);
        }
        if let Some(v) = file.enrich_requests_per_minute {
            self.enrich_requests_per_minute = v;
        }
        if let Some(v) = file.enrich_timeout_secs {
            self.enrich_timeout_secs = v;
        }
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(v) = env::var("SPECMINE_LOG_LEVEL") {
            self.log_level = v.to_lowercase();
        }
        if let Some(v) = env_parsed("SPECMINE_BEAN_INTERVAL") {
            self.bean_interval = v;
        }
        if let Some(v) = env_parsed("SPECMINE_MIN_CONFIDENCE") {
            self.min_confidence = v;
        }
        if let Some(v) = env_parsed("SPECMINE_MAX_FILE_SIZE") {
            self.max_file_size = v;
        }
        if let Some(v) = env_parsed("SPECMINE_MAX_FILES") {
            self.max_files = v;
        }
        if let Some(v) = env_parsed("SPECMINE_CLONE_TIMEOUT") {
            self.clone_timeout_secs = v;
        }
        if let Some(v) = env_parsed("SPECMINE_FAIL_ON_GAPS") {
            self.fail_on_coverage_gaps = v;
        }
        if let Ok(v) = env::var("SPECMINE_ENRICH_ENDPOINT") {
            let v = v.trim();
            self.enrich_endpoint = (!v.is_empty()).then(|| v.to_string());
        }
        if let Some(v) = env_parsed("SPECMINE_ENRICH_RPM") {
            self.enrich_requests_per_minute = v;
        }
        if let Some(v) = env_parsed("SPECMINE_ENRICH_TIMEOUT") {
            self.enrich_timeout_secs = v;
        }
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` naming the first invalid setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        if parse_level(&self.log_level).is_none() {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                self.log_level
            )));
        }
        if self.bean_interval == 0 {
            return Err(ConfigError::ValidationFailed(
                "Bean interval must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::ValidationFailed(format!(
                "Minimum confidence must be between 0.0 and 1.0, got {}",
                self.min_confidence
            )));
        }
        if self.max_file_size == 0 || self.max_files == 0 {
            return Err(ConfigError::ValidationFailed(
                "Scan limits must be greater than zero".to_string(),
            ));
        }
        if self.clone_timeout_secs == 0 || self.clone_timeout_secs > 3600 {
            return Err(ConfigError::ValidationFailed(
                "Clone timeout must be between 1 second and 1 hour".to_string(),
            ));
        }
        if self.enrich_timeout_secs == 0 || self.enrich_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Enrichment timeout must be between 1 second and 10 minutes".to_string(),
            ));
        }
        if let Some(endpoint) = &self.enrich_endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConfigError::ValidationFailed(format!(
                    "Enrichment endpoint must be an http(s) URL, got '{}'",
                    endpoint
                )));
            }
        }
        Ok(())
    }

    pub fn clone_timeout(&self) -> Duration {
        Duration::from_secs(self.clone_timeout_secs)
    }

    pub fn enrich_timeout(&self) -> Duration {
        Duration::from_secs(self.enrich_timeout_secs)
    }
}

impl fmt::Display for SpecmineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Specmine Configuration:")?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Bean Interval: {}", self.bean_interval)?;
        writeln!(f, "  Min Confidence: {}", self.min_confidence)?;
        writeln!(f, "  Max File Size: {} bytes", self.max_file_size)?;
        writeln!(f, "  Max Files: {}", self.max_files)?;
        writeln!(f, "  Clone Timeout: {}s", self.clone_timeout_secs)?;
        writeln!(f, "  Fail On Coverage Gaps: {}", self.fail_on_coverage_gaps)?;
        match &self.enrich_endpoint {
            Some(endpoint) => writeln!(
                f,
                "  Enrichment: {} ({} rpm, {}s timeout)",
                endpoint, self.enrich_requests_per_minute, self.enrich_timeout_secs
            )?,
            None => writeln!(f, "  Enrichment: disabled")?,
        }
        Ok(())
    }
}
