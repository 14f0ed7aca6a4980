//! Structured logging setup for specmine
//!
//! Initializes a `tracing` subscriber with either pretty console output or JSON
//! lines. `RUST_LOG` directives are honored on top of the configured level.
//!
//! # Example
//!
//! ```no_run
//! use specmine::util::logging;
//!
//! logging::init_from_env();
//! tracing::info!(stage = "B", "Inventory scan started");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for specmine's own targets
    pub level: Level,

    /// Emit JSON lines instead of pretty console output
    pub use_json: bool,

    /// Include the module target (e.g. specmine::pipeline) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with source locations, for log collectors
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
        }
    }
}

/// Parses a log level name (case-insensitive).
///
/// ```
/// use specmine::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("DEBUG"), Some(Level::DEBUG));
/// assert_eq!(parse_level("verbose"), None);
/// ```
pub fn parse_level(level_str: &str) -> Option<Level> {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initializes the global subscriber. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = format!("specmine={}", config.level).parse() {
            filter = filter.add_directive(directive);
        }

        // Keep HTTP client chatter out unless RUST_LOG asks for it
        if env::var("RUST_LOG").is_err() {
            for quiet in ["h2=warn", "hyper=warn", "reqwest=warn"] {
                if let Ok(directive) = quiet.parse() {
                    filter = filter.add_directive(directive);
                }
            }
        }

        let registry = tracing_subscriber::registry().with(filter);
        let result = if config.use_json {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location),
                )
                .try_init()
        } else {
            registry
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location),
                )
                .try_init()
        };

        if let Err(e) = result {
            eprintln!("Logging already initialized: {}", e);
        }
    });
}

/// Initializes logging from environment variables
///
/// - `SPECMINE_LOG_LEVEL` - trace, debug, info, warn, error (default info)
/// - `SPECMINE_LOG_JSON` - true for JSON lines
/// - `RUST_LOG` - standard filter directives
pub fn init_from_env() {
    init_logging(config_from_env());
}

fn config_from_env() -> LoggingConfig {
    let level = match env::var("SPECMINE_LOG_LEVEL") {
        Ok(value) => parse_level(&value).unwrap_or_else(|| {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                value
            );
            Level::INFO
        }),
        Err(_) => Level::INFO,
    };

    let use_json = env::var("SPECMINE_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    LoggingConfig {
        level,
        use_json,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_level("Warn"), Some(Level::WARN));
        assert_eq!(parse_level(" error "), Some(Level::ERROR));
        assert_eq!(parse_level(""), None);
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn test_production_config() {
        let config = LoggingConfig::production();
        assert!(config.use_json);
        assert!(config.include_location);
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        env::set_var("SPECMINE_LOG_LEVEL", "debug");
        env::set_var("SPECMINE_LOG_JSON", "true");
        let config = config_from_env();
        env::remove_var("SPECMINE_LOG_LEVEL");
        env::remove_var("SPECMINE_LOG_JSON");

        assert_eq!(config.level, Level::DEBUG);
        assert!(config.use_json);
    }

    #[test]
    #[serial]
    fn test_invalid_env_level_falls_back() {
        env::set_var("SPECMINE_LOG_LEVEL", "loud");
        let config = config_from_env();
        env::remove_var("SPECMINE_LOG_LEVEL");

        assert_eq!(config.level, Level::INFO);
    }
}
