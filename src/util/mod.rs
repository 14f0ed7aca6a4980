//! Utility modules for specmine
//!
//! - Structured logging setup and configuration
//! - Atomic file writes for artifacts and state

pub mod fs;
pub mod logging;

pub use fs::write_atomic;
pub use logging::{init_from_env, init_logging, LoggingConfig};
