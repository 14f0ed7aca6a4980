//! specmine - resumable requirement mining for web application repositories
//!
//! specmine opens or clones a repository, detects the web stacks it is built on,
//! extracts structural surfaces (routes, APIs, models, environment variables and
//! more), writes one requirement document per surface, and evaluates how well the
//! documents cover what was found.
//!
//! # Core Concepts
//!
//! - **Stages**: A (clone), B (inventory), C (stack detection and extraction),
//!   C2 (enrichment), D (traceability), E (documents), F (coverage and gaps)
//! - **State**: every finished stage, and every tenth document inside stage E, is
//!   checkpointed so an interrupted run can be resumed
//! - **Signals**: independent pieces of stack evidence combined into one confidence
//!   per stack
//! - **Surfaces**: the typed records analyzers extract and evaluators cross-reference
//!
//! # Example Usage
//!
//! ```no_run
//! use specmine::{Pipeline, RunConfig, SourceLocation};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::new(SourceLocation::local("./shop"), "./out").with_resume(true);
//! let result = Pipeline::new(config).run().await?;
//!
//! println!("{} documents, {} gaps", result.document_count, result.gap_count);
//! # Ok(())
//! # }
//! ```

pub mod analyzers;
pub mod cli;
pub mod config;
pub mod coverage;
pub mod docs;
pub mod enrich;
pub mod gaps;
pub mod inventory;
pub mod pipeline;
pub mod progress;
pub mod source;
pub mod stack;
pub mod state;
pub mod surface;
pub mod trace;
pub mod util;

pub use config::{ConfigError, SpecmineConfig};
pub use coverage::{CoverageEvaluation, CoverageEvaluator};
pub use gaps::{GapAnalyzer, GapReport};
pub use pipeline::{Pipeline, PipelineError, PipelineResult, RunConfig};
pub use source::SourceLocation;
pub use stack::{Signal, StackAggregator, StackProfile};
pub use state::{StageId, StateManager};
pub use surface::{Surface, SurfaceType};
pub use trace::{TraceabilityBuilder, TraceabilityReport};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
