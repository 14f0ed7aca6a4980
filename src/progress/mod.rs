//! Progress reporting for pipeline runs

mod handler;
mod logging;

pub use handler::{CollectingHandler, NoOpHandler, PipelineEvent, ProgressHandler};
pub use logging::LoggingHandler;
