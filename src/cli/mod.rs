pub mod commands;
pub mod handlers;
pub mod output;
pub mod progress;

pub use commands::{CliArgs, Commands, RunArgs, StatusArgs};
pub use handlers::{exit_code, handle_run, handle_status, EXIT_COVERAGE_GATE, EXIT_FAILURE, EXIT_SUCCESS};
pub use output::{OutputFormat, OutputFormatter};
pub use progress::SpinnerHandler;
