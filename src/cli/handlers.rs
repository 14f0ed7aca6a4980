//! Command handlers. Each returns the process exit code.

use super::commands::{RunArgs, StatusArgs};
use super::output::OutputFormatter;
use super::progress::SpinnerHandler;
use crate::config::SpecmineConfig;
use crate::enrich::HttpEnricher;
use crate::pipeline::{state_path, Pipeline, PipelineResult, RunConfig};
use crate::progress::{LoggingHandler, ProgressHandler};
use crate::source::SourceLocation;
use crate::state::{StageId, StateManager};
use std::sync::Arc;
use tracing::{debug, error};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_COVERAGE_GATE: i32 = 2;

/// 0 on success, 1 when a stage failed, 2 when a coverage gate failed
pub fn exit_code(result: &PipelineResult) -> i32 {
    if !result.success {
        EXIT_FAILURE
    } else if !result.coverage_passed {
        EXIT_COVERAGE_GATE
    } else {
        EXIT_SUCCESS
    }
}

fn run_config(args: &RunArgs, settings: &SpecmineConfig) -> RunConfig {
    let source = SourceLocation::parse(&args.source, args.git_ref.clone());
    let mut config = RunConfig::from_settings(source, &args.output, settings)
        .with_resume(args.resume)
        .with_fail_on_coverage_gaps(settings.fail_on_coverage_gaps || args.fail_on_gaps);
    if let Some(interval) = args.bean_interval {
        config = config.with_bean_interval(interval);
    }
    config
}

pub async fn handle_run(args: &RunArgs, settings: &SpecmineConfig, quiet: bool) -> i32 {
    let config = run_config(args, settings);
    debug!(?config, "Run configuration");

    let mut pipeline = Pipeline::new(config);

    let endpoint = args
        .enrich_endpoint
        .clone()
        .or_else(|| settings.enrich_endpoint.clone());
    if let Some(endpoint) = endpoint {
        match HttpEnricher::with_timeout(endpoint, settings.enrich_timeout()) {
            Ok(enricher) => pipeline = pipeline.with_enricher(Box::new(enricher)),
            Err(e) => {
                eprintln!("Error: {}", e);
                return EXIT_FAILURE;
            }
        }
    }

    let spinner = Arc::new(SpinnerHandler::new(quiet));
    let handler: Arc<dyn ProgressHandler> = if spinner.is_visible() {
        spinner.clone()
    } else {
        Arc::new(LoggingHandler)
    };
    let pipeline = pipeline.with_progress_handler(handler);

    let outcome = pipeline.run().await;
    spinner.finish();

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Run aborted");
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    };

    let formatter = OutputFormatter::new(args.format.into());
    match formatter.format_result(&result, &args.output) {
        Ok(text) => {
            if !quiet || !result.success {
                println!("{}", text);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return EXIT_FAILURE;
        }
    }

    exit_code(&result)
}

pub fn handle_status(args: &StatusArgs) -> i32 {
    let path = state_path(&args.output);
    if !path.is_file() {
        eprintln!("No pipeline state found at {}", path.display());
        return EXIT_FAILURE;
    }

    let mut manager = StateManager::new(&path, &StageId::ALL);
    if !manager.load() {
        eprintln!("Pipeline state at {} is not valid", path.display());
        return EXIT_FAILURE;
    }

    let formatter = OutputFormatter::new(args.format.into());
    match formatter.format_status(manager.state(), &path) {
        Ok(text) => {
            println!("{}", text);
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{CliArgs, Commands};
    use clap::Parser;

    fn result(success: bool, coverage_passed: bool) -> PipelineResult {
        PipelineResult {
            success,
            coverage_passed,
            document_count: 0,
            gap_count: 0,
            error_stage: None,
            error_message: None,
            skipped_stages: vec![],
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&result(true, true)), EXIT_SUCCESS);
        assert_eq!(exit_code(&result(true, false)), EXIT_COVERAGE_GATE);
        assert_eq!(exit_code(&result(false, false)), EXIT_FAILURE);
    }

    fn run_args(argv: &[&str]) -> RunArgs {
        match CliArgs::parse_from(argv).command {
            Commands::Run(args) => args,
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_flags_override_settings() {
        let mut settings = SpecmineConfig::default();
        settings.fail_on_coverage_gaps = false;
        settings.bean_interval = 10;

        let args = run_args(&[
            "specmine",
            "run",
            "https://github.com/acme/shop.git",
            "-o",
            "out",
            "--fail-on-gaps",
            "--bean-interval",
            "5",
            "--resume",
        ]);
        let config = run_config(&args, &settings);

        assert!(config.fail_on_coverage_gaps);
        assert!(config.resume);
        assert_eq!(config.bean_interval, 5);
        assert!(matches!(config.source, SourceLocation::Remote { .. }));
    }

    #[test]
    fn test_settings_apply_without_flags() {
        let mut settings = SpecmineConfig::default();
        settings.fail_on_coverage_gaps = true;
        settings.bean_interval = 7;

        let args = run_args(&["specmine", "run", "./shop", "-o", "out"]);
        let config = run_config(&args, &settings);

        assert!(config.fail_on_coverage_gaps);
        assert_eq!(config.bean_interval, 7);
        assert!(matches!(config.source, SourceLocation::Local { .. }));
    }

    #[test]
    fn test_status_without_state() {
        let dir = tempfile::TempDir::new().unwrap();
        let args = StatusArgs {
            output: dir.path().to_path_buf(),
            format: crate::cli::commands::OutputFormatArg::Json,
        };
        assert_eq!(handle_status(&args), EXIT_FAILURE);
    }

    #[test]
    fn test_status_with_state() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".specmine/state.json");
        let mut manager = StateManager::new(&path, &StageId::ALL);
        manager.initialize(&StageId::ALL).unwrap();
        manager.complete_stage(StageId::A).unwrap();

        let args = StatusArgs {
            output: dir.path().to_path_buf(),
            format: crate::cli::commands::OutputFormatArg::Human,
        };
        assert_eq!(handle_status(&args), EXIT_SUCCESS);
    }
}
