use specmine::cli::commands::{CliArgs, Commands};
use specmine::cli::{handle_run, handle_status, EXIT_FAILURE};
use specmine::util::logging::{init_logging, parse_level, LoggingConfig};
use specmine::{SpecmineConfig, VERSION};

use clap::Parser;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let settings = match SpecmineConfig::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_FAILURE);
        }
    };
    if let Err(e) = settings.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(EXIT_FAILURE);
    }

    init_logging_from_args(&args, &settings);

    debug!("specmine v{} starting", VERSION);
    debug!("Arguments: {:?}", args);
    debug!("{}", settings);

    let exit_code = match &args.command {
        Commands::Run(run_args) => handle_run(run_args, &settings, args.quiet).await,
        Commands::Status(status_args) => handle_status(status_args),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs, settings: &SpecmineConfig) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str).unwrap_or_else(|| {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        })
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        parse_level(&settings.log_level).unwrap_or(Level::INFO)
    };

    let mut config = LoggingConfig::with_level(level);
    config.use_json = args.log_json;
    init_logging(config);
}
