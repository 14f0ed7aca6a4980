use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Mine requirement documents and coverage reports from a web application repository
#[derive(Parser, Debug)]
#[command(
    name = "specmine",
    about = "Mine requirement documents and coverage reports from a web application repository",
    version,
    author,
    long_about = "specmine clones or opens a repository, detects its web stacks, extracts routes, \
                  APIs, models, configuration and other surfaces, writes one requirement document \
                  per surface, and reports coverage gates and gaps. Runs are checkpointed and can \
                  be resumed with --resume."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(
        short = 'c',
        long,
        global = true,
        value_name = "FILE",
        help = "TOML configuration file"
    )]
    pub config: Option<PathBuf>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Analyze a repository",
        long_about = "Runs stages A (clone) through F (coverage and gaps) and writes documents and \
                      reports into the output directory.\n\n\
                      Examples:\n  \
                      specmine run https://github.com/acme/shop.git -o out\n  \
                      specmine run ./shop -o out --resume\n  \
                      specmine run ./shop -o out --fail-on-gaps --format json"
    )]
    Run(RunArgs),

    #[command(
        about = "Show checkpoint state of an output directory",
        long_about = "Reads <OUTPUT>/.specmine/state.json and lists each stage.\n\n\
                      Examples:\n  \
                      specmine status -o out"
    )]
    Status(StatusArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[arg(value_name = "SOURCE", help = "Git URL or local repository path")]
    pub source: String,

    #[arg(short = 'o', long, value_name = "DIR", help = "Output directory")]
    pub output: PathBuf,

    #[arg(long = "ref", value_name = "REF", help = "Branch or tag to clone")]
    pub git_ref: Option<String>,

    #[arg(long, help = "Skip stages completed by a previous run")]
    pub resume: bool,

    #[arg(long, help = "Exit with code 2 when a coverage gate fails")]
    pub fail_on_gaps: bool,

    #[arg(
        long,
        value_name = "URL",
        help = "Enrichment API endpoint (overrides SPECMINE_ENRICH_ENDPOINT)"
    )]
    pub enrich_endpoint: Option<String>,

    #[arg(long, value_name = "N", help = "Documents between checkpoints")]
    pub bean_interval: Option<u64>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct StatusArgs {
    #[arg(short = 'o', long, value_name = "DIR", help = "Output directory of a run")]
    pub output: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
