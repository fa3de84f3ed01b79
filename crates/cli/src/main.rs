mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use commands::{cmd_check, cmd_render};
use config::DocFormat;

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "GROUNDWORK_LOG";

/// Output format for diagnostics and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Source-order preserving document round-tripper.
#[derive(Parser)]
#[command(
    name = "groundwork",
    version,
    about = "Source-order preserving document round-tripper"
)]
struct Cli {
    /// Output format for diagnostics (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log debug detail to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./groundwork.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a document and write it back out in source order
    Render {
        /// Path to the JSON document
        file: PathBuf,
        /// Inline referenced content instead of keeping `$ref` markers
        #[arg(long)]
        resolve_references: bool,
        /// Output document format (json or yaml)
        #[arg(long, value_enum)]
        format: Option<DocFormat>,
    },

    /// Load a document and report anything that failed to build
    Check {
        /// Path to the JSON document
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            report_error(&e, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Render {
            file,
            resolve_references,
            format,
        } => {
            let settings = config.render.merge(resolve_references, format);
            cmd_render(&file, settings, cli.output, cli.quiet);
        }
        Commands::Check { file } => {
            cmd_check(&file, cli.output, cli.quiet);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
