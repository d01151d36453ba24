mod commands;
mod ui;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{report::ReportFormat, run::RunArgs};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "In-process metrics pipeline with a synthetic request workload", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "PULSE_LOG_JSON")]
    log_json: bool,

    /// Also append logs to this file
    #[arg(long, global = true, env = "PULSE_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo workload and export its metrics
    Run(RunArgs),

    /// Render a snapshot written by `run --output-json`
    Report {
        /// Path to snapshot JSON file
        snapshot_file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a config file
    Validate {
        /// Path to config file (YAML, TOML, or JSON)
        config_file: PathBuf,
    },

    /// List available exporters
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(&cli)?;

    match cli.command {
        Commands::Run(args) => {
            commands::run::execute(args).await?;
        }

        Commands::Report {
            snapshot_file,
            format,
            output,
        } => {
            commands::report::execute(snapshot_file, format, output).await?;
        }

        Commands::Validate { config_file } => {
            commands::validate::execute(config_file).await?;
        }

        Commands::List => {
            commands::list::execute();
        }
    }

    Ok(())
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logs go to stderr so exporter output on stdout stays parseable.
fn init_logging(cli: &Cli) -> anyhow::Result<Option<WorkerGuard>> {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let mut layers: Vec<BoxedLayer> = vec![output_layer(cli.log_json, std::io::stderr, true)];

    let guard = match &cli.log_file {
        Some(path) => {
            let name = path
                .file_name()
                .with_context(|| format!("Log file path {} has no file name", path.display()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            layers.push(output_layer(cli.log_json, writer, false));
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(guard)
}

fn output_layer<W>(json: bool, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_target(false).with_writer(writer);
    if json {
        layer.json().boxed()
    } else {
        layer.with_ansi(ansi).boxed()
    }
}
