use crate::ui;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use pulse_core::{CancellationToken, Registry, Resource};
use pulse_export::start_pipeline;
use pulse_workload::{
    parse_config_from_file, ConsoleFormat, DemoConfig, DemoInstruments, ExporterKind,
    WorkloadRunner,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Config file (YAML, TOML, or JSON); flags override its values
    #[arg(short, long, env = "PULSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Exporter: console, grpc, http or pull
    #[arg(short, long, env = "PULSE_EXPORTER")]
    pub exporter: Option<ExporterKind>,

    /// Number of synthetic events to record
    #[arg(short = 'n', long, env = "PULSE_ITERATIONS")]
    pub iterations: Option<u64>,

    /// Pause between events (e.g. "2s", "250ms")
    #[arg(long, env = "PULSE_INTERVAL")]
    pub interval: Option<humantime::Duration>,

    /// Time between periodic exports
    #[arg(long, env = "PULSE_FLUSH_INTERVAL")]
    pub flush_interval: Option<humantime::Duration>,

    /// Deadline for a single export
    #[arg(long, env = "PULSE_EXPORT_TIMEOUT")]
    pub timeout: Option<humantime::Duration>,

    #[arg(long, env = "PULSE_GRPC_ENDPOINT")]
    pub grpc_endpoint: Option<String>,

    #[arg(long, env = "PULSE_HTTP_ENDPOINT")]
    pub http_endpoint: Option<String>,

    #[arg(long, env = "PULSE_PULL_PORT")]
    pub pull_port: Option<u16>,

    /// Console exporter output: text or json
    #[arg(short, long, env = "PULSE_FORMAT")]
    pub format: Option<ConsoleFormat>,

    /// Seed for a reproducible workload
    #[arg(long, env = "PULSE_SEED")]
    pub seed: Option<u64>,

    /// Write the final snapshot to this JSON file
    #[arg(short, long)]
    pub output_json: Option<PathBuf>,
}

impl RunArgs {
    async fn load_config(&self) -> Result<DemoConfig> {
        let mut config = match &self.config {
            Some(path) => parse_config_from_file(path).await?,
            None => DemoConfig::default(),
        };

        if let Some(exporter) = self.exporter {
            config.export.exporter = exporter;
        }
        if let Some(iterations) = self.iterations {
            config.workload.iterations = iterations;
        }
        if let Some(interval) = self.interval {
            config.workload.interval = interval.into();
        }
        if let Some(flush_interval) = self.flush_interval {
            config.export.flush_interval = flush_interval.into();
        }
        if let Some(timeout) = self.timeout {
            config.export.timeout = timeout.into();
        }
        if let Some(endpoint) = &self.grpc_endpoint {
            config.export.grpc_endpoint = endpoint.clone();
        }
        if let Some(endpoint) = &self.http_endpoint {
            config.export.http_endpoint = endpoint.clone();
        }
        if let Some(port) = self.pull_port {
            config.export.pull_port = port;
        }
        if let Some(format) = self.format {
            config.export.console_format = format;
        }
        if let Some(seed) = self.seed {
            info!("Overriding workload seed: {}", seed);
            config.workload.seed = Some(seed);
        }

        config.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(config)
    }
}

pub async fn execute(args: RunArgs) -> Result<()> {
    let config = args.load_config().await?;

    ui::print_header("Pulse Metrics Demo");
    ui::print_field(
        "Service",
        format!("{} {}", config.service.name.green(), config.service.version),
    );
    ui::print_field("Exporter", describe_exporter(&config));
    ui::print_field(
        "Workload",
        format!(
            "{} iterations every {}",
            config.workload.iterations,
            humantime::format_duration(config.workload.interval)
        ),
    );
    ui::print_field(
        "Flush interval",
        humantime::format_duration(config.export.flush_interval),
    );
    if let Some(seed) = config.workload.seed {
        ui::print_field("Seed", format!("{} (reproducible)", seed));
    }

    let registry = Arc::new(Registry::new(Resource::service(
        config.service.name.clone(),
        config.service.version.clone(),
    )));
    let instruments =
        DemoInstruments::register(&registry).context("Failed to register demo instruments")?;

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping workload");
            signal_token.cancel();
        }
    });

    let flusher = start_pipeline(&config.export, Arc::clone(&registry), token.child_token())
        .await
        .context("Failed to start export pipeline")?;

    let pb = ProgressBar::new(config.workload.iterations);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );
    pb.set_message("recording");

    println!();
    let runner = WorkloadRunner::new(instruments);
    let result = runner
        .run(&config.workload, token.clone(), |report| {
            let sample = &report.sample;
            pb.suspend(|| {
                println!(
                    "Iteration {}: Counter +1, Gauge {:.2}%, Histogram {:.2}ms",
                    report.iteration, sample.cpu_usage, sample.duration_ms
                )
            });
            pb.inc(1);
        })
        .await;

    if result.cancelled {
        pb.abandon_with_message("interrupted");
    } else {
        pb.finish_and_clear();
    }

    let stats = flusher
        .shutdown()
        .await
        .context("Flusher task terminated abnormally")?;

    ui::print_header("Run Summary");
    ui::print_field(
        "Iterations",
        format!(
            "{}/{} ({:.0}%)",
            result.iterations_completed,
            result.iterations_planned,
            result.completion_rate() * 100.0
        ),
    );
    ui::print_field("Duration", humantime::format_duration(result.total_duration));
    ui::print_field(
        "Exports",
        format!("{} ({} failed)", stats.flushes, stats.failures),
    );
    if result.recording_errors > 0 {
        ui::print_warning(&format!("{} recordings were rejected", result.recording_errors));
    }

    if let Some(json_path) = args.output_json {
        let snapshot = registry.collect();
        let json = serde_json::to_string_pretty(&snapshot)?;
        tokio::fs::write(&json_path, json)
            .await
            .with_context(|| format!("Failed to write {}", json_path.display()))?;
        ui::print_info(&format!("Final snapshot saved to {}", json_path.display()));
    }

    if result.cancelled {
        ui::print_warning("Stopped early; final metrics were flushed");
    } else if stats.failures > 0 {
        ui::print_warning("Completed with export failures");
    } else {
        ui::print_success("Completed successfully");
    }

    Ok(())
}

fn describe_exporter(config: &DemoConfig) -> String {
    let export = &config.export;
    match export.exporter {
        ExporterKind::Console => format!("console ({:?})", export.console_format).to_lowercase(),
        ExporterKind::Grpc => format!("grpc -> {}", export.grpc_endpoint),
        ExporterKind::Http => format!("http -> {}", export.http_endpoint),
        ExporterKind::Pull => format!("pull on :{}/metrics", export.pull_port),
    }
}
