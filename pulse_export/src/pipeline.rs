use crate::{
    console::ConsoleExporter, pull::PullExporter, push_http::HttpPushExporter,
    push_stream::StreamPushExporter,
};
use anyhow::Context;
use pulse_core::{
    CancellationToken, DynExporter, FlusherConfig, FlusherHandle, PeriodicFlusher, Registry,
};
use pulse_workload::{ExportConfig, ExporterKind};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub async fn build_exporter(
    config: &ExportConfig,
    registry: Arc<Registry>,
    token: CancellationToken,
) -> anyhow::Result<DynExporter> {
    let exporter: DynExporter = match config.exporter {
        ExporterKind::Console => Arc::new(ConsoleExporter::stdout(config.console_format)),
        ExporterKind::Grpc => Arc::new(StreamPushExporter::new(
            config.grpc_endpoint.clone(),
            config.timeout,
        )),
        ExporterKind::Http => Arc::new(
            HttpPushExporter::new(&config.http_endpoint, config.timeout)
                .context("Failed to create HTTP exporter")?,
        ),
        ExporterKind::Pull => {
            let addr = SocketAddr::from(([0, 0, 0, 0], config.pull_port));
            Arc::new(
                PullExporter::bind(addr, registry, token)
                    .await
                    .with_context(|| format!("Failed to bind pull endpoint on {}", addr))?,
            )
        }
    };

    info!("Using {} exporter", exporter.name());
    Ok(exporter)
}

/// Builds the configured exporter and starts a periodic flusher over
/// `registry`. Cancelling `token` triggers the final flush.
pub async fn start_pipeline(
    config: &ExportConfig,
    registry: Arc<Registry>,
    token: CancellationToken,
) -> anyhow::Result<FlusherHandle> {
    let exporter = build_exporter(config, Arc::clone(&registry), token.clone()).await?;

    let flusher = Arc::new(PeriodicFlusher::new(
        registry,
        exporter,
        FlusherConfig {
            interval: config.flush_interval,
            export_timeout: config.timeout,
        },
    ));

    Ok(flusher.start(token))
}
