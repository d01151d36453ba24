use async_trait::async_trait;
use chrono::SecondsFormat;
use pulse_core::{ExportError, Exporter, MetricData, PointValue, Snapshot};
use pulse_workload::ConsoleFormat;
use std::fmt::Write as _;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Writes every snapshot to a stream, stdout by default.
///
/// Write failures are logged and swallowed: a broken stdout must not stop
/// the flush loop.
pub struct ConsoleExporter {
    format: ConsoleFormat,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleExporter {
    pub fn stdout(format: ConsoleFormat) -> Self {
        Self::with_writer(format, std::io::stdout())
    }

    pub fn with_writer(format: ConsoleFormat, writer: impl Write + Send + 'static) -> Self {
        Self {
            format,
            out: Mutex::new(Box::new(writer)),
        }
    }

    pub fn render(&self, snapshot: &Snapshot) -> Result<String, ExportError> {
        match self.format {
            ConsoleFormat::Text => Ok(format_text(snapshot)),
            ConsoleFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(snapshot)?)),
        }
    }
}

#[async_trait]
impl Exporter for ConsoleExporter {
    async fn export(&self, snapshot: &Snapshot) -> Result<(), ExportError> {
        let rendered = self.render(snapshot)?;

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = out
            .write_all(rendered.as_bytes())
            .and_then(|_| out.flush())
        {
            warn!("Console export write failed: {}", e);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

/// Human-readable rendering. Sum points print as `total=<n>`, histogram
/// points list one `le=<bound>: <count>` line per bucket.
pub fn format_text(snapshot: &Snapshot) -> String {
    let mut out = String::new();

    let service = snapshot.resource.service_name().unwrap_or("unknown_service");
    let version = snapshot
        .resource
        .attributes
        .get("service.version")
        .unwrap_or("-");
    let _ = writeln!(
        out,
        "--- {} {} @ {} ---",
        service,
        version,
        snapshot.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    );

    for metric in &snapshot.metrics {
        write_metric(&mut out, metric);
    }

    out
}

fn write_metric(out: &mut String, metric: &MetricData) {
    let _ = write!(out, "{} [{}", metric.name, metric.kind);
    if !metric.unit.is_empty() {
        let _ = write!(out, ", {}", metric.unit);
    }
    out.push(']');
    if !metric.description.is_empty() {
        let _ = write!(out, " {}", metric.description);
    }
    out.push('\n');

    if metric.points.is_empty() {
        out.push_str("  (no data)\n");
        return;
    }

    for point in &metric.points {
        match &point.value {
            PointValue::Sum { total } => {
                let _ = writeln!(out, "  {} total={}", point.labels, total);
            }
            PointValue::Histogram(h) => {
                let _ = write!(out, "  {} count={} sum={:.2}", point.labels, h.count, h.sum);
                if let Some(mean) = h.mean() {
                    let _ = write!(out, " mean={:.2}", mean);
                }
                if let (Some(min), Some(max)) = (h.min, h.max) {
                    let _ = write!(out, " min={:.2} max={:.2}", min, max);
                }
                out.push('\n');

                for (bound, count) in h.buckets() {
                    match bound {
                        Some(bound) => {
                            let _ = writeln!(out, "    le={}: {}", bound, count);
                        }
                        None => {
                            let _ = writeln!(out, "    le=+Inf: {}", count);
                        }
                    }
                }
            }
        }
    }
}
