//! Prometheus text exposition format.
//!
//! Renders a snapshot for scraping by a Prometheus server or compatible
//! agent. Counters map to `counter`, up-down counters to `gauge`, and
//! histograms to cumulative `_bucket`/`_sum`/`_count` series.

use pulse_core::{InstrumentKind, LabelSet, PointValue, Snapshot};
use std::fmt::Write;

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub fn render_prometheus(snapshot: &Snapshot) -> String {
    let mut out = String::new();

    for metric in &snapshot.metrics {
        let name = sanitize(&metric.name);
        let kind = match metric.kind {
            InstrumentKind::Counter => "counter",
            InstrumentKind::UpDownCounter => "gauge",
            InstrumentKind::Histogram => "histogram",
        };

        if !metric.description.is_empty() {
            let _ = writeln!(out, "# HELP {} {}", name, metric.description.replace('\n', " "));
        }
        let _ = writeln!(out, "# TYPE {} {}", name, kind);

        for point in &metric.points {
            match &point.value {
                PointValue::Sum { total } => {
                    let _ = writeln!(out, "{}{} {}", name, labels(&point.labels, None), total);
                }
                PointValue::Histogram(h) => {
                    let mut cumulative = 0;
                    for (bound, count) in h.buckets() {
                        cumulative += count;
                        let le = bound.map_or_else(|| "+Inf".to_string(), |b| b.to_string());
                        let _ = writeln!(
                            out,
                            "{}_bucket{} {}",
                            name,
                            labels(&point.labels, Some(le.as_str())),
                            cumulative
                        );
                    }
                    let _ = writeln!(out, "{}_sum{} {}", name, labels(&point.labels, None), h.sum);
                    let _ = writeln!(
                        out,
                        "{}_count{} {}",
                        name,
                        labels(&point.labels, None),
                        h.count
                    );
                }
            }
        }
    }

    out
}

fn labels(labels: &LabelSet, le: Option<&str>) -> String {
    let mut pairs: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", sanitize(k), escape(v)))
        .collect();
    if let Some(le) = le {
        pairs.push(format!("le=\"{}\"", le));
    }

    if pairs.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", pairs.join(","))
    }
}

/// Maps characters outside `[a-zA-Z0-9_:]` to `_`.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == ':' { c } else { '_' })
        .collect()
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{InstrumentDescriptor, Registry};

    fn snapshot() -> Snapshot {
        let registry = Registry::default();
        let counter = registry
            .register(
                InstrumentDescriptor::counter("requests_total")
                    .description("Total number of requests")
                    .build(),
            )
            .unwrap();
        let gauge = registry
            .register(InstrumentDescriptor::up_down_counter("cpu.usage").build())
            .unwrap();
        let histogram = registry
            .register(
                InstrumentDescriptor::histogram("request_duration")
                    .boundaries(vec![10.0, 50.0])
                    .build(),
            )
            .unwrap();

        counter
            .add(100.0, &LabelSet::from([("method", "GET"), ("status", "200")]))
            .unwrap();
        gauge.add(12.5, &LabelSet::new()).unwrap();
        for v in [1.0, 10.0, 30.0, 90.0] {
            histogram
                .record(v, &LabelSet::from([("endpoint", "/api/users")]))
                .unwrap();
        }

        registry.collect()
    }

    #[test]
    fn render_counter_and_gauge() {
        let output = render_prometheus(&snapshot());

        assert!(output.contains("# HELP requests_total Total number of requests\n"));
        assert!(output.contains("# TYPE requests_total counter\n"));
        assert!(output.contains("requests_total{method=\"GET\",status=\"200\"} 100\n"));
        assert!(output.contains("# TYPE cpu_usage gauge\n"));
        assert!(output.contains("cpu_usage 12.5\n"));
    }

    #[test]
    fn render_histogram_buckets_are_cumulative() {
        let output = render_prometheus(&snapshot());

        assert!(output.contains("request_duration_bucket{endpoint=\"/api/users\",le=\"10\"} 2\n"));
        assert!(output.contains("request_duration_bucket{endpoint=\"/api/users\",le=\"50\"} 3\n"));
        assert!(output.contains("request_duration_bucket{endpoint=\"/api/users\",le=\"+Inf\"} 4\n"));
        assert!(output.contains("request_duration_sum{endpoint=\"/api/users\"} 131\n"));
        assert!(output.contains("request_duration_count{endpoint=\"/api/users\"} 4\n"));
    }

    #[test]
    fn render_format_is_prometheus_compatible() {
        let output = render_prometheus(&snapshot());

        // Every sample line: name[{labels}] value
        for line in output.lines() {
            if line.starts_with('#') {
                continue;
            }
            let (series, value) = line.rsplit_once(' ').unwrap();
            assert!(value.parse::<f64>().is_ok(), "bad value in: {line}");
            assert!(!series.contains('.'), "unsanitized name in: {line}");
        }
    }

    #[test]
    fn render_empty() {
        let output = render_prometheus(&Registry::default().collect());
        assert!(output.is_empty());
    }
}
