use pulse_core::{
    CancellationToken, FlusherConfig, InstrumentDescriptor, LabelSet, PeriodicFlusher, Registry,
    Resource,
};
use pulse_export::{ConsoleExporter, InMemoryExporter};
use pulse_workload::ConsoleFormat;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn bucket_total(output: &str) -> u64 {
    output
        .lines()
        .filter(|line| line.trim_start().starts_with("le="))
        .filter_map(|line| line.rsplit(": ").next())
        .map(|count| count.trim().parse::<u64>().unwrap())
        .sum()
}

#[tokio::test]
async fn test_console_flush_reports_recorded_totals() {
    let registry = Arc::new(Registry::new(Resource::service("checkout", "2.1.0")));
    let requests = registry
        .register(
            InstrumentDescriptor::counter("requests_total")
                .description("Total number of requests")
                .build(),
        )
        .unwrap();
    let latency = registry
        .register(
            InstrumentDescriptor::histogram("request_duration")
                .unit("ms")
                .boundaries(vec![10.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0])
                .build(),
        )
        .unwrap();

    let get = LabelSet::from([("method", "GET")]);
    let endpoint = LabelSet::from([("endpoint", "/api/orders")]);
    for i in 0..100u32 {
        requests.add(1.0, &get).unwrap();
        latency.record(f64::from((i * 37) % 2500), &endpoint).unwrap();
    }

    let buffer = SharedBuffer::default();
    let flusher = PeriodicFlusher::new(
        Arc::clone(&registry),
        Arc::new(ConsoleExporter::with_writer(ConsoleFormat::Text, buffer.clone())),
        FlusherConfig::default(),
    );
    flusher.flush_once().await.unwrap();

    let output = buffer.contents();
    assert!(output.contains("--- checkout 2.1.0 @ "));
    assert!(output.contains("{method=\"GET\"} total=100"));
    assert!(output.contains("{endpoint=\"/api/orders\"} count=100"));
    assert_eq!(bucket_total(&output), 100);
}

#[tokio::test]
async fn test_values_are_cumulative_across_flushes() {
    let registry = Arc::new(Registry::default());
    let requests = registry
        .register(InstrumentDescriptor::counter("requests_total").build())
        .unwrap();
    let exporter = InMemoryExporter::new();
    let flusher = PeriodicFlusher::new(
        Arc::clone(&registry),
        Arc::new(exporter.clone()),
        FlusherConfig::default(),
    );

    let labels = LabelSet::from([("method", "PUT")]);
    requests.add(2.0, &labels).unwrap();
    flusher.flush_once().await.unwrap();
    requests.add(3.0, &labels).unwrap();
    flusher.flush_once().await.unwrap();

    let totals: Vec<_> = exporter
        .snapshots()
        .await
        .iter()
        .map(|s| {
            s.metric("requests_total")
                .and_then(|m| m.point(&labels))
                .and_then(|p| p.value.as_sum())
        })
        .collect();
    assert_eq!(totals, vec![Some(2.0), Some(5.0)]);
}

#[tokio::test]
async fn test_shutdown_exports_values_recorded_after_last_tick() {
    let registry = Arc::new(Registry::default());
    let cpu = registry
        .register(
            InstrumentDescriptor::up_down_counter("cpu_usage")
                .unit("%")
                .build(),
        )
        .unwrap();
    let exporter = InMemoryExporter::new();
    let flusher = Arc::new(PeriodicFlusher::new(
        Arc::clone(&registry),
        Arc::new(exporter.clone()),
        FlusherConfig {
            interval: Duration::from_secs(60),
            export_timeout: Duration::from_secs(1),
        },
    ));
    let handle = flusher.start(CancellationToken::new());

    let host = LabelSet::from([("host", "demo-host")]);
    cpu.add(42.5, &host).unwrap();
    cpu.add(-2.5, &host).unwrap();
    let stats = handle.shutdown().await.unwrap();

    assert_eq!(stats.flushes, 1);
    assert!(exporter.is_shut_down());
    let last = exporter.last().await.unwrap();
    assert_eq!(
        last.metric("cpu_usage")
            .and_then(|m| m.point(&host))
            .and_then(|p| p.value.as_sum()),
        Some(40.0)
    );
}
