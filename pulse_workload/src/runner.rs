use crate::{
    config::{humantime_serde, WorkloadConfig},
    sampler::{Sample, Sampler},
};
use pulse_core::{CancellationToken, InstrumentDescriptor, InstrumentHandle, LabelSet, Registry};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const REQUEST_DURATION_BOUNDARIES: [f64; 7] =
    [10.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0];

/// The three instruments driven by the demo workload.
#[derive(Debug, Clone)]
pub struct DemoInstruments {
    pub requests: InstrumentHandle,
    pub cpu_usage: InstrumentHandle,
    pub request_duration: InstrumentHandle,
}

impl DemoInstruments {
    pub fn register(registry: &Registry) -> pulse_core::Result<Self> {
        let requests = registry.register(
            InstrumentDescriptor::counter("requests_total")
                .description("Total number of requests")
                .build(),
        )?;

        // Up-down counter standing in for a gauge: reports the running sum.
        let cpu_usage = registry.register(
            InstrumentDescriptor::up_down_counter("cpu_usage")
                .description("Current CPU usage percentage")
                .unit("%")
                .build(),
        )?;

        let request_duration = registry.register(
            InstrumentDescriptor::histogram("request_duration")
                .description("Request duration in milliseconds")
                .unit("ms")
                .boundaries(REQUEST_DURATION_BOUNDARIES.to_vec())
                .build(),
        )?;

        Ok(Self {
            requests,
            cpu_usage,
            request_duration,
        })
    }

    /// Records one sample into all three instruments. Returns how many
    /// recordings were rejected.
    pub fn record(&self, sample: &Sample) -> usize {
        let results = [
            self.requests.add(
                1.0,
                &LabelSet::from([("method", sample.method), ("status", sample.status)]),
            ),
            self.cpu_usage
                .add(sample.cpu_usage, &LabelSet::from([("host", "demo-host")])),
            self.request_duration.record(
                sample.duration_ms,
                &LabelSet::from([("endpoint", sample.endpoint)]),
            ),
        ];

        results
            .into_iter()
            .filter_map(Result::err)
            .inspect(|e| warn!("Recording rejected: {}", e))
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct IterationReport {
    pub iteration: u64,
    pub sample: Sample,
}

pub struct WorkloadRunner {
    instruments: DemoInstruments,
}

impl WorkloadRunner {
    pub fn new(instruments: DemoInstruments) -> Self {
        Self { instruments }
    }

    /// Emits `config.iterations` synthetic events, `config.interval` apart,
    /// stopping early when `token` is cancelled.
    pub async fn run<F>(
        &self,
        config: &WorkloadConfig,
        token: CancellationToken,
        mut on_iteration: F,
    ) -> WorkloadResult
    where
        F: FnMut(&IterationReport),
    {
        info!(
            "Starting workload: {} iterations every {:?}",
            config.iterations, config.interval
        );

        let start_time = Instant::now();
        let mut sampler = Sampler::new(config.seed);
        let mut completed = 0;
        let mut recording_errors = 0;
        let mut cancelled = false;

        for iteration in 1..=config.iterations {
            if token.is_cancelled() {
                cancelled = true;
                break;
            }

            let sample = sampler.next_sample();
            recording_errors += self.instruments.record(&sample);
            completed = iteration;

            debug!("Iteration {} recorded: {:?}", iteration, sample);
            on_iteration(&IterationReport { iteration, sample });

            if iteration == config.iterations {
                break;
            }

            tokio::select! {
                _ = token.cancelled() => {
                    cancelled = true;
                    break;
                }
                _ = tokio::time::sleep(config.interval) => {}
            }
        }

        let total_duration = start_time.elapsed();
        if cancelled {
            info!(
                "Workload cancelled after {} of {} iterations",
                completed, config.iterations
            );
        } else {
            info!("Workload completed in {:?}", total_duration);
        }

        WorkloadResult {
            iterations_planned: config.iterations,
            iterations_completed: completed,
            recording_errors,
            cancelled,
            total_duration,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadResult {
    pub iterations_planned: u64,
    pub iterations_completed: u64,
    pub recording_errors: usize,
    pub cancelled: bool,
    #[serde(with = "humantime_serde")]
    pub total_duration: Duration,
}

impl WorkloadResult {
    pub fn completion_rate(&self) -> f64 {
        if self.iterations_planned == 0 {
            return 0.0;
        }
        self.iterations_completed as f64 / self.iterations_planned as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::Snapshot;

    fn runner() -> (Registry, WorkloadRunner) {
        let registry = Registry::default();
        let instruments = DemoInstruments::register(&registry).unwrap();
        (registry, WorkloadRunner::new(instruments))
    }

    fn config(iterations: u64) -> WorkloadConfig {
        WorkloadConfig {
            iterations,
            interval: Duration::from_secs(2),
            seed: Some(7),
        }
    }

    fn request_total(snapshot: &Snapshot) -> f64 {
        snapshot
            .metric("requests_total")
            .unwrap()
            .points
            .iter()
            .filter_map(|p| p.value.as_sum())
            .sum()
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = Registry::default();
        let first = DemoInstruments::register(&registry).unwrap();
        let second = DemoInstruments::register(&registry).unwrap();

        assert_eq!(first.requests, second.requests);
        assert_eq!(registry.list(), ["requests_total", "cpu_usage", "request_duration"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_all_iterations() {
        let (registry, runner) = runner();
        let mut seen = Vec::new();

        let result = runner
            .run(&config(5), CancellationToken::new(), |report| {
                seen.push(report.iteration)
            })
            .await;

        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        assert_eq!(result.iterations_completed, 5);
        assert_eq!(result.recording_errors, 0);
        assert!(!result.cancelled);
        assert!(result.total_duration >= Duration::from_secs(8));

        let snapshot = registry.collect();
        assert_eq!(request_total(&snapshot), 5.0);
        let durations = snapshot.metric("request_duration").unwrap();
        let observed: u64 = durations
            .points
            .iter()
            .filter_map(|p| p.value.as_histogram())
            .map(|h| h.count)
            .sum();
        assert_eq!(observed, 5);
        let cpu = snapshot.metric("cpu_usage").unwrap();
        assert_eq!(cpu.points.len(), 1);
        assert_eq!(cpu.points[0].labels.get("host"), Some("demo-host"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_between_iterations() {
        let (registry, runner) = runner();
        let token = CancellationToken::new();

        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            cancel.cancel();
        });

        let result = runner.run(&config(100), token, |_| {}).await;

        assert!(result.cancelled);
        assert_eq!(result.iterations_completed, 2);
        assert_eq!(request_total(&registry.collect()), 2.0);
    }

    #[tokio::test]
    async fn test_already_cancelled_records_nothing() {
        let (registry, runner) = runner();
        let token = CancellationToken::new();
        token.cancel();

        let result = runner.run(&config(10), token, |_| {}).await;

        assert!(result.cancelled);
        assert_eq!(result.iterations_completed, 0);
        assert!(registry.collect().is_empty());
    }

    #[test]
    fn test_workload_result() {
        let result = WorkloadResult {
            iterations_planned: 100,
            iterations_completed: 25,
            recording_errors: 0,
            cancelled: true,
            total_duration: Duration::from_secs(50),
        };

        assert_eq!(result.completion_rate(), 0.25);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["total_duration"], "50s");
    }
}
