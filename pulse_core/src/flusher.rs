use crate::{
    error::ExportError,
    exporter::DynExporter,
    registry::Registry,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlusherState {
    Idle,
    Ticking,
    Flushing,
    Stopped,
}

#[derive(Debug, Clone, Copy)]
pub struct FlusherConfig {
    pub interval: Duration,
    /// Upper bound on a single export call.
    pub export_timeout: Duration,
}

impl Default for FlusherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            export_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushStats {
    /// Export attempts, successful or not.
    pub flushes: u64,
    pub failures: u64,
}

/// Snapshots the registry on a fixed interval and hands each snapshot to one
/// exporter. Counters and histograms are never reset, so every export carries
/// cumulative values.
pub struct PeriodicFlusher {
    registry: Arc<Registry>,
    exporter: DynExporter,
    config: FlusherConfig,
    state: watch::Sender<FlusherState>,
    flush_lock: Mutex<()>,
    flushes: AtomicU64,
    failures: AtomicU64,
}

impl PeriodicFlusher {
    pub fn new(registry: Arc<Registry>, exporter: DynExporter, config: FlusherConfig) -> Self {
        let (state, _) = watch::channel(FlusherState::Idle);
        Self {
            registry,
            exporter,
            config,
            state,
            flush_lock: Mutex::new(()),
            flushes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FlusherState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> FlusherState {
        *self.state.borrow()
    }

    pub fn stats(&self) -> FlushStats {
        FlushStats {
            flushes: self.flushes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    /// Collects a snapshot and exports it, bounded by the export timeout.
    ///
    /// Concurrent callers are serialized; two exports never overlap.
    pub async fn flush_once(&self) -> Result<(), ExportError> {
        let _guard = self.flush_lock.lock().await;
        self.set_state(FlusherState::Flushing);

        let snapshot = self.registry.collect();
        debug!(
            "Flushing {} points to '{}' exporter",
            snapshot.point_count(),
            self.exporter.name()
        );

        self.flushes.fetch_add(1, Ordering::Relaxed);
        let result = match tokio::time::timeout(
            self.config.export_timeout,
            self.exporter.export(&snapshot),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ExportError::Timeout(self.config.export_timeout)),
        };

        if result.is_err() {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }

        self.set_state(FlusherState::Idle);
        result
    }

    /// Starts the background loop. The loop runs until `token` is cancelled,
    /// then performs one final flush and shuts the exporter down.
    pub fn start(self: Arc<Self>, token: CancellationToken) -> FlusherHandle {
        let join = tokio::spawn(self.run(token.clone()));
        FlusherHandle { token, join }
    }

    async fn run(self: Arc<Self>, token: CancellationToken) -> FlushStats {
        let period = self.config.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Periodic flush every {:?} via '{}' exporter",
            period,
            self.exporter.name()
        );

        loop {
            self.set_state(FlusherState::Idle);

            tokio::select! {
                biased;

                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    self.set_state(FlusherState::Ticking);
                    if let Err(e) = self.flush_once().await {
                        warn!("Export via '{}' failed: {}", self.exporter.name(), e);
                    }
                }
            }
        }

        info!("Shutdown requested, performing final flush");
        if let Err(e) = self.flush_once().await {
            warn!("Final export via '{}' failed: {}", self.exporter.name(), e);
        }
        if let Err(e) = self.exporter.shutdown().await {
            warn!("Exporter '{}' shutdown failed: {}", self.exporter.name(), e);
        }

        self.set_state(FlusherState::Stopped);
        let stats = self.stats();
        info!(
            "Flusher stopped after {} flushes ({} failed)",
            stats.flushes, stats.failures
        );
        stats
    }

    fn set_state(&self, state: FlusherState) {
        if *self.state.borrow() != FlusherState::Stopped {
            self.state.send_replace(state);
        }
    }
}

/// Owner of a running flush loop.
pub struct FlusherHandle {
    token: CancellationToken,
    join: JoinHandle<FlushStats>,
}

impl FlusherHandle {
    /// Signals shutdown and waits for the final flush to complete.
    pub async fn shutdown(self) -> Result<FlushStats, JoinError> {
        self.token.cancel();
        self.join.await
    }
}
