use pulse_core::Snapshot;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{info, Level};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub uptime_seconds: u64,
    pub snapshots_received: u64,
}

impl HealthStatus {
    pub fn healthy(uptime_seconds: u64, snapshots_received: u64) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now(),
            uptime_seconds,
            snapshots_received,
        }
    }
}

/// One-line digest of a received snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub service: String,
    pub metrics: usize,
    pub points: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<&Snapshot> for SnapshotSummary {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            service: snapshot
                .resource
                .service_name()
                .unwrap_or("unknown_service")
                .to_string(),
            metrics: snapshot.metrics.len(),
            points: snapshot.point_count(),
            timestamp: snapshot.timestamp,
        }
    }
}

/// State shared by every connection of a collector.
#[derive(Clone)]
pub struct CollectorState {
    start_time: Instant,
    received: Arc<AtomicU64>,
    latest: Arc<RwLock<Option<Snapshot>>>,
}

impl Default for CollectorState {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            received: Arc::default(),
            latest: Arc::default(),
        }
    }
}

impl CollectorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `snapshot` as the latest one and logs its summary.
    pub async fn accept(&self, snapshot: Snapshot, source: &str) -> SnapshotSummary {
        let summary = SnapshotSummary::from(&snapshot);
        let count = self.received.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            "#{} from {}: {} metrics, {} points for '{}' @ {}",
            count, source, summary.metrics, summary.points, summary.service, summary.timestamp
        );
        *self.latest.write().await = Some(snapshot);
        summary
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub async fn latest(&self) -> Option<Snapshot> {
        self.latest.read().await.clone()
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus::healthy(self.start_time.elapsed().as_secs(), self.received())
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();
}

/// Listen address from `var`, falling back to `default`.
pub fn listen_addr(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}
