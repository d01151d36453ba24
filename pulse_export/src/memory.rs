use async_trait::async_trait;
use pulse_core::{ExportError, Exporter, Snapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps every exported snapshot in memory. Clones share storage.
#[derive(Clone, Default)]
pub struct InMemoryExporter {
    snapshots: Arc<RwLock<Vec<Snapshot>>>,
    shut_down: Arc<AtomicBool>,
}

impl InMemoryExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshots(&self) -> Vec<Snapshot> {
        self.snapshots.read().await.clone()
    }

    pub async fn last(&self) -> Option<Snapshot> {
        self.snapshots.read().await.last().cloned()
    }

    pub async fn clear(&self) {
        self.snapshots.write().await.clear();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Exporter for InMemoryExporter {
    async fn export(&self, snapshot: &Snapshot) -> Result<(), ExportError> {
        if self.is_shut_down() {
            return Err(ExportError::Shutdown);
        }
        self.snapshots.write().await.push(snapshot.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }

    async fn shutdown(&self) -> Result<(), ExportError> {
        self.shut_down.store(true, Ordering::Release);
        Ok(())
    }
}
