use crate::{error::ExportError, snapshot::Snapshot};
use async_trait::async_trait;
use std::sync::Arc;

/// Core trait for all export sinks
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Deliver one snapshot to the sink
    async fn export(&self, snapshot: &Snapshot) -> Result<(), ExportError>;

    /// Get the name of this exporter
    fn name(&self) -> &'static str;

    /// Release sink resources after the final flush
    async fn shutdown(&self) -> Result<(), ExportError> {
        Ok(())
    }
}

pub type DynExporter = Arc<dyn Exporter>;
