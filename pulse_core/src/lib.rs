mod aggregator;
pub mod error;
pub mod exporter;
pub mod flusher;
pub mod instrument;
pub mod labels;
pub mod registry;
pub mod snapshot;

pub use error::{ExportError, MetricsError, Result};
pub use exporter::{DynExporter, Exporter};
pub use flusher::{FlushStats, FlusherConfig, FlusherHandle, FlusherState, PeriodicFlusher};
pub use instrument::{InstrumentDescriptor, InstrumentHandle, InstrumentKind};
pub use labels::LabelSet;
pub use registry::Registry;
pub use snapshot::{DataPoint, HistogramPoint, MetricData, PointValue, Resource, Snapshot};

// Re-export commonly used types
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
