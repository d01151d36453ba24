//! Minimal receivers for the push exporters, used for local runs.

pub mod common;
pub mod http;
pub mod stream;

pub use common::{CollectorState, HealthStatus, SnapshotSummary};
