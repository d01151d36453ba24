use crate::instrument::InstrumentKind;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Instrument '{name}' already registered as {existing}, cannot register as {requested}")]
    DuplicateNameConflict {
        name: String,
        existing: InstrumentKind,
        requested: InstrumentKind,
    },

    #[error("Instrument not found: {0}")]
    NotFound(String),

    #[error("Invalid delta {delta} for {kind} '{instrument}'")]
    InvalidDelta {
        instrument: String,
        kind: InstrumentKind,
        delta: f64,
    },

    #[error("Invalid value {value} for histogram '{instrument}'")]
    InvalidValue { instrument: String, value: f64 },

    #[error("Operation '{operation}' is not valid for {kind} '{instrument}'")]
    KindMismatch {
        instrument: String,
        kind: InstrumentKind,
        operation: &'static str,
    },

    #[error("Invalid instrument name '{0}'")]
    InvalidName(String),

    #[error("Invalid bucket boundaries for '{instrument}': {reason}")]
    InvalidBoundaries { instrument: String, reason: String },
}

/// Failures of a single export attempt. Never fatal to the flush loop.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Export timed out after {0:?}")]
    Timeout(Duration),

    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("Export rejected: {0}")]
    Rejected(String),

    #[error("Exporter is shut down")]
    Shutdown,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MetricsError>;
