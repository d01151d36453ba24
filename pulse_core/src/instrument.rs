use crate::aggregator::Aggregator;
use crate::error::{MetricsError, Result};
use crate::labels::LabelSet;
use crate::snapshot::MetricData;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_HISTOGRAM_BOUNDARIES: [f64; 15] = [
    0.0, 5.0, 10.0, 25.0, 50.0, 75.0, 100.0, 250.0, 500.0, 750.0, 1000.0, 2500.0, 5000.0,
    7500.0, 10000.0,
];

const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    Counter,
    UpDownCounter,
    Histogram,
}

impl InstrumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentKind::Counter => "counter",
            InstrumentKind::UpDownCounter => "up_down_counter",
            InstrumentKind::Histogram => "histogram",
        }
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static metadata of an instrument, fixed at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentDescriptor {
    pub name: String,
    pub kind: InstrumentKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub unit: String,
    /// Histogram bucket upper bounds. Empty for sum instruments.
    #[serde(default)]
    pub boundaries: Vec<f64>,
}

impl InstrumentDescriptor {
    pub fn counter(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(name, InstrumentKind::Counter)
    }

    pub fn up_down_counter(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(name, InstrumentKind::UpDownCounter)
    }

    pub fn histogram(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(name, InstrumentKind::Histogram)
    }

    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;

        match self.kind {
            InstrumentKind::Histogram => validate_boundaries(&self.name, &self.boundaries),
            InstrumentKind::Counter | InstrumentKind::UpDownCounter => {
                if self.boundaries.is_empty() {
                    Ok(())
                } else {
                    Err(MetricsError::InvalidBoundaries {
                        instrument: self.name.clone(),
                        reason: format!("{} instruments take no boundaries", self.kind),
                    })
                }
            }
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name.starts_with(|c: char| c.is_ascii_alphabetic())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '/'));

    if valid {
        Ok(())
    } else {
        Err(MetricsError::InvalidName(name.to_string()))
    }
}

fn validate_boundaries(name: &str, boundaries: &[f64]) -> Result<()> {
    let invalid = |reason: &str| MetricsError::InvalidBoundaries {
        instrument: name.to_string(),
        reason: reason.to_string(),
    };

    if boundaries.is_empty() {
        return Err(invalid("at least one boundary is required"));
    }
    if boundaries.iter().any(|b| !b.is_finite()) {
        return Err(invalid("boundaries must be finite"));
    }
    if boundaries.windows(2).any(|w| w[0] >= w[1]) {
        return Err(invalid("boundaries must be strictly increasing"));
    }
    Ok(())
}

pub struct DescriptorBuilder {
    name: String,
    kind: InstrumentKind,
    description: String,
    unit: String,
    boundaries: Option<Vec<f64>>,
}

impl DescriptorBuilder {
    fn new(name: impl Into<String>, kind: InstrumentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
            unit: String::new(),
            boundaries: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn boundaries(mut self, boundaries: impl Into<Vec<f64>>) -> Self {
        self.boundaries = Some(boundaries.into());
        self
    }

    pub fn build(self) -> InstrumentDescriptor {
        let boundaries = match (self.kind, self.boundaries) {
            (_, Some(boundaries)) => boundaries,
            (InstrumentKind::Histogram, None) => DEFAULT_HISTOGRAM_BOUNDARIES.to_vec(),
            (_, None) => Vec::new(),
        };

        InstrumentDescriptor {
            name: self.name,
            kind: self.kind,
            description: self.description,
            unit: self.unit,
            boundaries,
        }
    }
}

pub(crate) struct Instrument {
    descriptor: InstrumentDescriptor,
    aggregator: Aggregator,
}

/// Cheap, cloneable reference to a registered instrument.
///
/// Recording goes straight to the instrument's aggregator and never touches
/// the registry. Two handles are equal when they point at the same instrument.
#[derive(Clone)]
pub struct InstrumentHandle(Arc<Instrument>);

impl InstrumentHandle {
    pub(crate) fn new(descriptor: InstrumentDescriptor) -> Self {
        let aggregator = Aggregator::new(descriptor.kind, &descriptor.boundaries);
        Self(Arc::new(Instrument {
            descriptor,
            aggregator,
        }))
    }

    pub fn descriptor(&self) -> &InstrumentDescriptor {
        &self.0.descriptor
    }

    pub fn name(&self) -> &str {
        &self.0.descriptor.name
    }

    pub fn kind(&self) -> InstrumentKind {
        self.0.descriptor.kind
    }

    /// Adds `delta` to the running total for `labels`.
    ///
    /// Counters only accept non-negative, finite deltas; up-down counters
    /// accept any finite delta. A delta that would push the total out of the
    /// finite range is rejected too. On error the cell is left untouched.
    pub fn add(&self, delta: f64, labels: &LabelSet) -> Result<()> {
        let kind = self.kind();
        match kind {
            InstrumentKind::Histogram => {
                return Err(MetricsError::KindMismatch {
                    instrument: self.name().to_string(),
                    kind,
                    operation: "add",
                })
            }
            InstrumentKind::Counter if delta < 0.0 || !delta.is_finite() => {
                return Err(self.invalid_delta(delta))
            }
            InstrumentKind::UpDownCounter if !delta.is_finite() => {
                return Err(self.invalid_delta(delta))
            }
            _ => {}
        }

        self.0
            .aggregator
            .add(delta, labels)
            .map_err(|_| self.invalid_delta(delta))
    }

    /// Records one observation into the histogram cell for `labels`.
    pub fn record(&self, value: f64, labels: &LabelSet) -> Result<()> {
        let kind = self.kind();
        if kind != InstrumentKind::Histogram {
            return Err(MetricsError::KindMismatch {
                instrument: self.name().to_string(),
                kind,
                operation: "record",
            });
        }
        if !value.is_finite() {
            return Err(MetricsError::InvalidValue {
                instrument: self.name().to_string(),
                value,
            });
        }

        self.0
            .aggregator
            .record(value, labels)
            .map_err(|_| MetricsError::InvalidValue {
                instrument: self.name().to_string(),
                value,
            })
    }

    /// Number of distinct label sets seen so far.
    pub fn cell_count(&self) -> usize {
        self.0.aggregator.cell_count()
    }

    pub(crate) fn collect(&self) -> MetricData {
        let descriptor = self.descriptor();
        MetricData {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            unit: descriptor.unit.clone(),
            kind: descriptor.kind,
            points: self.0.aggregator.collect(),
        }
    }

    fn invalid_delta(&self, delta: f64) -> MetricsError {
        MetricsError::InvalidDelta {
            instrument: self.name().to_string(),
            kind: self.kind(),
            delta,
        }
    }
}

impl PartialEq for InstrumentHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for InstrumentHandle {}

impl fmt::Debug for InstrumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentHandle")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("cells", &self.cell_count())
            .finish()
    }
}
