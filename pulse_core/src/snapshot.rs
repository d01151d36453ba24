use crate::instrument::InstrumentKind;
use crate::labels::LabelSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attributes describing the process that produced a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub attributes: LabelSet,
}

impl Resource {
    pub fn new(attributes: LabelSet) -> Self {
        Self { attributes }
    }

    pub fn service(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(
            LabelSet::new()
                .with("service.name", name)
                .with("service.version", version),
        )
    }

    pub fn service_name(&self) -> Option<&str> {
        self.attributes.get("service.name")
    }
}

/// Immutable point-in-time copy of every aggregation cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub resource: Resource,
    pub metrics: Vec<MetricData>,
}

impl Snapshot {
    pub fn metric(&self, name: &str) -> Option<&MetricData> {
        self.metrics.iter().find(|m| m.name == name)
    }

    pub fn point_count(&self) -> usize {
        self.metrics.iter().map(|m| m.points.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.point_count() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricData {
    pub name: String,
    pub description: String,
    pub unit: String,
    pub kind: InstrumentKind,
    pub points: Vec<DataPoint>,
}

impl MetricData {
    pub fn point(&self, labels: &LabelSet) -> Option<&DataPoint> {
        self.points.iter().find(|p| &p.labels == labels)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub labels: LabelSet,
    pub value: PointValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointValue {
    Sum { total: f64 },
    Histogram(HistogramPoint),
}

impl PointValue {
    pub fn as_sum(&self) -> Option<f64> {
        match self {
            PointValue::Sum { total } => Some(*total),
            PointValue::Histogram(_) => None,
        }
    }

    pub fn as_histogram(&self) -> Option<&HistogramPoint> {
        match self {
            PointValue::Histogram(h) => Some(h),
            PointValue::Sum { .. } => None,
        }
    }
}

/// Cumulative distribution since instrument creation.
///
/// `bucket_counts` has one more entry than `boundaries`; the last bucket is
/// unbounded above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramPoint {
    pub boundaries: Vec<f64>,
    pub bucket_counts: Vec<u64>,
    pub sum: f64,
    pub count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl HistogramPoint {
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }

    /// Pairs each bucket count with its inclusive upper bound (`None` for +Inf).
    pub fn buckets(&self) -> impl Iterator<Item = (Option<f64>, u64)> + '_ {
        self.bucket_counts.iter().enumerate().map(|(i, count)| {
            (self.boundaries.get(i).copied(), *count)
        })
    }
}
