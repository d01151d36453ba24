//! Per-instrument aggregation cells.
//!
//! Each distinct [`LabelSet`] owns one cell guarded by its own mutex, so
//! recorders touching different label combinations never contend. The cell
//! map is behind a read/write lock that is only write-locked when a new label
//! set shows up; the fast path is a shared read plus the cell's mutex.

use crate::instrument::InstrumentKind;
use crate::labels::LabelSet;
use crate::snapshot::{DataPoint, HistogramPoint, PointValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

#[derive(Debug, Clone)]
enum CellState {
    Sum(f64),
    Histogram(HistogramCell),
}

#[derive(Debug, Clone)]
struct HistogramCell {
    bucket_counts: Vec<u64>,
    sum: f64,
    count: u64,
    min: Option<f64>,
    max: Option<f64>,
}

impl HistogramCell {
    fn new(bucket_count: usize) -> Self {
        Self {
            bucket_counts: vec![0; bucket_count],
            sum: 0.0,
            count: 0,
            min: None,
            max: None,
        }
    }

    fn observe(&mut self, bucket: usize, value: f64) -> Result<(), Overflow> {
        let sum = self.sum + value;
        if !sum.is_finite() {
            return Err(Overflow);
        }
        self.bucket_counts[bucket] += 1;
        self.sum = sum;
        self.count += 1;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        Ok(())
    }
}

/// A running total or histogram sum would leave the finite range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Overflow;

type Cell = Arc<Mutex<CellState>>;

pub(crate) struct Aggregator {
    kind: InstrumentKind,
    boundaries: Arc<[f64]>,
    cells: RwLock<HashMap<LabelSet, Cell>>,
}

impl Aggregator {
    pub(crate) fn new(kind: InstrumentKind, boundaries: &[f64]) -> Self {
        Self {
            kind,
            boundaries: boundaries.into(),
            cells: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn add(&self, delta: f64, labels: &LabelSet) -> Result<(), Overflow> {
        let cell = self.cell(labels);
        let mut state = lock(&cell);
        if let CellState::Sum(total) = &mut *state {
            let next = *total + delta;
            if !next.is_finite() {
                return Err(Overflow);
            }
            *total = next;
        }
        Ok(())
    }

    pub(crate) fn record(&self, value: f64, labels: &LabelSet) -> Result<(), Overflow> {
        let bucket = self.bucket_index(value);
        let cell = self.cell(labels);
        let mut state = lock(&cell);
        match &mut *state {
            CellState::Histogram(histogram) => histogram.observe(bucket, value),
            CellState::Sum(_) => Ok(()),
        }
    }

    /// Index of the first boundary `>= value`, or the overflow bucket.
    fn bucket_index(&self, value: f64) -> usize {
        self.boundaries.partition_point(|&b| b < value)
    }

    pub(crate) fn cell_count(&self) -> usize {
        self.cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Copies every cell. Cumulative: nothing is reset.
    pub(crate) fn collect(&self) -> Vec<DataPoint> {
        let cells: Vec<(LabelSet, Cell)> = self
            .cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(labels, cell)| (labels.clone(), Arc::clone(cell)))
            .collect();

        let mut points: Vec<DataPoint> = cells
            .into_iter()
            .map(|(labels, cell)| {
                let state = lock(&cell).clone();
                DataPoint {
                    labels,
                    value: self.point_value(state),
                }
            })
            .collect();

        points.sort_by(|a, b| a.labels.cmp(&b.labels));
        points
    }

    fn point_value(&self, state: CellState) -> PointValue {
        match state {
            CellState::Sum(total) => PointValue::Sum { total },
            CellState::Histogram(h) => PointValue::Histogram(HistogramPoint {
                boundaries: self.boundaries.to_vec(),
                bucket_counts: h.bucket_counts,
                sum: h.sum,
                count: h.count,
                min: h.min,
                max: h.max,
            }),
        }
    }

    fn cell(&self, labels: &LabelSet) -> Cell {
        if let Some(cell) = self
            .cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(labels)
        {
            return Arc::clone(cell);
        }

        // Re-checked under the write lock: concurrent first recordings of the
        // same label set must end up sharing one cell.
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            cells
                .entry(labels.clone())
                .or_insert_with(|| Arc::new(Mutex::new(self.empty_state()))),
        )
    }

    fn empty_state(&self) -> CellState {
        match self.kind {
            InstrumentKind::Counter | InstrumentKind::UpDownCounter => CellState::Sum(0.0),
            InstrumentKind::Histogram => {
                CellState::Histogram(HistogramCell::new(self.boundaries.len() + 1))
            }
        }
    }
}

fn lock(cell: &Mutex<CellState>) -> MutexGuard<'_, CellState> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}
