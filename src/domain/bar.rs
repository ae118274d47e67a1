//! OHLCV bar representation.

use chrono::NaiveDateTime;

/// One sampled time point of the canonical ingestion schema.
///
/// A `Bar` only exists once its timestamp parsed; rows with unparseable
/// times are dropped during ingestion and never reach this type.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Ordered sequence of [`Bar`] forming one ingested input.
///
/// Insertion order is file row order; the series is never re-sorted.
/// Built once per ingestion call and discarded after the execution
/// engine consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
