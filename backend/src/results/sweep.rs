//! Results of a one-parameter sweep
//!
//! A sweep runs a full multi-trial aggregate at every parameter value and
//! stacks them under a `(param, time)` index.

use crate::results::aggregate::{AggregateResult, SeriesKind};
use serde::{Deserialize, Serialize};

/// One parameter value and the aggregate it produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepPoint {
    pub value: f64,
    pub aggregate: AggregateResult,
}

/// One row of the long sweep table: statistics averaged over trials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub param: f64,
    pub time: usize,
    pub mean: f64,
    pub sd: f64,
    pub gini: Option<f64>,
}

/// Every point of a sweep over one named parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResult {
    pub param: String,
    pub points: Vec<SweepPoint>,
}

impl SweepResult {
    pub fn new(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            points: Vec::new(),
        }
    }

    pub fn add(&mut self, value: f64, aggregate: AggregateResult) {
        self.points.push(SweepPoint { value, aggregate });
    }

    /// Swept values in run order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Long table for one series, indexed by `(param, time)`.
    ///
    /// Points whose every trial was aborted contribute no rows.
    pub fn rows(&self, kind: SeriesKind) -> Vec<SweepRow> {
        let mut rows = Vec::new();
        for point in &self.points {
            let Some(avg) = point.aggregate.series(kind).trial_average() else {
                continue;
            };
            for time in 0..avg.len() {
                rows.push(SweepRow {
                    param: point.value,
                    time,
                    mean: avg.mean[time],
                    sd: avg.sd[time],
                    gini: avg.gini.as_ref().map(|g| g[time]),
                });
            }
        }
        rows
    }
}
