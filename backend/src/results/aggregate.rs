//! Per-trial reduction and accumulation across trials
//!
//! Each tracked series is reduced per trial to one column per statistic
//! (`mean`, `sd`, and `gini` for income and capital), one value per
//! generation. Trials are kept side by side, never pooled.

use crate::models::{Series, TrialFailure, TrialResult, TrialSink};
use crate::results::stats::{gini, mean, sample_std};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Series the aggregator tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesKind {
    Income,
    HumanCapital,
    NeighborhoodSize,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 3] = [
        SeriesKind::Income,
        SeriesKind::HumanCapital,
        SeriesKind::NeighborhoodSize,
    ];

    /// Whether a Gini column is produced for this series
    pub fn tracks_gini(&self) -> bool {
        matches!(self, SeriesKind::Income | SeriesKind::HumanCapital)
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeriesKind::Income => "Income",
            SeriesKind::HumanCapital => "Capital",
            SeriesKind::NeighborhoodSize => "Neighborhood Size",
        };
        f.write_str(name)
    }
}

/// Per-generation statistic columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub mean: Vec<f64>,
    pub sd: Vec<f64>,
    pub gini: Option<Vec<f64>>,
}

impl SeriesStats {
    /// Reduce every row of `series` across families.
    pub fn from_series(kind: SeriesKind, series: &Series<f64>) -> Self {
        let mean_col = series.iter_rows().map(mean).collect();
        let sd_col = series.iter_rows().map(sample_std).collect();
        let gini_col = kind
            .tracks_gini()
            .then(|| series.iter_rows().map(gini).collect());

        Self {
            mean: mean_col,
            sd: sd_col,
            gini: gini_col,
        }
    }

    /// Number of generations covered
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

/// Statistic columns of one trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialStats {
    pub trial: usize,
    #[serde(flatten)]
    pub stats: SeriesStats,
}

/// A named column of the wide aggregate table
#[derive(Debug, Clone, PartialEq)]
pub struct Column<'a> {
    pub name: String,
    pub values: &'a [f64],
}

/// All trials' statistics for one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesAggregate {
    pub kind: SeriesKind,
    pub trials: Vec<TrialStats>,
}

impl SeriesAggregate {
    pub fn new(kind: SeriesKind) -> Self {
        Self {
            kind,
            trials: Vec::new(),
        }
    }

    /// Reduce one trial's series and append its columns.
    pub fn add(&mut self, trial: usize, series: &Series<f64>) {
        self.trials.push(TrialStats {
            trial,
            stats: SeriesStats::from_series(self.kind, series),
        });
    }

    pub fn ntrials(&self) -> usize {
        self.trials.len()
    }

    /// Generations per column (0 when empty)
    pub fn timesteps(&self) -> usize {
        self.trials.first().map_or(0, |t| t.stats.len())
    }

    /// Wide table view: `mean_<trial>`, `sd_<trial>`, `gini_<trial>` per trial.
    pub fn columns(&self) -> Vec<Column<'_>> {
        let mut columns = Vec::new();
        for t in &self.trials {
            columns.push(Column {
                name: format!("mean_{}", t.trial),
                values: &t.stats.mean,
            });
            columns.push(Column {
                name: format!("sd_{}", t.trial),
                values: &t.stats.sd,
            });
            if let Some(g) = &t.stats.gini {
                columns.push(Column {
                    name: format!("gini_{}", t.trial),
                    values: g,
                });
            }
        }
        columns
    }

    /// Each statistic averaged over trials, per generation.
    ///
    /// Returns `None` when no trial has been added.
    pub fn trial_average(&self) -> Option<SeriesStats> {
        let n = self.trials.len();
        if n == 0 {
            return None;
        }
        let steps = self.timesteps();

        let gini = if self.trials.iter().all(|t| t.stats.gini.is_some()) {
            Some(average_columns(
                self.trials.iter().filter_map(|t| t.stats.gini.as_deref()),
                steps,
                n,
            ))
        } else {
            None
        };

        Some(SeriesStats {
            mean: average_columns(self.trials.iter().map(|t| t.stats.mean.as_slice()), steps, n),
            sd: average_columns(self.trials.iter().map(|t| t.stats.sd.as_slice()), steps, n),
            gini,
        })
    }
}

fn average_columns<'a>(columns: impl Iterator<Item = &'a [f64]>, steps: usize, n: usize) -> Vec<f64> {
    let mut acc = vec![0.0; steps];
    for col in columns {
        for (a, v) in acc.iter_mut().zip(col) {
            *a += v;
        }
    }
    acc.into_iter().map(|a| a / n as f64).collect()
}

/// Aggregate of every trial in one run
///
/// Implements [`TrialSink`], so the orchestrator can stream trials into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    pub config_fingerprint: String,
    pub income: SeriesAggregate,
    pub human_capital: SeriesAggregate,
    pub neighborhood_size: SeriesAggregate,

    /// Complete trials, only when `keep_trials` is set
    pub trial_data: Vec<TrialResult>,

    /// Trials dropped under the abort-trial policy
    pub failures: Vec<TrialFailure>,

    keep_trials: bool,
}

impl AggregateResult {
    pub fn new(config_fingerprint: String, keep_trials: bool) -> Self {
        Self {
            config_fingerprint,
            income: SeriesAggregate::new(SeriesKind::Income),
            human_capital: SeriesAggregate::new(SeriesKind::HumanCapital),
            neighborhood_size: SeriesAggregate::new(SeriesKind::NeighborhoodSize),
            trial_data: Vec::new(),
            failures: Vec::new(),
            keep_trials,
        }
    }

    /// Reduce one trial into every tracked series.
    pub fn add(&mut self, trial: &TrialResult) {
        self.income.add(trial.trial, &trial.income);
        self.human_capital.add(trial.trial, &trial.human_capital);
        self.neighborhood_size
            .add(trial.trial, &trial.neighborhood_size.to_f64());
    }

    /// Trials reduced so far
    pub fn ntrials(&self) -> usize {
        self.income.ntrials()
    }

    pub fn keeps_trials(&self) -> bool {
        self.keep_trials
    }

    pub fn series(&self, kind: SeriesKind) -> &SeriesAggregate {
        match kind {
            SeriesKind::Income => &self.income,
            SeriesKind::HumanCapital => &self.human_capital,
            SeriesKind::NeighborhoodSize => &self.neighborhood_size,
        }
    }
}

impl TrialSink for AggregateResult {
    fn accept(&mut self, trial: TrialResult) {
        self.add(&trial);
        if self.keep_trials {
            self.trial_data.push(trial);
        }
    }

    fn reject(&mut self, failure: TrialFailure) {
        self.failures.push(failure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(rows: Vec<Vec<f64>>) -> Series<f64> {
        Series::from_rows(rows).unwrap()
    }

    #[test]
    fn test_neighborhood_size_has_no_gini() {
        let stats = SeriesStats::from_series(
            SeriesKind::NeighborhoodSize,
            &series(vec![vec![2.0, 2.0, 0.0, 0.0]]),
        );
        assert!(stats.gini.is_none());
        assert_eq!(stats.mean, vec![1.0]);
    }

    #[test]
    fn test_columns_named_by_trial() {
        let mut agg = SeriesAggregate::new(SeriesKind::Income);
        agg.add(0, &series(vec![vec![1.0, 3.0]]));
        agg.add(1, &series(vec![vec![2.0, 2.0]]));

        let names: Vec<String> = agg.columns().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["mean_0", "sd_0", "gini_0", "mean_1", "sd_1", "gini_1"]);
    }

    #[test]
    fn test_trial_average() {
        let mut agg = SeriesAggregate::new(SeriesKind::Income);
        agg.add(0, &series(vec![vec![1.0, 1.0], vec![2.0, 2.0]]));
        agg.add(1, &series(vec![vec![3.0, 3.0], vec![4.0, 4.0]]));

        let avg = agg.trial_average().unwrap();
        assert_eq!(avg.mean, vec![2.0, 3.0]);
        assert_eq!(avg.sd, vec![0.0, 0.0]);
        assert_eq!(avg.gini, Some(vec![0.0, 0.0]));
    }

    #[test]
    fn test_empty_aggregate_has_no_average() {
        assert!(SeriesAggregate::new(SeriesKind::Income).trial_average().is_none());
    }
}
