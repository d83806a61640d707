//! Completed trials and the sink that receives them

use crate::models::diagnostics::InstabilityReport;
use crate::models::series::Series;
use serde::{Deserialize, Serialize};

/// The four time series of one finished trial
///
/// All matrices are `N_TIMESTEPS × N_FAMILIES`. The population matrix only
/// uses its first `hood_count` columns at each generation; the rest are zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    /// Position of this trial within its run
    pub trial: usize,

    /// Fingerprint of the configuration that produced it
    pub config_fingerprint: String,

    pub income: Series<f64>,
    pub human_capital: Series<f64>,
    pub neighborhood: Series<usize>,
    pub neighborhood_size: Series<usize>,

    /// Instabilities detected and tolerated while running
    pub diagnostics: Vec<InstabilityReport>,
}

impl TrialResult {
    /// Whether any transition produced a non-finite value
    pub fn is_unstable(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// A trial dropped under the abort-trial instability policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialFailure {
    pub trial: usize,
    pub report: InstabilityReport,
}

/// Receiver for finished trials
///
/// The engine hands every completed trial to a sink and keeps nothing.
pub trait TrialSink {
    /// Take ownership of a completed trial.
    fn accept(&mut self, trial: TrialResult);

    /// Record a trial that was aborted. Ignored by default.
    fn reject(&mut self, _failure: TrialFailure) {}
}

impl TrialSink for Vec<TrialResult> {
    fn accept(&mut self, trial: TrialResult) {
        self.push(trial);
    }
}
