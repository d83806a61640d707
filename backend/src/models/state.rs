//! Per-trial simulation state
//!
//! One `TrialState` is allocated per trial and threaded through the
//! mechanisms by the engine. Nothing in it survives into the next trial.
//!
//! # Critical Invariants
//!
//! 1. **Shape**: every series is `N_TIMESTEPS × N_FAMILIES`
//! 2. **Population Conservation**: each population row sums to `N_FAMILIES`
//! 3. **Dense Ids**: each assignment row uses exactly `0..hood_count`

use crate::models::series::Series;

/// Complete mutable state of one trial
#[derive(Debug, Clone)]
pub struct TrialState {
    /// Post-tax income per generation and family
    pub income: Series<f64>,

    /// MA(1) innovation carried into the next generation
    pub noise: Vec<f64>,

    /// Human capital available to each family as of generation t
    pub capital: Series<f64>,

    /// Neighborhood id per generation and family
    pub hood: Series<usize>,

    /// Families per neighborhood, zero-padded to `N_FAMILIES` slots
    pub pop: Series<usize>,

    /// Neighborhoods in use after the latest census
    pub hood_count: usize,
}

impl TrialState {
    /// Allocate zeroed buffers for a trial.
    ///
    /// # Example
    /// ```
    /// use mobility_simulator_core_rs::TrialState;
    ///
    /// let state = TrialState::new(10, 4);
    /// assert_eq!(state.income.rows(), 10);
    /// assert_eq!(state.noise.len(), 4);
    /// assert_eq!(state.hood_count, 0);
    /// ```
    pub fn new(n_timesteps: usize, n_families: usize) -> Self {
        Self {
            income: Series::zeros(n_timesteps, n_families),
            noise: vec![0.0; n_families],
            capital: Series::zeros(n_timesteps, n_families),
            hood: Series::zeros(n_timesteps, n_families),
            pop: Series::zeros(n_timesteps, n_families),
            hood_count: 0,
        }
    }

    /// Number of families tracked
    pub fn num_families(&self) -> usize {
        self.noise.len()
    }

    /// Number of generations allocated
    pub fn num_timesteps(&self) -> usize {
        self.income.rows()
    }
}
