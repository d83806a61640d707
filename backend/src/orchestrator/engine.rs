//! Orchestrator Engine
//!
//! Sequences the mechanisms over generations and trials:
//! - Trial initialization (generation 0)
//! - Income transition (earned income + MA(1) noise)
//! - Neighborhood assignment and census
//! - Taxation and revenue pooling
//! - Human-capital formation
//! - Instability detection and policy
//!
//! # Architecture
//!
//! ```text
//! Generation 0: income = 1, capital = 1, noise = 0, first half in hood 0
//! For each generation t in 1..N_TIMESTEPS:
//! 1. earned  = CAPITAL_EFFICIENCY * capital[t-1] * N(1, SKILL_NOISE_SD)
//! 2. income[t] from income[t-1], noise, earned          (pre-tax)
//! 3. hood[t] = policy.assign(income[t], hood[t-1]); census
//! 4. income[t] taxed in place; taxbase per neighborhood
//! 5. capital[t] from income[t], hood[t], taxbase
//! ```
//!
//! Trials in a run share one `RngManager` sequentially. A sweep clones the
//! base config for each value and never mutates it.
//!
//! # Example
//!
//! ```rust
//! use mobility_simulator_core_rs::{NeighborhoodPolicy, Orchestrator, SimConfig};
//!
//! let config = SimConfig {
//!     n_families: 10,
//!     n_timesteps: 5,
//!     neighborhood_policy: NeighborhoodPolicy::SortedPairs,
//!     ..SimConfig::default()
//! };
//!
//! let mut orchestrator = Orchestrator::new(config).unwrap();
//! orchestrator.set("TAX_RATE", 0.2).unwrap();
//!
//! let result = orchestrator.run(3, false).unwrap();
//! assert_eq!(result.ntrials(), 3);
//! assert_eq!(result.income.timesteps(), 5);
//! ```

use crate::config::{
    config_fingerprint, ConfigError, ConfigParam, ConfigWarning, InstabilityPolicy, SimConfig,
};
use crate::mechanisms::human_capital::{self, develop_human_capital, SkillFormation};
use crate::mechanisms::income::{self, earn_income, gain_income};
use crate::mechanisms::neighborhood::{self, census, NeighborhoodError, NeighborhoodPolicy};
use crate::mechanisms::tax::collect_taxes;
use crate::models::{
    check_finite, InstabilityReport, InstabilityStage, TrialFailure, TrialResult, TrialSink,
    TrialState,
};
use crate::results::{AggregateResult, SweepResult};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Errors and per-generation results
// ============================================================================

/// Simulation errors
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("Invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Neighborhood error: {0}")]
    Neighborhood(#[from] NeighborhoodError),

    #[error(
        "Numerical instability in trial {trial} at generation {generation} ({stage}), {} families affected",
        .families.len()
    )]
    NumericalInstability {
        trial: usize,
        generation: usize,
        stage: InstabilityStage,
        families: Vec<usize>,
    },

    #[error("Trial {0} has already run all generations")]
    TrialComplete(usize),
}

/// Outcome of one generation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: usize,
    /// Neighborhoods in use after this generation's census
    pub hood_count: usize,
    /// Revenue collected across all neighborhoods
    pub tax_revenue: f64,
    /// Instabilities detected (and tolerated) in this generation
    pub instabilities: usize,
}

// ============================================================================
// Trial
// ============================================================================

/// One realization of the model, advanced a generation at a time
///
/// Owns its state buffers exclusively; they are handed off as a
/// [`TrialResult`] by [`Trial::finish`].
pub struct Trial<'a> {
    index: usize,
    config: &'a SimConfig,
    fingerprint: &'a str,
    rng: &'a mut RngManager,
    state: TrialState,
    /// Last generation written
    generation: usize,
    diagnostics: Vec<InstabilityReport>,
}

impl<'a> Trial<'a> {
    /// Allocate state and write generation 0.
    ///
    /// # Errors
    ///
    /// * `InvalidConfig` if `config` fails validation
    pub fn new(
        index: usize,
        config: &'a SimConfig,
        fingerprint: &'a str,
        rng: &'a mut RngManager,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let n = config.n_families;
        let mut state = TrialState::new(config.n_timesteps, n);

        let (income0, noise0) = income::initial_income(n);
        state.income.set_row(0, &income0);
        state.noise = noise0;
        state.capital.set_row(0, &human_capital::initial_capital(n));

        let hood0 = neighborhood::initial_assignment(n);
        let census0 = census(&hood0, n)?;
        state.hood.set_row(0, &hood0);
        state.pop.set_row(0, &census0.population);
        state.hood_count = census0.hood_count;

        Ok(Self {
            index,
            config,
            fingerprint,
            rng,
            state,
            generation: 0,
            diagnostics: Vec::new(),
        })
    }

    /// Last generation written (0 right after construction)
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn is_complete(&self) -> bool {
        self.generation + 1 >= self.state.num_timesteps()
    }

    pub fn state(&self) -> &TrialState {
        &self.state
    }

    /// Advance one generation.
    ///
    /// # Errors
    ///
    /// * `TrialComplete` if every generation has been written
    /// * `Neighborhood` if the policy cannot assign (FullSort) or the census fails
    /// * `NumericalInstability` if a non-finite value appears and the
    ///   instability policy is not `Continue`
    pub fn step(&mut self) -> Result<GenerationSummary, SimulationError> {
        if self.is_complete() {
            return Err(SimulationError::TrialComplete(self.index));
        }
        let t = self.generation + 1;
        let config = self.config;
        let reports_before = self.diagnostics.len();

        // 1-2. Income from the parent generation
        let earned = earn_income(config, self.state.capital.row(t - 1), self.rng);
        self.check(&earned, t, InstabilityStage::EarnedIncome)?;

        let update = gain_income(
            config,
            self.state.income.row(t - 1),
            &self.state.noise,
            &earned,
            self.rng,
        );
        self.check(&update.income, t, InstabilityStage::Income)?;
        self.state.noise = update.noise;

        // 3. Neighborhood selection on pre-tax income
        let hood = config
            .neighborhood_policy
            .assign(&update.income, self.state.hood.row(t - 1))?;
        let hood_census = census(&hood, self.state.num_families())?;

        // 4. Taxes
        let taxed = collect_taxes(
            &update.income,
            &hood,
            hood_census.hood_count,
            config.tax_rate,
        )?;

        // 5. Capital for the next generation
        let capital = develop_human_capital(
            config,
            &taxed.income_after_tax,
            &hood,
            &hood_census,
            &taxed.taxbase,
        );
        self.check(&capital.investment, t, InstabilityStage::EducationInvestment)?;
        self.check(&capital.capital, t, InstabilityStage::HumanCapital)?;

        self.state.income.set_row(t, &taxed.income_after_tax);
        self.state.capital.set_row(t, &capital.capital);
        self.state.hood.set_row(t, &hood);
        self.state.pop.set_row(t, &hood_census.population);
        self.state.hood_count = hood_census.hood_count;
        self.generation = t;

        Ok(GenerationSummary {
            generation: t,
            hood_count: hood_census.hood_count,
            tax_revenue: taxed.total_revenue(),
            instabilities: self.diagnostics.len() - reports_before,
        })
    }

    fn check(
        &mut self,
        values: &[f64],
        generation: usize,
        stage: InstabilityStage,
    ) -> Result<(), SimulationError> {
        let Some(report) = check_finite(values, generation, stage) else {
            return Ok(());
        };

        tracing::error!(
            trial = self.index,
            generation,
            stage = %stage,
            families = report.families.len(),
            "numerical instability"
        );

        match self.config.instability_policy {
            InstabilityPolicy::Continue => {
                self.diagnostics.push(report);
                Ok(())
            }
            InstabilityPolicy::AbortTrial | InstabilityPolicy::AbortRun => {
                Err(SimulationError::NumericalInstability {
                    trial: self.index,
                    generation,
                    stage,
                    families: report.families,
                })
            }
        }
    }

    /// Step until every generation is written, then hand off the result.
    pub fn run_to_completion(mut self) -> Result<TrialResult, SimulationError> {
        while !self.is_complete() {
            self.step()?;
        }
        Ok(self.finish())
    }

    /// Consume the trial and release its buffers as a result.
    pub fn finish(self) -> TrialResult {
        TrialResult {
            trial: self.index,
            config_fingerprint: self.fingerprint.to_string(),
            income: self.state.income,
            human_capital: self.state.capital,
            neighborhood: self.state.hood,
            neighborhood_size: self.state.pop,
            diagnostics: self.diagnostics,
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Owns the configuration and the shared random stream
///
/// # Determinism
///
/// The stream is seeded from `SimConfig::rng_seed` once, at construction.
/// Same seed + same config + same call sequence = identical results.
pub struct Orchestrator {
    config: SimConfig,
    fingerprint: String,
    rng: RngManager,
}

impl Orchestrator {
    /// Validate the config and seed the random stream.
    ///
    /// Ill-conditioning warnings are logged, not returned as errors.
    pub fn new(config: SimConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        for warning in config.warnings() {
            tracing::warn!("{}", warning);
        }
        let fingerprint = config_fingerprint(&config)?;
        let rng = RngManager::new(config.rng_seed);

        Ok(Self {
            config,
            fingerprint,
            rng,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Fingerprint of the current config
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Current position in the random stream
    pub fn rng_state(&self) -> u64 {
        self.rng.get_state()
    }

    /// Set a named coefficient; see [`SimConfig::set`].
    pub fn set(&mut self, name: &str, value: f64) -> Result<Vec<ConfigWarning>, SimulationError> {
        let warnings = self.config.set(name, value)?;
        self.refresh_fingerprint()?;
        Ok(warnings)
    }

    pub fn set_neighborhood_policy(
        &mut self,
        policy: NeighborhoodPolicy,
    ) -> Result<(), SimulationError> {
        self.config.set_neighborhood_policy(policy);
        self.refresh_fingerprint()
    }

    pub fn set_skill_formation(&mut self, form: SkillFormation) -> Result<(), SimulationError> {
        self.config.set_skill_formation(form);
        self.refresh_fingerprint()
    }

    pub fn set_instability_policy(
        &mut self,
        policy: InstabilityPolicy,
    ) -> Result<(), SimulationError> {
        self.config.set_instability_policy(policy);
        self.refresh_fingerprint()
    }

    fn refresh_fingerprint(&mut self) -> Result<(), SimulationError> {
        self.fingerprint = config_fingerprint(&self.config)?;
        Ok(())
    }

    /// Start a trial for generation-by-generation stepping.
    pub fn trial(&mut self, index: usize) -> Result<Trial<'_>, SimulationError> {
        Trial::new(index, &self.config, &self.fingerprint, &mut self.rng)
    }

    /// Run one complete trial.
    pub fn run_trial(&mut self, index: usize) -> Result<TrialResult, SimulationError> {
        self.trial(index)?.run_to_completion()
    }

    /// Run `ntrials` trials, streaming each into `sink`.
    pub fn run_into<S: TrialSink>(
        &mut self,
        ntrials: usize,
        sink: &mut S,
    ) -> Result<(), SimulationError> {
        run_trials(&self.config, &self.fingerprint, &mut self.rng, ntrials, sink)
    }

    /// Run `ntrials` trials and aggregate them.
    pub fn run(
        &mut self,
        ntrials: usize,
        keep_trials: bool,
    ) -> Result<AggregateResult, SimulationError> {
        let mut aggregate = AggregateResult::new(self.fingerprint.clone(), keep_trials);
        self.run_into(ntrials, &mut aggregate)?;
        Ok(aggregate)
    }

    /// Run a full aggregate at each value of one named parameter.
    ///
    /// Every value is applied to a fresh copy of the current config, so the
    /// orchestrator's own config is unchanged afterwards. All values are
    /// validated before the first trial runs.
    pub fn run_sweep(
        &mut self,
        param: &str,
        values: &[f64],
        ntrials: usize,
        keep_trials: bool,
    ) -> Result<SweepResult, SimulationError> {
        let param: ConfigParam = param.parse()?;

        let mut configs = Vec::with_capacity(values.len());
        for &value in values {
            let mut config = self.config.clone();
            config.set_param(param, value)?;
            let fingerprint = config_fingerprint(&config)?;
            configs.push((value, config, fingerprint));
        }

        tracing::info!(param = %param, points = values.len(), ntrials, "starting sweep");

        let mut sweep = SweepResult::new(param.name());
        for (value, config, fingerprint) in configs {
            let mut aggregate = AggregateResult::new(fingerprint.clone(), keep_trials);
            run_trials(&config, &fingerprint, &mut self.rng, ntrials, &mut aggregate)?;
            sweep.add(value, aggregate);
        }
        Ok(sweep)
    }
}

fn run_trials<S: TrialSink>(
    config: &SimConfig,
    fingerprint: &str,
    rng: &mut RngManager,
    ntrials: usize,
    sink: &mut S,
) -> Result<(), SimulationError> {
    tracing::info!(
        ntrials,
        families = config.n_families,
        timesteps = config.n_timesteps,
        policy = %config.neighborhood_policy,
        "starting run"
    );

    for index in 0..ntrials {
        let outcome = Trial::new(index, config, fingerprint, rng).and_then(Trial::run_to_completion);
        match outcome {
            Ok(result) => {
                tracing::debug!(
                    trial = index,
                    unstable = result.is_unstable(),
                    "trial complete"
                );
                sink.accept(result);
            }
            Err(SimulationError::NumericalInstability {
                trial,
                generation,
                stage,
                families,
            }) if config.instability_policy == InstabilityPolicy::AbortTrial => {
                tracing::warn!(trial, generation, stage = %stage, "trial aborted");
                sink.reject(TrialFailure {
                    trial,
                    report: InstabilityReport {
                        generation,
                        stage,
                        families,
                    },
                });
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimConfig {
        SimConfig {
            n_families: 4,
            n_timesteps: 3,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_generation_zero_written_on_construction() {
        let config = small_config();
        let mut rng = RngManager::new(1);
        let trial = Trial::new(0, &config, "fp", &mut rng).unwrap();

        assert_eq!(trial.generation(), 0);
        assert_eq!(trial.state().income.row(0), &[1.0; 4]);
        assert_eq!(trial.state().capital.row(0), &[1.0; 4]);
        assert_eq!(trial.state().hood.row(0), &[0, 0, 1, 1]);
        assert_eq!(trial.state().pop.row(0), &[2, 2, 0, 0]);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SimConfig {
            n_timesteps: 0,
            ..small_config()
        };
        let mut rng = RngManager::new(1);
        let err = Trial::new(0, &config, "fp", &mut rng).err();

        assert!(matches!(
            err,
            Some(SimulationError::InvalidConfig(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_step_past_end_is_an_error() {
        let config = small_config();
        let mut rng = RngManager::new(1);
        let mut trial = Trial::new(7, &config, "fp", &mut rng).unwrap();

        trial.step().unwrap();
        trial.step().unwrap();
        assert!(trial.is_complete());
        assert_eq!(trial.step().unwrap_err(), SimulationError::TrialComplete(7));
    }

    #[test]
    fn test_single_timestep_trial_has_only_generation_zero() {
        let config = SimConfig {
            n_timesteps: 1,
            ..small_config()
        };
        let mut rng = RngManager::new(1);
        let state_before = rng.get_state();
        let result = Trial::new(0, &config, "fp", &mut rng)
            .unwrap()
            .run_to_completion()
            .unwrap();

        assert_eq!(result.income.rows(), 1);
        assert_eq!(rng.get_state(), state_before, "no draws without transitions");
    }

    #[test]
    fn test_full_sort_fails_loudly() {
        let config = SimConfig {
            neighborhood_policy: NeighborhoodPolicy::FullSort,
            ..small_config()
        };
        let mut orchestrator = Orchestrator::new(config).unwrap();
        let err = orchestrator.run(1, false).unwrap_err();
        assert_eq!(
            err,
            SimulationError::Neighborhood(NeighborhoodError::NotImplemented(
                NeighborhoodPolicy::FullSort
            ))
        );
    }

    #[test]
    fn test_summary_reports_revenue() {
        let config = SimConfig {
            tax_rate: 0.5,
            income_growth: 2.0,
            ..small_config()
        };
        let mut rng = RngManager::new(3);
        let mut trial = Trial::new(0, &config, "fp", &mut rng).unwrap();

        let summary = trial.step().unwrap();
        // every family earns exactly the growth term, half of it is taxed
        assert_eq!(summary.generation, 1);
        assert_eq!(summary.hood_count, 2);
        assert!((summary.tax_revenue - 4.0).abs() < 1e-12);
        assert_eq!(summary.instabilities, 0);
    }
}
