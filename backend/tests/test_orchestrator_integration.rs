//! Integration tests for the Orchestrator generation loop
//!
//! These tests validate complete trials, multi-trial runs, sweeps, and the
//! instability policies.

use mobility_simulator_core_rs::{
    InstabilityPolicy, InstabilityStage, NeighborhoodPolicy, Orchestrator, SeriesKind, SimConfig,
    SimulationError, TrialResult, TrialSink,
};

/// Helper function to create a small noisy configuration
fn create_small_config() -> SimConfig {
    SimConfig {
        n_families: 6,
        n_timesteps: 8,
        income_growth: 1.0,
        parental_investment_coef: 0.3,
        capital_efficiency: 0.2,
        income_noise_additive: 0.3,
        income_noise_autoreg: 0.2,
        tax_rate: 0.25,
        neighborhood_policy: NeighborhoodPolicy::SortedPairs,
        rng_seed: 42,
        ..SimConfig::default()
    }
}

/// Configuration whose human capital overflows in generation 1
fn create_overflow_config(policy: InstabilityPolicy) -> SimConfig {
    SimConfig {
        n_families: 4,
        n_timesteps: 4,
        capital_efficiency: 1e300,
        skill_noise_sd: 0.0,
        tax_rate: 0.5,
        instability_policy: policy,
        ..SimConfig::default()
    }
}

// ============================================================================
// Runs
// ============================================================================

#[test]
fn test_run_produces_one_column_group_per_trial() {
    let config = create_small_config();
    let mut orch = Orchestrator::new(config.clone()).unwrap();

    let result = orch.run(5, false).unwrap();

    assert_eq!(result.ntrials(), 5);
    assert!(result.trial_data.is_empty());
    assert_eq!(result.config_fingerprint, orch.fingerprint());

    for kind in SeriesKind::ALL {
        let series = result.series(kind);
        assert_eq!(series.ntrials(), 5);
        assert_eq!(series.timesteps(), config.n_timesteps);

        let per_trial = if kind.tracks_gini() { 3 } else { 2 };
        let columns = series.columns();
        assert_eq!(columns.len(), 5 * per_trial);
        assert!(columns.iter().all(|c| c.values.len() == config.n_timesteps));
    }
}

#[test]
fn test_generation_zero_is_equal() {
    let mut orch = Orchestrator::new(create_small_config()).unwrap();
    let result = orch.run(2, false).unwrap();

    for trial in &result.income.trials {
        assert_eq!(trial.stats.mean[0], 1.0);
        assert_eq!(trial.stats.sd[0], 0.0);
        assert!(trial.stats.gini.as_ref().unwrap()[0].abs() < 1e-12);
    }
}

#[test]
fn test_kept_trials_have_full_shape() {
    let config = create_small_config();
    let mut orch = Orchestrator::new(config.clone()).unwrap();

    let result = orch.run(3, true).unwrap();

    assert_eq!(result.trial_data.len(), 3);
    for (i, trial) in result.trial_data.iter().enumerate() {
        assert_eq!(trial.trial, i);
        assert_eq!(trial.income.rows(), config.n_timesteps);
        assert_eq!(trial.income.cols(), config.n_families);
        assert_eq!(trial.human_capital.rows(), config.n_timesteps);
        assert_eq!(trial.neighborhood.rows(), config.n_timesteps);
        assert!(!trial.is_unstable());
    }
}

#[test]
fn test_trial_buffers_are_fresh() {
    let config = SimConfig {
        neighborhood_policy: NeighborhoodPolicy::Static,
        ..create_small_config()
    };
    let mut orch = Orchestrator::new(config).unwrap();

    let result = orch.run(3, true).unwrap();

    // every trial restarts from the same generation 0
    for trial in &result.trial_data {
        assert_eq!(trial.income.row(0), &[1.0; 6]);
        assert_eq!(trial.human_capital.row(0), &[1.0; 6]);
        assert_eq!(trial.neighborhood.row(0), &[0, 0, 0, 1, 1, 1]);
    }
}

#[test]
fn test_run_into_custom_sink() {
    struct Counter {
        accepted: usize,
        generations: usize,
    }
    impl TrialSink for Counter {
        fn accept(&mut self, trial: TrialResult) {
            self.accepted += 1;
            self.generations += trial.income.rows();
        }
    }

    let mut orch = Orchestrator::new(create_small_config()).unwrap();
    let mut sink = Counter {
        accepted: 0,
        generations: 0,
    };
    orch.run_into(4, &mut sink).unwrap();

    assert_eq!(sink.accepted, 4);
    assert_eq!(sink.generations, 4 * 8);
}

#[test]
fn test_stepping_matches_run_trial() {
    let config = create_small_config();

    let mut stepped = Orchestrator::new(config.clone()).unwrap();
    let mut trial = stepped.trial(0).unwrap();
    let mut summaries = Vec::new();
    while !trial.is_complete() {
        summaries.push(trial.step().unwrap());
    }
    let stepped_result = trial.finish();

    let whole = Orchestrator::new(config).unwrap().run_trial(0).unwrap();

    assert_eq!(stepped_result.income, whole.income);
    assert_eq!(summaries.len(), 7);
    assert_eq!(summaries.last().unwrap().generation, 7);
    assert!(summaries.iter().all(|s| s.hood_count == 3));
}

#[test]
fn test_setting_parameter_changes_fingerprint() {
    let mut orch = Orchestrator::new(create_small_config()).unwrap();
    let before = orch.fingerprint().to_string();

    orch.set("TAX_RATE", 0.4).unwrap();
    assert_ne!(orch.fingerprint(), before);
    assert_eq!(orch.config().tax_rate, 0.4);

    assert!(orch.set("TAXRATE", 0.4).is_err());
    assert_eq!(orch.config().tax_rate, 0.4);
}

#[test]
fn test_invalid_config_rejected_at_construction() {
    let config = SimConfig {
        n_families: 0,
        ..SimConfig::default()
    };
    assert!(matches!(
        Orchestrator::new(config),
        Err(SimulationError::InvalidConfig(_))
    ));
}

// ============================================================================
// Sweeps
// ============================================================================

#[test]
fn test_sweep_leaves_config_unchanged() {
    let config = create_small_config();
    let mut orch = Orchestrator::new(config.clone()).unwrap();

    let sweep = orch.run_sweep("TAX_RATE", &[0.1, 0.2, 0.3], 2, false).unwrap();

    assert_eq!(orch.config(), &config);
    assert_eq!(sweep.param, "TAX_RATE");
    assert_eq!(sweep.values(), vec![0.1, 0.2, 0.3]);
    assert!(sweep.points.iter().all(|p| p.aggregate.ntrials() == 2));

    // each point carries its own config's fingerprint
    assert_ne!(
        sweep.points[0].aggregate.config_fingerprint,
        sweep.points[1].aggregate.config_fingerprint
    );
}

#[test]
fn test_sweep_rows_indexed_by_param_and_time() {
    let mut orch = Orchestrator::new(create_small_config()).unwrap();
    let sweep = orch.run_sweep("INCOME_GROWTH", &[0.5, 2.0], 3, false).unwrap();

    let rows = sweep.rows(SeriesKind::Income);
    assert_eq!(rows.len(), 2 * 8);
    assert_eq!((rows[0].param, rows[0].time), (0.5, 0));
    assert_eq!((rows[15].param, rows[15].time), (2.0, 7));
    assert!(rows.iter().all(|r| r.gini.is_some()));

    let sizes = sweep.rows(SeriesKind::NeighborhoodSize);
    assert!(sizes.iter().all(|r| r.gini.is_none()));

    // higher growth lifts mean income after generation 0
    assert!(rows[15].mean > rows[7].mean);
}

#[test]
fn test_sweep_unknown_parameter_rejected_before_running() {
    let mut orch = Orchestrator::new(create_small_config()).unwrap();
    let state = orch.rng_state();

    let err = orch.run_sweep("TAX_RAT", &[0.1], 2, false).unwrap_err();

    assert!(matches!(err, SimulationError::InvalidConfig(_)));
    assert_eq!(orch.rng_state(), state);
}

#[test]
fn test_sweep_invalid_value_rejected_before_running() {
    let mut orch = Orchestrator::new(create_small_config()).unwrap();
    let state = orch.rng_state();

    assert!(orch
        .run_sweep("EDU_EFFICIENCY_LOWER", &[0.05, -1.0], 1, false)
        .is_err());
    assert_eq!(orch.rng_state(), state);
}

// ============================================================================
// Instability policies
// ============================================================================

#[test]
fn test_continue_records_diagnostics() {
    let mut orch = Orchestrator::new(create_overflow_config(InstabilityPolicy::Continue)).unwrap();
    let result = orch.run(2, true).unwrap();

    assert_eq!(result.ntrials(), 2);
    assert!(result.failures.is_empty());
    for trial in &result.trial_data {
        assert!(trial.is_unstable());
        let first = &trial.diagnostics[0];
        assert_eq!(first.generation, 1);
        assert_eq!(first.stage, InstabilityStage::HumanCapital);
        assert_eq!(first.families, vec![0, 1, 2, 3]);
    }
}

#[test]
fn test_abort_trial_drops_unstable_trials() {
    let mut orch =
        Orchestrator::new(create_overflow_config(InstabilityPolicy::AbortTrial)).unwrap();
    let result = orch.run(3, true).unwrap();

    assert_eq!(result.ntrials(), 0);
    assert!(result.trial_data.is_empty());
    assert_eq!(result.failures.len(), 3);
    assert_eq!(
        result.failures.iter().map(|f| f.trial).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert!(result
        .failures
        .iter()
        .all(|f| f.report.generation == 1 && f.report.stage == InstabilityStage::HumanCapital));
}

#[test]
fn test_abort_run_stops_with_error() {
    let mut orch = Orchestrator::new(create_overflow_config(InstabilityPolicy::AbortRun)).unwrap();
    let err = orch.run(3, false).unwrap_err();

    assert_eq!(
        err,
        SimulationError::NumericalInstability {
            trial: 0,
            generation: 1,
            stage: InstabilityStage::HumanCapital,
            families: vec![0, 1, 2, 3],
        }
    );
}
