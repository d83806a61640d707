//! Tests for configuration: named parameters, validation, warnings, JSON

use mobility_simulator_core_rs::config::ConfigParam;
use mobility_simulator_core_rs::{
    config_fingerprint, ConfigError, ConfigWarning, InstabilityPolicy, NeighborhoodPolicy,
    SimConfig, SkillFormation,
};

// ============================================================================
// Named parameters
// ============================================================================

#[test]
fn test_every_parameter_round_trips_by_name() {
    let mut config = SimConfig::default();

    for (i, param) in ConfigParam::ALL.iter().enumerate() {
        let value = match param {
            ConfigParam::NFamilies | ConfigParam::NTimesteps => 7.0,
            ConfigParam::EduEfficiencyLower => 0.2,
            ConfigParam::EduEfficiencyUpper => 0.95,
            _ => 0.01 * (i + 1) as f64,
        };
        config.set(param.name(), value).unwrap();
        assert_eq!(config.get(param.name()).unwrap(), value, "{}", param);
    }
}

#[test]
fn test_unknown_parameter_rejected_without_effect() {
    let mut config = SimConfig::default();
    let before = config.clone();

    let err = config.set("TAX_RAT", 0.3).unwrap_err();

    assert_eq!(err, ConfigError::UnknownParameter("TAX_RAT".to_string()));
    assert_eq!(err.to_string(), "Invalid parameter TAX_RAT");
    assert_eq!(config, before);
}

#[test]
fn test_names_are_case_sensitive() {
    let mut config = SimConfig::default();
    assert!(config.set("tax_rate", 0.3).is_err());
}

#[test]
fn test_invalid_value_leaves_config_untouched() {
    let mut config = SimConfig::default();
    let before = config.clone();

    assert!(config.set("EDU_EFFICIENCY_LOWER", 0.0).is_err());
    assert!(config.set("EDU_EFFICIENCY_UPPER", 0.05).is_err());
    assert!(config.set("SKILL_NOISE_SD", -1.0).is_err());
    assert!(config.set("N_FAMILIES", 2.5).is_err());
    assert!(config.set("N_TIMESTEPS", 0.0).is_err());
    assert!(config.set("TAX_RATE", f64::NAN).is_err());

    assert_eq!(config, before);
}

#[test]
fn test_shock_floor_unset_reads_negative_infinity() {
    let mut config = SimConfig::default();
    assert_eq!(config.get("INCOME_SHOCK_FLOOR").unwrap(), f64::NEG_INFINITY);

    config.set("INCOME_SHOCK_FLOOR", -2.0).unwrap();
    assert_eq!(config.income_shock_floor, Some(-2.0));
}

#[test]
fn test_shock_floor_cleared_by_negative_infinity() {
    let mut config = SimConfig::default();
    let unset = config.get("INCOME_SHOCK_FLOOR").unwrap();

    config.set("INCOME_SHOCK_FLOOR", 0.5).unwrap();
    config.set("INCOME_SHOCK_FLOOR", unset).unwrap();
    assert_eq!(config.income_shock_floor, None);
    assert_eq!(config, SimConfig::default());

    // other parameters still reject infinities
    assert!(config.set("TAX_RATE", f64::NEG_INFINITY).is_err());
    assert!(config.set("INCOME_SHOCK_FLOOR", f64::INFINITY).is_err());
}

// ============================================================================
// Warnings
// ============================================================================

#[test]
fn test_divergence_warning_when_efficiency_times_tax_exceeds_lower_bound() {
    let mut config = SimConfig::default();

    assert!(config.set("CAPITAL_EFFICIENCY", 0.5).unwrap().is_empty());

    // 0.5 * 0.4 = 0.2 > 0.1
    let warnings = config.set("TAX_RATE", 0.4).unwrap();
    assert_eq!(
        warnings,
        vec![ConfigWarning::LikelyDivergent {
            capital_efficiency: 0.5,
            tax_rate: 0.4,
            edu_efficiency_lower: 0.1,
        }]
    );
    // a warning never blocks the assignment
    assert_eq!(config.tax_rate, 0.4);
}

#[test]
fn test_no_warning_at_boundary() {
    let config = SimConfig {
        capital_efficiency: 0.5,
        tax_rate: 0.2,
        ..SimConfig::default()
    };
    // 0.5 * 0.2 == 0.1 is not strictly greater
    assert!(config.warnings().is_empty());
}

// ============================================================================
// Policies
// ============================================================================

#[test]
fn test_policy_names_parse() {
    assert_eq!("SortedPairs".parse::<NeighborhoodPolicy>().unwrap(), NeighborhoodPolicy::SortedPairs);
    assert_eq!("sorted-pairs".parse::<NeighborhoodPolicy>().unwrap(), NeighborhoodPolicy::SortedPairs);
    assert_eq!("full_sort".parse::<NeighborhoodPolicy>().unwrap(), NeighborhoodPolicy::FullSort);
    assert!("random".parse::<NeighborhoodPolicy>().is_err());

    assert_eq!("cobb-douglas".parse::<SkillFormation>().unwrap(), SkillFormation::CobbDouglas);
    assert_eq!("abort_run".parse::<InstabilityPolicy>().unwrap(), InstabilityPolicy::AbortRun);
    assert!("retry".parse::<InstabilityPolicy>().is_err());
}

// ============================================================================
// JSON and fingerprint
// ============================================================================

#[test]
fn test_json_uses_parameter_names_and_defaults() {
    let config = SimConfig::from_json_str(
        r#"{"N_FAMILIES": 20, "TAX_RATE": 0.25, "NEIGHBORHOOD_POLICY": "SortedPairs"}"#,
    )
    .unwrap();

    assert_eq!(config.n_families, 20);
    assert_eq!(config.tax_rate, 0.25);
    assert_eq!(config.neighborhood_policy, NeighborhoodPolicy::SortedPairs);
    assert_eq!(config.n_timesteps, SimConfig::default().n_timesteps);
}

#[test]
fn test_json_rejects_unknown_keys() {
    let err = SimConfig::from_json_str(r#"{"TAX_RAT": 0.25}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Serialization(_)));
}

#[test]
fn test_json_validates() {
    let err = SimConfig::from_json_str(r#"{"EDU_EFFICIENCY_LOWER": -1.0}"#).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn test_fingerprint_tracks_every_field() {
    let base = SimConfig::default();
    let fp = config_fingerprint(&base).unwrap();

    assert_eq!(fp, config_fingerprint(&base.clone()).unwrap());

    let mut changed = base.clone();
    changed.set("SKILL_SCALE", 2.0).unwrap();
    assert_ne!(fp, config_fingerprint(&changed).unwrap());

    let mut reseeded = base;
    reseeded.rng_seed += 1;
    assert_ne!(fp, config_fingerprint(&reseeded).unwrap());
}
