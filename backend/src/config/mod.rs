//! Simulation configuration
//!
//! `SimConfig` is the read-only parameter bundle every mechanism consumes.
//! Coefficients are addressed by their model names (`TAX_RATE`,
//! `CAPITAL_EFFICIENCY`, ...) so sweeps and the CLI can set them by string.
//!
//! # Critical Invariants
//!
//! 1. Unknown parameter names are rejected and leave the config untouched
//! 2. A config is fixed for the duration of a trial
//! 3. `EDU_EFFICIENCY_LOWER > 0` and `EDU_EFFICIENCY_UPPER >= EDU_EFFICIENCY_LOWER`

pub mod fingerprint;

use crate::mechanisms::human_capital::SkillFormation;
use crate::mechanisms::neighborhood::NeighborhoodPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use fingerprint::config_fingerprint;

/// Errors raised while building or mutating a configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid parameter {0}")]
    UnknownParameter(String),

    #[error("Invalid value {value} for {param}: {reason}")]
    InvalidValue {
        param: String,
        value: f64,
        reason: String,
    },

    #[error("Unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Config serialization failed: {0}")]
    Serialization(String),
}

/// Non-fatal configuration diagnostics
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    /// `CAPITAL_EFFICIENCY * TAX_RATE` exceeds the lower education-efficiency
    /// bound, so human capital tends to grow without limit.
    LikelyDivergent {
        capital_efficiency: f64,
        tax_rate: f64,
        edu_efficiency_lower: f64,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::LikelyDivergent {
                capital_efficiency,
                tax_rate,
                edu_efficiency_lower,
            } => write!(
                f,
                "CAPITAL_EFFICIENCY * TAX_RATE = {} exceeds EDU_EFFICIENCY_LOWER = {}; simulation will likely diverge",
                capital_efficiency * tax_rate,
                edu_efficiency_lower
            ),
        }
    }
}

/// What the engine does when a transition produces a non-finite value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstabilityPolicy {
    /// Log a critical diagnostic, record it on the trial, keep going
    #[default]
    Continue,
    /// Drop the trial, record the failure, continue with the next trial
    AbortTrial,
    /// Stop the whole run or sweep with an error
    AbortRun,
}

impl FromStr for InstabilityPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "continue" => Ok(InstabilityPolicy::Continue),
            "aborttrial" => Ok(InstabilityPolicy::AbortTrial),
            "abortrun" => Ok(InstabilityPolicy::AbortRun),
            _ => Err(ConfigError::UnknownVariant {
                kind: "instability policy",
                value: s.to_string(),
            }),
        }
    }
}

/// Named real-valued parameters accepted by [`SimConfig::set`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigParam {
    NFamilies,
    NTimesteps,
    IncomeGrowth,
    ParentalInvestmentCoef,
    CapitalEfficiency,
    SkillNoiseSd,
    IncomeNoiseAdditive,
    IncomeNoiseAutoreg,
    IncomeShockFloor,
    TaxRate,
    SkillScale,
    SkillFromParentIncome,
    SkillFromNeighborIncome,
    EduEfficiencyLower,
    EduEfficiencyUpper,
    EduEfficiencySteepness,
}

impl ConfigParam {
    pub const ALL: [ConfigParam; 16] = [
        ConfigParam::NFamilies,
        ConfigParam::NTimesteps,
        ConfigParam::IncomeGrowth,
        ConfigParam::ParentalInvestmentCoef,
        ConfigParam::CapitalEfficiency,
        ConfigParam::SkillNoiseSd,
        ConfigParam::IncomeNoiseAdditive,
        ConfigParam::IncomeNoiseAutoreg,
        ConfigParam::IncomeShockFloor,
        ConfigParam::TaxRate,
        ConfigParam::SkillScale,
        ConfigParam::SkillFromParentIncome,
        ConfigParam::SkillFromNeighborIncome,
        ConfigParam::EduEfficiencyLower,
        ConfigParam::EduEfficiencyUpper,
        ConfigParam::EduEfficiencySteepness,
    ];

    /// Model name of the parameter
    pub fn name(&self) -> &'static str {
        match self {
            ConfigParam::NFamilies => "N_FAMILIES",
            ConfigParam::NTimesteps => "N_TIMESTEPS",
            ConfigParam::IncomeGrowth => "INCOME_GROWTH",
            ConfigParam::ParentalInvestmentCoef => "PARENTAL_INVESTMENT_COEF",
            ConfigParam::CapitalEfficiency => "CAPITAL_EFFICIENCY",
            ConfigParam::SkillNoiseSd => "SKILL_NOISE_SD",
            ConfigParam::IncomeNoiseAdditive => "INCOME_NOISE_ADDITIVE",
            ConfigParam::IncomeNoiseAutoreg => "INCOME_NOISE_AUTOREG",
            ConfigParam::IncomeShockFloor => "INCOME_SHOCK_FLOOR",
            ConfigParam::TaxRate => "TAX_RATE",
            ConfigParam::SkillScale => "SKILL_SCALE",
            ConfigParam::SkillFromParentIncome => "SKILL_FROM_PARENT_INCOME",
            ConfigParam::SkillFromNeighborIncome => "SKILL_FROM_NEIGHBOR_INCOME",
            ConfigParam::EduEfficiencyLower => "EDU_EFFICIENCY_LOWER",
            ConfigParam::EduEfficiencyUpper => "EDU_EFFICIENCY_UPPER",
            ConfigParam::EduEfficiencySteepness => "EDU_EFFICIENCY_STEEPNESS",
        }
    }

    fn is_size(&self) -> bool {
        matches!(self, ConfigParam::NFamilies | ConfigParam::NTimesteps)
    }
}

impl FromStr for ConfigParam {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigParam::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| ConfigError::UnknownParameter(s.to_string()))
    }
}

impl fmt::Display for ConfigParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Complete model configuration
///
/// Field names serialize in the model's SCREAMING_SNAKE_CASE so a JSON
/// config file reads like the parameter table. Unknown keys are rejected.
///
/// # Example
///
/// ```
/// use mobility_simulator_core_rs::SimConfig;
///
/// let mut config = SimConfig::default();
/// config.set("TAX_RATE", 0.5).unwrap();
/// assert_eq!(config.tax_rate, 0.5);
///
/// // Unknown names fail loudly and change nothing
/// assert!(config.set("TAX_RAT", 0.1).is_err());
/// assert_eq!(config.tax_rate, 0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SimConfig {
    pub n_families: usize,
    pub n_timesteps: usize,

    /// alpha in eq (1)
    pub income_growth: f64,
    /// beta in eq (1)
    pub parental_investment_coef: f64,
    /// phi in eq (4)
    pub capital_efficiency: f64,
    /// Standard deviation of the mean-1 earned-income multiplier
    pub skill_noise_sd: f64,
    /// Scale of the fresh income shock, part of epsilon in eq (1)
    pub income_noise_additive: f64,
    /// MA(1) carry-over, part of epsilon in eq (1)
    pub income_noise_autoreg: f64,
    /// Floor on the unit income-shock draw before scaling
    pub income_shock_floor: Option<f64>,

    pub tax_rate: f64,

    pub skill_scale: f64,
    /// theta_p in eq (10), Cobb-Douglas form only
    pub skill_from_parent_income: f64,
    /// theta_n in eq (10), Cobb-Douglas form only
    pub skill_from_neighbor_income: f64,

    /// lambda_1 in eq (8)
    pub edu_efficiency_lower: f64,
    /// lambda_2 in eq (8)
    pub edu_efficiency_upper: f64,
    pub edu_efficiency_steepness: f64,

    pub neighborhood_policy: NeighborhoodPolicy,
    pub skill_formation: SkillFormation,
    pub instability_policy: InstabilityPolicy,

    pub rng_seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            n_families: 50,
            n_timesteps: 100,
            income_growth: 0.0,
            parental_investment_coef: 0.0,
            capital_efficiency: 0.0,
            skill_noise_sd: 1.0,
            income_noise_additive: 0.0,
            income_noise_autoreg: 0.0,
            income_shock_floor: None,
            tax_rate: 0.0,
            skill_scale: 1.0,
            skill_from_parent_income: 0.0,
            skill_from_neighbor_income: 0.0,
            edu_efficiency_lower: 0.1,
            edu_efficiency_upper: 0.9,
            edu_efficiency_steepness: 10.0,
            neighborhood_policy: NeighborhoodPolicy::Static,
            skill_formation: SkillFormation::Product,
            instability_policy: InstabilityPolicy::Continue,
            rng_seed: 12345,
        }
    }
}

impl SimConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set a named coefficient.
    ///
    /// The assignment is applied only if the resulting bundle is valid.
    /// Setting `INCOME_SHOCK_FLOOR` to negative infinity removes the floor,
    /// mirroring how [`SimConfig::get`] reads an unset floor.
    /// Returns the ill-conditioning warnings of the new bundle, which are
    /// also logged.
    pub fn set(&mut self, name: &str, value: f64) -> Result<Vec<ConfigWarning>, ConfigError> {
        let param: ConfigParam = name.parse()?;
        self.set_param(param, value)
    }

    /// Typed form of [`SimConfig::set`]
    pub fn set_param(
        &mut self,
        param: ConfigParam,
        value: f64,
    ) -> Result<Vec<ConfigWarning>, ConfigError> {
        let clears_floor = param == ConfigParam::IncomeShockFloor && value == f64::NEG_INFINITY;
        if !value.is_finite() && !clears_floor {
            return Err(invalid(param, value, "value must be finite"));
        }
        if param.is_size() && (value < 1.0 || value.fract() != 0.0 || value > u32::MAX as f64) {
            return Err(invalid(param, value, "must be a positive integer"));
        }

        let mut candidate = self.clone();
        candidate.apply(param, value);
        candidate.validate()?;
        *self = candidate;

        let warnings = self.warnings();
        for warning in &warnings {
            tracing::warn!(param = %param, value, "{}", warning);
        }
        Ok(warnings)
    }

    /// Read a named coefficient.
    ///
    /// An unset `INCOME_SHOCK_FLOOR` reads as negative infinity.
    pub fn get(&self, name: &str) -> Result<f64, ConfigError> {
        let param: ConfigParam = name.parse()?;
        Ok(self.get_param(param))
    }

    /// Typed form of [`SimConfig::get`]
    pub fn get_param(&self, param: ConfigParam) -> f64 {
        match param {
            ConfigParam::NFamilies => self.n_families as f64,
            ConfigParam::NTimesteps => self.n_timesteps as f64,
            ConfigParam::IncomeGrowth => self.income_growth,
            ConfigParam::ParentalInvestmentCoef => self.parental_investment_coef,
            ConfigParam::CapitalEfficiency => self.capital_efficiency,
            ConfigParam::SkillNoiseSd => self.skill_noise_sd,
            ConfigParam::IncomeNoiseAdditive => self.income_noise_additive,
            ConfigParam::IncomeNoiseAutoreg => self.income_noise_autoreg,
            ConfigParam::IncomeShockFloor => self.income_shock_floor.unwrap_or(f64::NEG_INFINITY),
            ConfigParam::TaxRate => self.tax_rate,
            ConfigParam::SkillScale => self.skill_scale,
            ConfigParam::SkillFromParentIncome => self.skill_from_parent_income,
            ConfigParam::SkillFromNeighborIncome => self.skill_from_neighbor_income,
            ConfigParam::EduEfficiencyLower => self.edu_efficiency_lower,
            ConfigParam::EduEfficiencyUpper => self.edu_efficiency_upper,
            ConfigParam::EduEfficiencySteepness => self.edu_efficiency_steepness,
        }
    }

    fn apply(&mut self, param: ConfigParam, value: f64) {
        match param {
            ConfigParam::NFamilies => self.n_families = value as usize,
            ConfigParam::NTimesteps => self.n_timesteps = value as usize,
            ConfigParam::IncomeGrowth => self.income_growth = value,
            ConfigParam::ParentalInvestmentCoef => self.parental_investment_coef = value,
            ConfigParam::CapitalEfficiency => self.capital_efficiency = value,
            ConfigParam::SkillNoiseSd => self.skill_noise_sd = value,
            ConfigParam::IncomeNoiseAdditive => self.income_noise_additive = value,
            ConfigParam::IncomeNoiseAutoreg => self.income_noise_autoreg = value,
            ConfigParam::IncomeShockFloor => {
                self.income_shock_floor = (value != f64::NEG_INFINITY).then_some(value)
            }
            ConfigParam::TaxRate => self.tax_rate = value,
            ConfigParam::SkillScale => self.skill_scale = value,
            ConfigParam::SkillFromParentIncome => self.skill_from_parent_income = value,
            ConfigParam::SkillFromNeighborIncome => self.skill_from_neighbor_income = value,
            ConfigParam::EduEfficiencyLower => self.edu_efficiency_lower = value,
            ConfigParam::EduEfficiencyUpper => self.edu_efficiency_upper = value,
            ConfigParam::EduEfficiencySteepness => self.edu_efficiency_steepness = value,
        }
    }

    pub fn set_neighborhood_policy(&mut self, policy: NeighborhoodPolicy) {
        self.neighborhood_policy = policy;
    }

    pub fn set_skill_formation(&mut self, form: SkillFormation) {
        self.skill_formation = form;
    }

    pub fn set_instability_policy(&mut self, policy: InstabilityPolicy) {
        self.instability_policy = policy;
    }

    /// Check the whole bundle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_families == 0 {
            return Err(invalid(ConfigParam::NFamilies, 0.0, "must be at least 1"));
        }
        if self.n_timesteps == 0 {
            return Err(invalid(ConfigParam::NTimesteps, 0.0, "must be at least 1"));
        }

        for param in ConfigParam::ALL {
            if param == ConfigParam::IncomeShockFloor && self.income_shock_floor.is_none() {
                continue;
            }
            let value = self.get_param(param);
            if !value.is_finite() {
                return Err(invalid(param, value, "value must be finite"));
            }
        }

        if self.skill_noise_sd < 0.0 {
            return Err(invalid(
                ConfigParam::SkillNoiseSd,
                self.skill_noise_sd,
                "standard deviation cannot be negative",
            ));
        }
        if self.edu_efficiency_lower <= 0.0 {
            return Err(invalid(
                ConfigParam::EduEfficiencyLower,
                self.edu_efficiency_lower,
                "lower efficiency bound must be positive",
            ));
        }
        if self.edu_efficiency_upper < self.edu_efficiency_lower {
            return Err(invalid(
                ConfigParam::EduEfficiencyUpper,
                self.edu_efficiency_upper,
                "upper efficiency bound is below the lower bound",
            ));
        }
        Ok(())
    }

    /// Ill-conditioning check. Never rejects.
    pub fn warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if self.capital_efficiency * self.tax_rate > self.edu_efficiency_lower {
            warnings.push(ConfigWarning::LikelyDivergent {
                capital_efficiency: self.capital_efficiency,
                tax_rate: self.tax_rate,
                edu_efficiency_lower: self.edu_efficiency_lower,
            });
        }
        warnings
    }
}

fn invalid(param: ConfigParam, value: f64, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        param: param.name().to_string(),
        value,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_param_name_round_trips() {
        for param in ConfigParam::ALL {
            assert_eq!(param.name().parse::<ConfigParam>().unwrap(), param);
        }
    }

    #[test]
    fn test_size_must_be_positive_integer() {
        let mut config = SimConfig::default();
        assert!(config.set("N_FAMILIES", 2.5).is_err());
        assert!(config.set("N_FAMILIES", 0.0).is_err());
        assert!(config.set("N_FAMILIES", -4.0).is_err());
        assert_eq!(config.n_families, 50);

        config.set("N_FAMILIES", 8.0).unwrap();
        assert_eq!(config.n_families, 8);
    }

    #[test]
    fn test_bound_ordering_enforced_on_set() {
        let mut config = SimConfig::default();
        let err = config.set("EDU_EFFICIENCY_UPPER", 0.05).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(config.edu_efficiency_upper, 0.9);
    }

    #[test]
    fn test_nan_rejected() {
        let mut config = SimConfig::default();
        assert!(config.set("INCOME_GROWTH", f64::NAN).is_err());
        assert_eq!(config.income_growth, 0.0);
    }

    #[test]
    fn test_instability_policy_parsing() {
        assert_eq!("abort-trial".parse::<InstabilityPolicy>().unwrap(), InstabilityPolicy::AbortTrial);
        assert_eq!("AbortRun".parse::<InstabilityPolicy>().unwrap(), InstabilityPolicy::AbortRun);
        assert!("explode".parse::<InstabilityPolicy>().is_err());
    }
}
