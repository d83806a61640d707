//! Human-capital formation, eq (8) through eq (10)
//!
//! Capital develops in the child's context: the income, neighborhood, and
//! tax base of generation t produce the capital that funds generation t+1's
//! earned income.
//!
//! ```text
//! investment_i = taxbase[n] / capacity(pop[n])                       eq (8)
//! skill_i      = f(max(own_i, 1), max(peer_i, 1))                    eq (10)
//! capital_i    = skill_i * investment_i                              eq (9)
//! ```
//!
//! `capacity(pop) = sigmoid(pop) * pop` where the sigmoid rises from
//! `EDU_EFFICIENCY_LOWER` to `EDU_EFFICIENCY_UPPER`, centred at half the
//! population with slope `EDU_EFFICIENCY_STEEPNESS / N_FAMILIES`.
//!
//! `peer_i` is the mean floored income of the other members of the
//! family's neighborhood. A family alone in its neighborhood has no peers
//! and uses its own floored income instead.

use crate::config::{ConfigError, SimConfig};
use crate::mechanisms::neighborhood::{members_by_hood, Census};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Functional form of eq (10)
///
/// Both forms are increasing in own and peer income and complementary
/// between them (positive cross-derivative) for positive coefficients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillFormation {
    /// `SKILL_SCALE * own * peer`
    #[default]
    Product,
    /// `SKILL_SCALE * own^SKILL_FROM_PARENT_INCOME * peer^SKILL_FROM_NEIGHBOR_INCOME`
    CobbDouglas,
}

impl SkillFormation {
    /// Skill score of one family. Inputs are already floored at 1.
    pub fn skill(&self, config: &SimConfig, own: f64, peer: f64) -> f64 {
        match self {
            SkillFormation::Product => config.skill_scale * own * peer,
            SkillFormation::CobbDouglas => {
                config.skill_scale
                    * own.powf(config.skill_from_parent_income)
                    * peer.powf(config.skill_from_neighbor_income)
            }
        }
    }
}

impl fmt::Display for SkillFormation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillFormation::Product => f.write_str("Product"),
            SkillFormation::CobbDouglas => f.write_str("CobbDouglas"),
        }
    }
}

impl FromStr for SkillFormation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "product" => Ok(SkillFormation::Product),
            "cobbdouglas" => Ok(SkillFormation::CobbDouglas),
            _ => Err(ConfigError::UnknownVariant {
                kind: "skill formation",
                value: s.to_string(),
            }),
        }
    }
}

/// Output of one capital-formation step
#[derive(Debug, Clone, PartialEq)]
pub struct HumanCapitalUpdate {
    /// Education investment per family, eq (8)
    pub investment: Vec<f64>,
    /// Skill score per family, eq (10)
    pub skill: Vec<f64>,
    /// Human capital per family, eq (9)
    pub capital: Vec<f64>,
}

/// Generation-0 capital: every family starts at 1.
pub fn initial_capital(n_families: usize) -> Vec<f64> {
    vec![1.0; n_families]
}

/// Effective school capacity of a neighborhood with `pop` members.
///
/// # Example
/// ```
/// use mobility_simulator_core_rs::SimConfig;
/// use mobility_simulator_core_rs::mechanisms::human_capital::edu_efficiency;
///
/// let config = SimConfig { n_families: 50, ..SimConfig::default() };
/// // At the inflection point the multiplier is the midpoint of the bounds
/// let capacity = edu_efficiency(&config, 25);
/// assert!((capacity - 0.5 * 25.0).abs() < 1e-12);
/// ```
pub fn edu_efficiency(config: &SimConfig, pop: usize) -> f64 {
    let n = config.n_families as f64;
    let pop = pop as f64;
    let scale = config.edu_efficiency_steepness / n;
    let inflection = n / 2.0;
    let lower = config.edu_efficiency_lower;
    let upper = config.edu_efficiency_upper;

    let sigmoid = lower + (upper - lower) / (1.0 + (-scale * (pop - inflection)).exp());
    sigmoid * pop
}

/// Education investment per family, eq (8).
pub fn invest_education(
    config: &SimConfig,
    members: &[Vec<usize>],
    census: &Census,
    taxbase: &[f64],
) -> Vec<f64> {
    let mut investment = vec![0.0; config.n_families];
    for (hood, families) in members.iter().enumerate() {
        let pop = census.population.get(hood).copied().unwrap_or(0);
        if pop == 0 {
            // nobody to invest in
            continue;
        }
        let capacity = edu_efficiency(config, pop);
        let revenue = taxbase.get(hood).copied().unwrap_or(0.0);
        // degenerate capacity is surfaced as NaN for the instability check
        let per_family = if capacity > 0.0 { revenue / capacity } else { f64::NAN };
        for &family in families {
            investment[family] = per_family;
        }
    }
    investment
}

/// Skill score per family, eq (10).
pub fn form_skills(config: &SimConfig, income: &[f64], members: &[Vec<usize>]) -> Vec<f64> {
    let mut skill = vec![0.0; income.len()];
    for families in members {
        let floored: Vec<f64> = families.iter().map(|&f| income[f].max(1.0)).collect();
        let total: f64 = floored.iter().sum();
        let size = floored.len();

        for (&family, &own) in families.iter().zip(&floored) {
            let peer = if size > 1 {
                (total - own) / (size - 1) as f64
            } else {
                own
            };
            skill[family] = config.skill_formation.skill(config, own, peer);
        }
    }
    skill
}

/// Full capital-formation step for one generation, eq (9).
///
/// `income`, `assignment`, `census`, and `taxbase` must all describe the
/// same generation.
pub fn develop_human_capital(
    config: &SimConfig,
    income: &[f64],
    assignment: &[usize],
    census: &Census,
    taxbase: &[f64],
) -> HumanCapitalUpdate {
    let members = members_by_hood(assignment, census.hood_count);
    let investment = invest_education(config, &members, census, taxbase);
    let skill = form_skills(config, income, &members);
    let capital = skill.iter().zip(&investment).map(|(s, e)| s * e).collect();

    HumanCapitalUpdate {
        investment,
        skill,
        capital,
    }
}
