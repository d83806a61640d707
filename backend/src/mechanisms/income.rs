//! Intergenerational income transition, eq (1) and eq (4)
//!
//! ```text
//! offspring_income = INCOME_GROWTH
//!                  + PARENTAL_INVESTMENT_COEF * parent_income
//!                  + earned_income
//!                  + income_shock
//!                  + INCOME_NOISE_AUTOREG * previous_noise
//!
//! earned_income = CAPITAL_EFFICIENCY * parent_capital * N(1, SKILL_NOISE_SD)
//! income_shock  = INCOME_NOISE_ADDITIVE * N(0, 1)
//! ```
//!
//! The noise carried to the next generation is the innovation
//! `income_shock + inherited_shock`, which makes epsilon an MA(1) process.

use crate::config::SimConfig;
use crate::rng::RngManager;

/// Result of one income transition
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeUpdate {
    /// Pre-tax income of the new generation
    pub income: Vec<f64>,
    /// Noise state to carry into the next generation
    pub noise: Vec<f64>,
}

/// Generation-0 income and noise: every family starts at 1 with no shock.
pub fn initial_income(n_families: usize) -> (Vec<f64>, Vec<f64>) {
    (vec![1.0; n_families], vec![0.0; n_families])
}

/// Return on the capital a family accumulated as a child, eq (4).
///
/// Always draws one multiplier per family so the random stream does not
/// depend on coefficient values.
pub fn earn_income(config: &SimConfig, parent_capital: &[f64], rng: &mut RngManager) -> Vec<f64> {
    let multipliers = rng.normal_vec(parent_capital.len(), 1.0, config.skill_noise_sd, None);
    parent_capital
        .iter()
        .zip(multipliers)
        .map(|(capital, m)| config.capital_efficiency * capital * m)
        .collect()
}

/// One intergenerational step of eq (1).
///
/// `earned` is the output of [`earn_income`] for the same generation.
pub fn gain_income(
    config: &SimConfig,
    parent_income: &[f64],
    parent_noise: &[f64],
    earned: &[f64],
    rng: &mut RngManager,
) -> IncomeUpdate {
    let n = parent_income.len();
    let shocks = rng.normal_vec(n, 0.0, 1.0, config.income_shock_floor);

    let mut income = Vec::with_capacity(n);
    let mut noise = Vec::with_capacity(n);
    for i in 0..n {
        let income_shock = config.income_noise_additive * shocks[i];
        let inherited_shock = config.income_noise_autoreg * parent_noise[i];
        let innovation = income_shock + inherited_shock;

        income.push(
            config.income_growth
                + config.parental_investment_coef * parent_income[i]
                + earned[i]
                + innovation,
        );
        noise.push(innovation);
    }

    IncomeUpdate { income, noise }
}
