//! Numerical-instability diagnostics

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transition step at which a non-finite value was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstabilityStage {
    /// `CAPITAL_EFFICIENCY * capital * multiplier`
    EarnedIncome,
    /// Full eq (1) income update
    Income,
    /// Per-family education investment (tax base over school capacity)
    EducationInvestment,
    /// `skill * education investment`
    HumanCapital,
}

impl fmt::Display for InstabilityStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstabilityStage::EarnedIncome => "earned income",
            InstabilityStage::Income => "income",
            InstabilityStage::EducationInvestment => "education investment",
            InstabilityStage::HumanCapital => "human capital",
        };
        f.write_str(name)
    }
}

/// One detected instability: where, when, and which families
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstabilityReport {
    pub generation: usize,
    pub stage: InstabilityStage,
    /// Families whose value was NaN or infinite
    pub families: Vec<usize>,
}

/// Scan `values` for non-finite entries.
///
/// Returns `None` when every value is finite.
///
/// # Example
/// ```
/// use mobility_simulator_core_rs::models::diagnostics::{check_finite, InstabilityStage};
///
/// assert!(check_finite(&[1.0, 2.0], 3, InstabilityStage::Income).is_none());
///
/// let report = check_finite(&[1.0, f64::INFINITY, f64::NAN], 3, InstabilityStage::Income).unwrap();
/// assert_eq!(report.families, vec![1, 2]);
/// assert_eq!(report.generation, 3);
/// ```
pub fn check_finite(
    values: &[f64],
    generation: usize,
    stage: InstabilityStage,
) -> Option<InstabilityReport> {
    let families: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_finite())
        .map(|(i, _)| i)
        .collect();

    if families.is_empty() {
        None
    } else {
        Some(InstabilityReport {
            generation,
            stage,
            families,
        })
    }
}
