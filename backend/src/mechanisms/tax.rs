//! Flat proportional tax and per-neighborhood revenue pooling
//!
//! Only strictly positive income is taxed. Revenue collected in a
//! neighborhood stays there as its tax base for education investment.

use crate::mechanisms::neighborhood::NeighborhoodError;

/// Post-tax income plus the pooled revenue of each neighborhood
#[derive(Debug, Clone, PartialEq)]
pub struct TaxOutcome {
    pub income_after_tax: Vec<f64>,
    /// Length `hood_count`
    pub taxbase: Vec<f64>,
}

impl TaxOutcome {
    /// Revenue summed over all neighborhoods
    pub fn total_revenue(&self) -> f64 {
        self.taxbase.iter().sum()
    }
}

/// Per-family tax: `max(income, 0) * rate`.
pub fn compute_taxes(income: &[f64], tax_rate: f64) -> Vec<f64> {
    income
        .iter()
        .map(|&y| if y > 0.0 { y * tax_rate } else { 0.0 })
        .collect()
}

/// Tax one generation and pool the revenue by neighborhood.
///
/// # Errors
///
/// * `NoNeighborhoods` if `hood_count` is zero
/// * `LengthMismatch` if income and assignment rows differ in length
/// * `UnknownNeighborhood` if a family points past `hood_count`
///
/// # Example
/// ```
/// use mobility_simulator_core_rs::mechanisms::tax::collect_taxes;
///
/// let outcome = collect_taxes(&[1.0, 1.0, -1.0, 3.0], &[0, 0, 1, 1], 2, 0.5).unwrap();
/// assert_eq!(outcome.income_after_tax, vec![0.5, 0.5, -1.0, 1.5]);
/// assert_eq!(outcome.taxbase, vec![1.0, 1.5]);
/// ```
pub fn collect_taxes(
    income: &[f64],
    assignment: &[usize],
    hood_count: usize,
    tax_rate: f64,
) -> Result<TaxOutcome, NeighborhoodError> {
    if hood_count == 0 {
        return Err(NeighborhoodError::NoNeighborhoods);
    }
    if income.len() != assignment.len() {
        return Err(NeighborhoodError::LengthMismatch {
            expected: income.len(),
            actual: assignment.len(),
        });
    }

    let taxes = compute_taxes(income, tax_rate);
    let mut taxbase = vec![0.0; hood_count];
    for (family, (&hood, &tax)) in assignment.iter().zip(&taxes).enumerate() {
        let slot = taxbase
            .get_mut(hood)
            .ok_or(NeighborhoodError::UnknownNeighborhood { family, hood, hood_count })?;
        *slot += tax;
    }

    let income_after_tax = income.iter().zip(&taxes).map(|(y, t)| y - t).collect();

    Ok(TaxOutcome {
        income_after_tax,
        taxbase,
    })
}
