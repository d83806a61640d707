//! Cross-family summary statistics
//!
//! All functions reduce one generation's row (one value per family).

/// Arithmetic mean. Zero for an empty row.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 divisor). Zero for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Discrete Lorenz curve ordinates, one per family.
///
/// Values are shifted up by the minimum when it is negative (a positive
/// minimum is never subtracted), sorted ascending, and cumulated. Each
/// ordinate is the midpoint of the cumulative share before and after the
/// family, normalised by the shifted total; all ordinates are 0 when the
/// total is 0.
pub fn lorenz_curve(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let shift = if min < 0.0 { min } else { 0.0 };

    let mut shifted: Vec<f64> = values.iter().map(|v| v - shift).collect();
    let total: f64 = shifted.iter().sum();
    shifted.sort_by(|a, b| a.total_cmp(b));

    let mut lorenz = Vec::with_capacity(shifted.len());
    let mut before = 0.0;
    for v in shifted {
        let after = before + v;
        let ordinate = if total > 0.0 {
            (before + after) / (2.0 * total)
        } else {
            0.0
        };
        lorenz.push(ordinate);
        before = after;
    }
    lorenz
}

/// Gini coefficient as `0.5 - mean(Lorenz curve)`.
///
/// This is the area between the line of equality and the Lorenz curve, so
/// it is 0 for a perfectly equal row and approaches 0.5 as one family holds
/// everything. An all-zero row has a zero Lorenz curve and reports 0.5.
///
/// # Example
/// ```
/// use mobility_simulator_core_rs::results::stats::gini;
///
/// assert_eq!(gini(&[3.0, 3.0, 3.0, 3.0]), 0.0);
/// assert!((gini(&[0.0, 0.0, 0.0, 1.0]) - 0.375).abs() < 1e-12);
/// ```
pub fn gini(values: &[f64]) -> f64 {
    0.5 - mean(&lorenz_curve(values))
}
