//! Fairness metrics over per-group accuracies.

/// Gap between the mean accuracy and the worst group's accuracy, rounded to
/// four decimal places.
///
/// Returns 0.0 for an empty slice.
pub fn measure_race_gap(accuracies: &[f64]) -> f64 {
    if accuracies.is_empty() {
        return 0.0;
    }
    let min = accuracies.iter().copied().fold(f64::INFINITY, f64::min);
    let avg = accuracies.iter().sum::<f64>() / accuracies.len() as f64;
    round_to(avg - min, 4)
}

/// Round to `decimals` places, ties to even (NumPy's `round`).
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}
