//! Empirical distribution helpers shared by the consistency tests.

/// Fraction of ensemble values at or below the observed value.
///
/// This is the consistency-test quantile: for the empirical distribution
/// `{5, 6, 7}` and an observation of `6` it yields `2/3`.
pub fn empirical_quantile(values: &[f64], observed: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let at_or_below = values.iter().filter(|&&value| value <= observed).count();
    at_or_below as f64 / values.len() as f64
}

/// Sorts a value vector ascending with a total order over finite floats.
pub fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    values
}

/// Linearly interpolated percentile over a sorted slice.
pub fn percentile(sorted_values: &[f64], quantile: f64) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }
    let position = quantile.clamp(0.0, 1.0) * (sorted_values.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted_values[lower]
    } else {
        let weight = position - lower as f64;
        sorted_values[lower] * (1.0 - weight) + sorted_values[upper] * weight
    }
}

/// Aki maximum-likelihood b-value estimate for a magnitude sample.
///
/// Returns `None` when the sample is empty or its mean does not exceed the
/// corrected completeness magnitude, where the estimator degenerates.
pub fn aki_b_value(magnitudes: &[f64], completeness: f64, bin_width: f64) -> Option<f64> {
    if magnitudes.is_empty() {
        return None;
    }
    let mean = magnitudes.iter().sum::<f64>() / magnitudes.len() as f64;
    let corrected = completeness - bin_width / 2.0;
    if mean <= corrected {
        return None;
    }
    Some(std::f64::consts::LOG10_E / (mean - corrected))
}
