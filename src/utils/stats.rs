//! Numeric helpers shared by the aggregator and the comparison engine.
//!
//! Each helper states its own edge-case policy: empty input is "nothing
//! observed" (0), an undefined ratio is NaN or `None`.

use crate::analysis::types::Direction;

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation, 0 for an empty slice
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Jain's fairness index `(Σx)² / (n·Σx²)`.
///
/// Returns `None` for an empty slice or when every value is zero.
pub fn jain_fairness(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    let sum_sq: f64 = values.iter().map(|v| v * v).sum();
    if sum_sq == 0.0 {
        return None;
    }
    Some(sum * sum / (values.len() as f64 * sum_sq))
}

/// Signed relative change of `treatment` over `baseline`, in percent.
///
/// NaN when the baseline is zero or either value is NaN.
pub fn improvement_percent(treatment: f64, baseline: f64, direction: Direction) -> f64 {
    if treatment.is_nan() || baseline.is_nan() || baseline == 0.0 {
        return f64::NAN;
    }
    match direction {
        Direction::HigherIsBetter => (treatment - baseline) / baseline * 100.0,
        Direction::LowerIsBetter => (baseline - treatment) / baseline * 100.0,
    }
}

/// `part / whole * 100`, 0 when `whole` is 0
pub fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}
