//! Guarded statistics helpers.
//!
//! Every function here returns a finite number. Empty samples and zero
//! denominators yield 0 rather than NaN or infinity.

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::DistributionStats;

/// `numerator / denominator`, or 0 when the denominator is zero or invalid.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        return 0.0;
    }
    finite_or_zero(numerator / denominator)
}

/// `part / whole * 100`, or 0 when `whole` is zero.
pub fn percentage(part: u64, whole: u64) -> f64 {
    safe_div(part as f64 * 100.0, whole as f64)
}

pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Reject a non-finite value so the analyzer fails instead of leaking it.
pub fn ensure_finite(name: &'static str, value: f64) -> AnalysisResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnalysisError::NonFinite(name))
    }
}

pub fn mean(values: &[f64]) -> f64 {
    safe_div(values.iter().sum(), values.len() as f64)
}

/// Element at index `floor(q * n)` of an ascending sample, clamped to the
/// last element. `q = 0.5` gives the upper median for even samples.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((q * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
    sorted[index]
}

/// Mean, median and 90th percentile of a sample.
pub fn distribution(values: &[f64]) -> DistributionStats {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return DistributionStats::default();
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    DistributionStats {
        sample_size: sorted.len() as u64,
        average: mean(&sorted),
        median: quantile_sorted(&sorted, 0.5),
        p90: quantile_sorted(&sorted, 0.9),
    }
}

/// Pearson correlation coefficient, clamped to [-1, 1].
///
/// Returns 0 for mismatched or empty samples and when either series has
/// zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.is_empty() {
        return 0.0;
    }

    let mean_x = mean(xs);
    let mean_y = mean(ys);

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    safe_div(cov, denominator).clamp(-1.0, 1.0)
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    finite_or_zero((value * 10.0).round() / 10.0)
}
