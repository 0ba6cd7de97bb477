//! Numerically careful descriptive statistics over f64 slices
//!
//! Every function returns `None` instead of panicking or producing NaN when
//! its precondition is not met (empty input, zero variance). Degenerate data
//! is an expected condition in a heterogeneous corpus, not a fault.

pub mod hypothesis;

use std::cmp::Ordering;
use std::collections::HashMap;

/// Arithmetic mean; `None` on empty input
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance; `None` on empty input
pub fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64)
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Sample variance (ddof = 1); `None` with fewer than two observations
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64)
}

/// Copy sorted ascending, NaN-tolerant
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Median; `None` on empty input
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted_copy(values);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

/// Percentile in [0, 100] with linear interpolation between order statistics
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }
    let sorted = sorted_copy(values);
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = rank - lo as f64;
    Some(sorted[lo] * (1.0 - frac) + sorted[hi] * frac)
}

pub fn min(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().copied().fold(f64::INFINITY, f64::min))
}

pub fn max(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// Central moment of order `order`: mean of (x - mean)^order
pub fn central_moment(values: &[f64], order: i32) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(order)).sum::<f64>() / values.len() as f64)
}

/// Biased skewness g1 = m3 / m2^1.5; `None` on zero variance
pub fn skewness(values: &[f64]) -> Option<f64> {
    let m2 = central_moment(values, 2)?;
    if m2 == 0.0 {
        return None;
    }
    let m3 = central_moment(values, 3)?;
    Some(m3 / m2.powf(1.5))
}

/// Excess kurtosis g2 = m4 / m2^2 - 3; `None` on zero variance
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    let m2 = central_moment(values, 2)?;
    if m2 == 0.0 {
        return None;
    }
    let m4 = central_moment(values, 4)?;
    Some(m4 / m2.powi(2) - 3.0)
}

/// Shannon entropy (natural log) of the histogram described by `counts`,
/// normalized to a probability distribution
pub fn entropy(counts: &[f64]) -> Option<f64> {
    let total: f64 = counts.iter().sum();
    if counts.is_empty() || total <= 0.0 {
        return None;
    }
    Some(
        counts
            .iter()
            .filter(|&&c| c > 0.0)
            .map(|&c| {
                let p = c / total;
                -p * p.ln()
            })
            .sum(),
    )
}

/// Occurrence count of each distinct value (bit-exact equality)
pub fn value_counts(values: &[f64]) -> Vec<f64> {
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for &v in values {
        *counts.entry(v.to_bits()).or_insert(0) += 1;
    }
    counts.into_values().map(|c| c as f64).collect()
}

/// Distinct values sorted ascending (bit-exact equality)
pub fn unique_values(values: &[f64]) -> Vec<f64> {
    let mut unique = sorted_copy(values);
    unique.dedup_by(|a, b| a.to_bits() == b.to_bits());
    unique
}
