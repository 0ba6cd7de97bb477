//! Missing value imputation over typed storage

use crate::types::{DataType, VariableType};
use ndarray::Array1;
use std::collections::HashMap;

/// Fill missing entries (NaN) in place with a deterministic summary
/// statistic: the mean for quantitative and temporal columns, the mode for
/// categorical ones. Returns `false` when the column is unusable — all
/// entries missing, or the mean overflowed — in which case the caller must
/// discard the column.
pub fn fill(values: &mut Array1<f64>, dtype: DataType) -> bool {
    match dtype.variable_type() {
        VariableType::Quantitative | VariableType::Temporal => fill_mean(values),
        VariableType::Categorical => fill_mode(values),
    }
}

fn fill_mean(values: &mut Array1<f64>) -> bool {
    // Infinities are unusable for the mean; demote them to missing first
    for v in values.iter_mut() {
        if v.is_infinite() {
            *v = f64::NAN;
        }
    }

    let mut sum = 0.0;
    let mut count = 0usize;
    for &v in values.iter() {
        if !v.is_nan() {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        return false;
    }
    let mean = sum / count as f64;
    if !mean.is_finite() {
        return false;
    }

    for v in values.iter_mut() {
        if v.is_nan() {
            *v = mean;
        }
    }
    true
}

fn fill_mode(values: &mut Array1<f64>) -> bool {
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for &v in values.iter() {
        if !v.is_nan() {
            *counts.entry(v.to_bits()).or_insert(0) += 1;
        }
    }
    if counts.is_empty() {
        return false;
    }

    // Ties break toward the smallest value so the fill is deterministic
    let mode = counts
        .into_iter()
        .map(|(bits, count)| (f64::from_bits(bits), count))
        .max_by(|(a_val, a_count), (b_val, b_count)| {
            a_count
                .cmp(b_count)
                .then(b_val.partial_cmp(a_val).unwrap_or(std::cmp::Ordering::Equal))
        })
        .map(|(val, _)| val)
        .unwrap_or(f64::NAN);

    for v in values.iter_mut() {
        if v.is_nan() {
            *v = mode;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mean_fill() {
        let mut values = array![1.0, f64::NAN, 3.0, 4.0];
        assert!(fill(&mut values, DataType::Decimal));
        assert!((values[1] - 8.0 / 3.0).abs() < 1e-12);
        assert!(values.iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn test_infinity_becomes_missing_then_mean() {
        let mut values = array![1.0, f64::INFINITY, 3.0];
        assert!(fill(&mut values, DataType::Decimal));
        assert_eq!(values[1], 2.0);
    }

    #[test]
    fn test_all_missing_reports_failure() {
        let mut values = array![f64::NAN, f64::NAN];
        assert!(!fill(&mut values, DataType::Integer));
        assert!(!fill(&mut values, DataType::Text));
    }

    #[test]
    fn test_mode_fill() {
        let mut values = array![0.0, 1.0, 1.0, f64::NAN];
        assert!(fill(&mut values, DataType::Text));
        assert_eq!(values[3], 1.0);
    }

    #[test]
    fn test_mode_tie_breaks_to_smallest() {
        let mut values = array![2.0, 2.0, 5.0, 5.0, f64::NAN];
        assert!(fill(&mut values, DataType::Text));
        assert_eq!(values[4], 2.0);
    }

    #[test]
    fn test_temporal_uses_mean() {
        let mut values = array![100.0, f64::NAN, 300.0];
        assert!(fill(&mut values, DataType::DateTime));
        assert_eq!(values[1], 200.0);
    }

    #[test]
    fn test_empty_column_is_unusable() {
        let mut values: Array1<f64> = array![];
        assert!(!fill(&mut values, DataType::Decimal));
    }
}
