//! Pairwise-column feature library
//!
//! Pure functions over two typed columns of equal length. The general family
//! is always computed; the statistical family dispatches on the pair's
//! variable-type combination (quantitative/quantitative, categorical/
//! categorical, quantitative/categorical). Temporal columns only take part
//! in the general family.

use crate::column::ColumnRecord;
use crate::error::{FeatureError, Result};
use crate::stats::{self, hypothesis};
use crate::types::VariableType;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::{FeatureSpec, FeatureValue};

/// Cost guard on the categorical families: contingency tables and ANOVA
/// partitions are skipped when a side exceeds this many distinct values.
pub const MAX_GROUPS: usize = 50;

/// Fixed-field feature vector for one ordered column pair
#[derive(Debug, Clone, Default, Serialize)]
pub struct PairwiseFeatures {
    // General
    pub has_shared_elements: Option<bool>,
    pub num_shared_elements: Option<f64>,
    pub percent_shared_elements: Option<f64>,
    pub identical: Option<bool>,
    pub has_shared_unique_elements: Option<bool>,
    pub num_shared_unique_elements: Option<f64>,
    pub percent_shared_unique_elements: Option<f64>,
    pub identical_unique: Option<bool>,

    // Quantitative/quantitative
    pub correlation_value: Option<f64>,
    pub correlation_p: Option<f64>,
    pub correlation_significant_005: Option<bool>,
    pub ks_statistic: Option<f64>,
    pub ks_p: Option<f64>,
    pub ks_significant_005: Option<bool>,
    pub percent_range_overlap: Option<f64>,
    pub has_range_overlap: Option<bool>,

    // Categorical/categorical
    pub chi2_statistic: Option<f64>,
    pub chi2_p: Option<f64>,
    pub chi2_significant_005: Option<bool>,
    pub is_nested: Option<bool>,
    pub nestedness: Option<f64>,
    pub nestedness_95: Option<bool>,

    // Quantitative/categorical, either order
    pub one_way_anova_statistic: Option<f64>,
    pub one_way_anova_p: Option<f64>,
    pub one_way_anova_significant_005: Option<bool>,
}

const HEADER: [FeatureSpec; 25] = [
    FeatureSpec::boolean("has_shared_elements"),
    FeatureSpec::numeric("num_shared_elements"),
    FeatureSpec::numeric("percent_shared_elements"),
    FeatureSpec::boolean("identical"),
    FeatureSpec::boolean("has_shared_unique_elements"),
    FeatureSpec::numeric("num_shared_unique_elements"),
    FeatureSpec::numeric("percent_shared_unique_elements"),
    FeatureSpec::boolean("identical_unique"),
    FeatureSpec::numeric("correlation_value"),
    FeatureSpec::numeric("correlation_p"),
    FeatureSpec::boolean("correlation_significant_005"),
    FeatureSpec::numeric("ks_statistic"),
    FeatureSpec::numeric("ks_p"),
    FeatureSpec::boolean("ks_significant_005"),
    FeatureSpec::numeric("percent_range_overlap"),
    FeatureSpec::boolean("has_range_overlap"),
    FeatureSpec::numeric("chi2_statistic"),
    FeatureSpec::numeric("chi2_p"),
    FeatureSpec::boolean("chi2_significant_005"),
    FeatureSpec::boolean("is_nested"),
    FeatureSpec::numeric("nestedness"),
    FeatureSpec::boolean("nestedness_95"),
    FeatureSpec::numeric("one_way_anova_statistic"),
    FeatureSpec::numeric("one_way_anova_p"),
    FeatureSpec::boolean("one_way_anova_significant_005"),
];

/// Static header of the pairwise feature vector
pub fn pairwise_header() -> &'static [FeatureSpec] {
    &HEADER
}

impl PairwiseFeatures {
    /// Values in header order
    pub fn values(&self) -> Vec<FeatureValue> {
        vec![
            self.has_shared_elements.into(),
            self.num_shared_elements.into(),
            self.percent_shared_elements.into(),
            self.identical.into(),
            self.has_shared_unique_elements.into(),
            self.num_shared_unique_elements.into(),
            self.percent_shared_unique_elements.into(),
            self.identical_unique.into(),
            self.correlation_value.into(),
            self.correlation_p.into(),
            self.correlation_significant_005.into(),
            self.ks_statistic.into(),
            self.ks_p.into(),
            self.ks_significant_005.into(),
            self.percent_range_overlap.into(),
            self.has_range_overlap.into(),
            self.chi2_statistic.into(),
            self.chi2_p.into(),
            self.chi2_significant_005.into(),
            self.is_nested.into(),
            self.nestedness.into(),
            self.nestedness_95.into(),
            self.one_way_anova_statistic.into(),
            self.one_way_anova_p.into(),
            self.one_way_anova_significant_005.into(),
        ]
    }
}

/// Compute all pairwise features for two columns of the same table.
///
/// Mismatched lengths are a caller contract violation and fail fast.
pub fn pairwise_features(a: &ColumnRecord, b: &ColumnRecord) -> Result<PairwiseFeatures> {
    if a.len() != b.len() {
        return Err(FeatureError::LengthMismatch {
            a_field: a.field_id.clone(),
            b_field: b.field_id.clone(),
            a_len: a.len(),
            b_len: b.len(),
        });
    }

    let a_vals = a.values.to_vec();
    let b_vals = b.values.to_vec();
    let a_unique = stats::unique_values(&a_vals);
    let b_unique = stats::unique_values(&b_vals);

    let mut f = PairwiseFeatures::default();
    general(&mut f, &a_vals, &b_vals, &a_unique, &b_unique);
    statistical(
        &mut f,
        &a_vals,
        &b_vals,
        &a_unique,
        &b_unique,
        a.variable_type(),
        b.variable_type(),
    );
    Ok(f)
}

fn general(f: &mut PairwiseFeatures, a: &[f64], b: &[f64], a_unique: &[f64], b_unique: &[f64]) {
    if a.is_empty() {
        return;
    }
    let shared = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| x.to_bits() == y.to_bits())
        .count();
    f.has_shared_elements = Some(shared > 0);
    f.num_shared_elements = Some(shared as f64);
    f.percent_shared_elements = Some(shared as f64 / a.len() as f64);
    f.identical = Some(shared == a.len());

    let a_set: HashSet<u64> = a_unique.iter().map(|v| v.to_bits()).collect();
    let b_set: HashSet<u64> = b_unique.iter().map(|v| v.to_bits()).collect();
    let shared_unique = a_set.intersection(&b_set).count();
    f.has_shared_unique_elements = Some(shared_unique > 0);
    f.num_shared_unique_elements = Some(shared_unique as f64);
    f.percent_shared_unique_elements =
        Some(shared_unique as f64 / a_set.len().max(b_set.len()) as f64);
    f.identical_unique = Some(a_set == b_set);
}

fn statistical(
    f: &mut PairwiseFeatures,
    a: &[f64],
    b: &[f64],
    a_unique: &[f64],
    b_unique: &[f64],
    a_vtype: VariableType,
    b_vtype: VariableType,
) {
    use VariableType::{Categorical, Quantitative};

    match (a_vtype, b_vtype) {
        (Quantitative, Quantitative) => {
            if let Some(test) = hypothesis::pearson(a, b) {
                f.correlation_value = Some(test.statistic);
                f.correlation_p = Some(test.p_value);
                f.correlation_significant_005 = Some(test.significant_at(0.05));
            }
            if let Some(test) = hypothesis::ks_two_sample(a, b) {
                f.ks_statistic = Some(test.statistic);
                f.ks_p = Some(test.p_value);
                f.ks_significant_005 = Some(test.significant_at(0.05));
            }
            if let Some((has_overlap, percent)) = range_overlap(a, b) {
                f.has_range_overlap = Some(has_overlap);
                f.percent_range_overlap = Some(percent);
            }
        }
        (Categorical, Categorical) => {
            if a_unique.len() > MAX_GROUPS || b_unique.len() > MAX_GROUPS {
                return;
            }
            if let Some(test) = hypothesis::chi2_contingency(&contingency(a, b)) {
                f.chi2_statistic = Some(test.statistic);
                f.chi2_p = Some(test.p_value);
                f.chi2_significant_005 = Some(test.significant_at(0.05));
            }
            let forward = nestedness(a, b, a_unique);
            let backward = nestedness(b, a, b_unique);
            if let (Some(fw), Some(bw)) = (forward, backward) {
                let score = fw.max(bw);
                f.nestedness = Some(score);
                f.is_nested = Some(score == 1.0);
                f.nestedness_95 = Some(score > 0.95);
            }
        }
        (Quantitative, Categorical) => anova(f, a, b, b_unique),
        (Categorical, Quantitative) => anova(f, b, a, a_unique),
        // Temporal columns only take part in the general family
        _ => {}
    }
}

fn anova(f: &mut PairwiseFeatures, quantitative: &[f64], categorical: &[f64], cat_unique: &[f64]) {
    if cat_unique.len() <= 1 || cat_unique.len() > MAX_GROUPS {
        return;
    }
    let groups: Vec<Vec<f64>> = cat_unique
        .iter()
        .map(|cat| {
            quantitative
                .iter()
                .zip(categorical.iter())
                .filter(|(_, c)| c.to_bits() == cat.to_bits())
                .map(|(q, _)| *q)
                .collect()
        })
        .collect();
    if let Some(test) = hypothesis::one_way_anova(&groups) {
        f.one_way_anova_statistic = Some(test.statistic);
        f.one_way_anova_p = Some(test.p_value);
        f.one_way_anova_significant_005 = Some(test.significant_at(0.05));
    }
}

/// Range overlap of two numeric columns. Containment of one range in the
/// other short-circuits to 1.0; otherwise the fraction is the overlap length
/// over the larger of the two ranges. Symmetric in its arguments.
fn range_overlap(a: &[f64], b: &[f64]) -> Option<(bool, f64)> {
    let (a_min, a_max) = (stats::min(a)?, stats::max(a)?);
    let (b_min, b_max) = (stats::min(b)?, stats::max(b)?);

    let lo = a_min.max(b_min);
    let hi = a_max.min(b_max);
    if hi < lo {
        return Some((false, 0.0));
    }
    // One range contained in the other
    if (a_min >= b_min && a_max <= b_max) || (b_min >= a_min && b_max <= a_max) {
        return Some((true, 1.0));
    }
    let larger = (a_max - a_min).max(b_max - b_min);
    Some((true, (hi - lo) / larger))
}

fn contingency(a: &[f64], b: &[f64]) -> Vec<Vec<f64>> {
    let a_unique = stats::unique_values(a);
    let b_unique = stats::unique_values(b);
    let a_index: HashMap<u64, usize> = a_unique
        .iter()
        .enumerate()
        .map(|(i, v)| (v.to_bits(), i))
        .collect();
    let b_index: HashMap<u64, usize> = b_unique
        .iter()
        .enumerate()
        .map(|(i, v)| (v.to_bits(), i))
        .collect();

    let mut table = vec![vec![0.0; b_unique.len()]; a_unique.len()];
    for (x, y) in a.iter().zip(b.iter()) {
        table[a_index[&x.to_bits()]][b_index[&y.to_bits()]] += 1.0;
    }
    table
}

/// Directional nestedness. For every distinct parent value, collect the set
/// of co-occurring child values; the score is the uniqueness of the
/// concatenation of those sets. 1.0 means each parent value maps to a single
/// distinct child value.
fn nestedness(parent: &[f64], child: &[f64], parent_unique: &[f64]) -> Option<f64> {
    if parent.is_empty() {
        return None;
    }
    let mut co_occurring: Vec<u64> = Vec::new();
    for p in parent_unique {
        let set: HashSet<u64> = parent
            .iter()
            .zip(child.iter())
            .filter(|(x, _)| x.to_bits() == p.to_bits())
            .map(|(_, y)| y.to_bits())
            .collect();
        co_occurring.extend(set);
    }
    if co_occurring.is_empty() {
        return None;
    }
    let distinct: HashSet<u64> = co_occurring.iter().copied().collect();
    Some(distinct.len() as f64 / co_occurring.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;
    use ndarray::{array, Array1};

    fn column(field: &str, dtype: DataType, values: Array1<f64>) -> ColumnRecord {
        ColumnRecord {
            table_id: "t:1".to_string(),
            field_id: format!("t:1:{field}"),
            trace_role: Some("scatter".to_string()),
            is_x_source: false,
            is_y_source: true,
            is_only_x_source: false,
            is_only_y_source: false,
            dtype,
            values,
        }
    }

    #[test]
    fn test_header_matches_values_len() {
        let f = PairwiseFeatures::default();
        assert_eq!(f.values().len(), pairwise_header().len());
    }

    #[test]
    fn test_length_mismatch_fails_fast() {
        let a = column("a", DataType::Integer, array![1.0, 2.0]);
        let b = column("b", DataType::Integer, array![1.0, 2.0, 3.0]);
        let err = pairwise_features(&a, &b).unwrap_err();
        assert!(matches!(err, FeatureError::LengthMismatch { .. }));
    }

    #[test]
    fn test_general_features() {
        let a = column("a", DataType::Integer, array![1.0, 2.0, 3.0, 4.0]);
        let b = column("b", DataType::Integer, array![1.0, 2.0, 9.0, 9.0]);
        let f = pairwise_features(&a, &b).unwrap();
        assert_eq!(f.num_shared_elements, Some(2.0));
        assert_eq!(f.percent_shared_elements, Some(0.5));
        assert_eq!(f.identical, Some(false));
        // Unique sets {1,2,3,4} and {1,2,9}: intersection {1,2} / 4
        assert_eq!(f.num_shared_unique_elements, Some(2.0));
        assert_eq!(f.percent_shared_unique_elements, Some(0.5));
        assert_eq!(f.identical_unique, Some(false));
    }

    #[test]
    fn test_anticorrelated_scenario() {
        let a = column("a", DataType::Integer, array![1.0, 2.0, 3.0, 4.0, 5.0]);
        let b = column("b", DataType::Integer, array![5.0, 4.0, 3.0, 2.0, 1.0]);
        let f = pairwise_features(&a, &b).unwrap();
        assert!((f.correlation_value.unwrap() + 1.0).abs() < 1e-9);
        // Identical value sets drawn from the same distribution
        assert_eq!(f.ks_statistic, Some(0.0));
        assert_eq!(f.has_range_overlap, Some(true));
        assert_eq!(f.percent_range_overlap, Some(1.0));
    }

    #[test]
    fn test_range_overlap_symmetry() {
        let cases = [
            (vec![0.0, 10.0], vec![5.0, 20.0]),
            (vec![0.0, 10.0], vec![12.0, 20.0]),
            (vec![0.0, 100.0], vec![40.0, 60.0]),
        ];
        for (a, b) in cases {
            assert_eq!(range_overlap(&a, &b), range_overlap(&b, &a));
        }
        // Partial overlap: [0,10] vs [5,20] shares 5 over the larger range 15
        let (has, pct) = range_overlap(&[0.0, 10.0], &[5.0, 20.0]).unwrap();
        assert!(has);
        assert!((pct - 5.0 / 15.0).abs() < 1e-12);
        // Disjoint
        assert_eq!(range_overlap(&[0.0, 1.0], &[2.0, 3.0]), Some((false, 0.0)));
        // Containment
        assert_eq!(
            range_overlap(&[0.0, 100.0], &[40.0, 60.0]),
            Some((true, 1.0))
        );
    }

    #[test]
    fn test_nested_categorical_pair() {
        // Each value of a maps to exactly one value of b
        let a = column("a", DataType::Text, array![0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);
        let b = column("b", DataType::Text, array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0]);
        let f = pairwise_features(&a, &b).unwrap();
        // Forward: sets {0},{0},{1} concatenate to 2 unique of 3. Backward:
        // sets {0,1},{2} are disjoint, so that direction scores 1.0.
        assert_eq!(f.nestedness, Some(1.0));
        assert_eq!(f.is_nested, Some(true));
        assert!(f.chi2_statistic.is_some());
    }

    #[test]
    fn test_perfect_nesting_flags() {
        let a = column("a", DataType::Text, array![0.0, 1.0, 2.0, 3.0]);
        let b = column("b", DataType::Text, array![5.0, 6.0, 7.0, 8.0]);
        let f = pairwise_features(&a, &b).unwrap();
        assert_eq!(f.nestedness, Some(1.0));
        assert_eq!(f.is_nested, Some(true));
        assert_eq!(f.nestedness_95, Some(true));
    }

    #[test]
    fn test_categorical_cost_guard() {
        let a_vals: Array1<f64> = (0..60).map(f64::from).collect();
        let b_vals: Array1<f64> = (0..60).map(|i| f64::from(i % 2)).collect();
        let a = column("a", DataType::Text, a_vals);
        let b = column("b", DataType::Text, b_vals);
        let f = pairwise_features(&a, &b).unwrap();
        assert!(f.chi2_statistic.is_none());
        assert!(f.nestedness.is_none());
        // General family is still computed
        assert!(f.num_shared_elements.is_some());
    }

    #[test]
    fn test_anova_either_order() {
        let q = column(
            "q",
            DataType::Decimal,
            array![1.0, 1.1, 0.9, 5.0, 5.2, 4.8],
        );
        let c = column("c", DataType::Text, array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let f_qc = pairwise_features(&q, &c).unwrap();
        let f_cq = pairwise_features(&c, &q).unwrap();
        assert!(f_qc.one_way_anova_statistic.unwrap() > 1.0);
        assert_eq!(f_qc.one_way_anova_statistic, f_cq.one_way_anova_statistic);
        assert_eq!(f_qc.one_way_anova_significant_005, Some(true));
    }

    #[test]
    fn test_anova_skipped_for_single_group() {
        let q = column("q", DataType::Decimal, array![1.0, 2.0, 3.0]);
        let c = column("c", DataType::Text, array![0.0, 0.0, 0.0]);
        let f = pairwise_features(&q, &c).unwrap();
        assert!(f.one_way_anova_statistic.is_none());
    }

    #[test]
    fn test_temporal_pair_gets_general_only() {
        let a = column("a", DataType::DateTime, array![0.0, 60.0, 120.0]);
        let b = column("b", DataType::DateTime, array![0.0, 60.0, 120.0]);
        let f = pairwise_features(&a, &b).unwrap();
        assert_eq!(f.identical, Some(true));
        assert!(f.correlation_value.is_none());
        assert!(f.chi2_statistic.is_none());
    }

    #[test]
    fn test_empty_columns_all_null() {
        let a = column("a", DataType::Integer, array![]);
        let b = column("b", DataType::Integer, array![]);
        let f = pairwise_features(&a, &b).unwrap();
        assert!(f.num_shared_elements.is_none());
        assert!(f.correlation_value.is_none());
    }
}
