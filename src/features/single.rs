//! Single-column feature library
//!
//! Pure functions over one fully-typed, fully-imputed column. Four families:
//! basic, uniqueness, statistical, sequence. For categorical and temporal
//! columns the statistical family runs over the value-count histogram
//! (category frequencies as the sample) rather than the raw values.

use crate::stats::{self, hypothesis};
use crate::types::{DataType, VariableType};
use ndarray::Array1;
use serde::Serialize;

use super::{FeatureSpec, FeatureValue};

/// Cost guard shared with the pairwise library is not needed here; the only
/// sample-size precondition is the normality test's.
const NORMALITY_MIN_SAMPLES: usize = 8;

/// Fixed-field feature vector for one column
#[derive(Debug, Clone, Default, Serialize)]
pub struct SingleColumnFeatures {
    // Basic
    pub length: Option<f64>,
    pub data_type_is_integer: Option<bool>,
    pub data_type_is_decimal: Option<bool>,
    pub data_type_is_string: Option<bool>,
    pub data_type_is_bool: Option<bool>,
    pub data_type_is_datetime: Option<bool>,
    pub var_type_is_quantitative: Option<bool>,
    pub var_type_is_categorical: Option<bool>,
    pub var_type_is_temporal: Option<bool>,

    // Uniqueness
    pub num_unique_elements: Option<f64>,
    pub unique_percent: Option<f64>,
    pub is_unique: Option<bool>,

    // Statistical
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub var: Option<f64>,
    pub std: Option<f64>,
    pub coeff_var: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub range: Option<f64>,
    pub entropy: Option<f64>,
    pub q25: Option<f64>,
    pub q75: Option<f64>,
    pub med_abs_dev: Option<f64>,
    pub avg_abs_dev: Option<f64>,
    pub quant_coeff_disp: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
    pub moment_5: Option<f64>,
    pub moment_6: Option<f64>,
    pub moment_7: Option<f64>,
    pub moment_8: Option<f64>,
    pub moment_9: Option<f64>,
    pub moment_10: Option<f64>,
    pub percent_outliers_15iqr: Option<f64>,
    pub percent_outliers_3iqr: Option<f64>,
    pub percent_outliers_1_99: Option<f64>,
    pub percent_outliers_3std: Option<f64>,
    pub has_outliers_15iqr: Option<bool>,
    pub has_outliers_3iqr: Option<bool>,
    pub has_outliers_1_99: Option<bool>,
    pub has_outliers_3std: Option<bool>,
    pub normality_statistic: Option<f64>,
    pub normality_p: Option<f64>,
    pub is_normal_5: Option<bool>,
    pub is_normal_1: Option<bool>,

    // Sequence
    pub is_sorted: Option<bool>,
    pub is_monotonic: Option<bool>,
    pub sortedness: Option<f64>,
    pub lin_space_sequence_coeff: Option<f64>,
    pub log_space_sequence_coeff: Option<f64>,
    pub is_lin_space: Option<bool>,
    pub is_log_space: Option<bool>,
}

const HEADER: [FeatureSpec; 53] = [
    FeatureSpec::numeric("length"),
    FeatureSpec::boolean("data_type_is_integer"),
    FeatureSpec::boolean("data_type_is_decimal"),
    FeatureSpec::boolean("data_type_is_string"),
    FeatureSpec::boolean("data_type_is_bool"),
    FeatureSpec::boolean("data_type_is_datetime"),
    FeatureSpec::boolean("var_type_is_quantitative"),
    FeatureSpec::boolean("var_type_is_categorical"),
    FeatureSpec::boolean("var_type_is_temporal"),
    FeatureSpec::numeric("num_unique_elements"),
    FeatureSpec::numeric("unique_percent"),
    FeatureSpec::boolean("is_unique"),
    FeatureSpec::numeric("mean"),
    FeatureSpec::numeric("median"),
    FeatureSpec::numeric("var"),
    FeatureSpec::numeric("std"),
    FeatureSpec::numeric("coeff_var"),
    FeatureSpec::numeric("min"),
    FeatureSpec::numeric("max"),
    FeatureSpec::numeric("range"),
    FeatureSpec::numeric("entropy"),
    FeatureSpec::numeric("q25"),
    FeatureSpec::numeric("q75"),
    FeatureSpec::numeric("med_abs_dev"),
    FeatureSpec::numeric("avg_abs_dev"),
    FeatureSpec::numeric("quant_coeff_disp"),
    FeatureSpec::numeric("skewness"),
    FeatureSpec::numeric("kurtosis"),
    FeatureSpec::numeric("moment_5"),
    FeatureSpec::numeric("moment_6"),
    FeatureSpec::numeric("moment_7"),
    FeatureSpec::numeric("moment_8"),
    FeatureSpec::numeric("moment_9"),
    FeatureSpec::numeric("moment_10"),
    FeatureSpec::numeric("percent_outliers_15iqr"),
    FeatureSpec::numeric("percent_outliers_3iqr"),
    FeatureSpec::numeric("percent_outliers_1_99"),
    FeatureSpec::numeric("percent_outliers_3std"),
    FeatureSpec::boolean("has_outliers_15iqr"),
    FeatureSpec::boolean("has_outliers_3iqr"),
    FeatureSpec::boolean("has_outliers_1_99"),
    FeatureSpec::boolean("has_outliers_3std"),
    FeatureSpec::numeric("normality_statistic"),
    FeatureSpec::numeric("normality_p"),
    FeatureSpec::boolean("is_normal_5"),
    FeatureSpec::boolean("is_normal_1"),
    FeatureSpec::boolean("is_sorted"),
    FeatureSpec::boolean("is_monotonic"),
    FeatureSpec::numeric("sortedness"),
    FeatureSpec::numeric("lin_space_sequence_coeff"),
    FeatureSpec::numeric("log_space_sequence_coeff"),
    FeatureSpec::boolean("is_lin_space"),
    FeatureSpec::boolean("is_log_space"),
];

/// Static header of the single-column feature vector
pub fn single_column_header() -> &'static [FeatureSpec] {
    &HEADER
}

impl SingleColumnFeatures {
    /// Values in header order
    pub fn values(&self) -> Vec<FeatureValue> {
        vec![
            self.length.into(),
            self.data_type_is_integer.into(),
            self.data_type_is_decimal.into(),
            self.data_type_is_string.into(),
            self.data_type_is_bool.into(),
            self.data_type_is_datetime.into(),
            self.var_type_is_quantitative.into(),
            self.var_type_is_categorical.into(),
            self.var_type_is_temporal.into(),
            self.num_unique_elements.into(),
            self.unique_percent.into(),
            self.is_unique.into(),
            self.mean.into(),
            self.median.into(),
            self.var.into(),
            self.std.into(),
            self.coeff_var.into(),
            self.min.into(),
            self.max.into(),
            self.range.into(),
            self.entropy.into(),
            self.q25.into(),
            self.q75.into(),
            self.med_abs_dev.into(),
            self.avg_abs_dev.into(),
            self.quant_coeff_disp.into(),
            self.skewness.into(),
            self.kurtosis.into(),
            self.moment_5.into(),
            self.moment_6.into(),
            self.moment_7.into(),
            self.moment_8.into(),
            self.moment_9.into(),
            self.moment_10.into(),
            self.percent_outliers_15iqr.into(),
            self.percent_outliers_3iqr.into(),
            self.percent_outliers_1_99.into(),
            self.percent_outliers_3std.into(),
            self.has_outliers_15iqr.into(),
            self.has_outliers_3iqr.into(),
            self.has_outliers_1_99.into(),
            self.has_outliers_3std.into(),
            self.normality_statistic.into(),
            self.normality_p.into(),
            self.is_normal_5.into(),
            self.is_normal_1.into(),
            self.is_sorted.into(),
            self.is_monotonic.into(),
            self.sortedness.into(),
            self.lin_space_sequence_coeff.into(),
            self.log_space_sequence_coeff.into(),
            self.is_lin_space.into(),
            self.is_log_space.into(),
        ]
    }
}

/// Compute all four feature families for one typed column
pub fn single_column_features(values: &Array1<f64>, dtype: DataType) -> SingleColumnFeatures {
    let vtype = dtype.variable_type();
    let v = values.to_vec();

    let mut f = SingleColumnFeatures::default();
    basic(&mut f, &v, dtype, vtype);
    uniqueness(&mut f, &v, dtype, vtype);
    statistical(&mut f, &v, vtype);
    sequence(&mut f, &v, vtype);
    f
}

fn basic(f: &mut SingleColumnFeatures, v: &[f64], dtype: DataType, vtype: VariableType) {
    f.length = Some(v.len() as f64);
    f.data_type_is_integer = Some(dtype == DataType::Integer);
    f.data_type_is_decimal = Some(dtype == DataType::Decimal);
    f.data_type_is_string = Some(dtype == DataType::Text);
    f.data_type_is_bool = Some(dtype == DataType::Boolean);
    f.data_type_is_datetime = Some(dtype == DataType::DateTime);
    f.var_type_is_quantitative = Some(vtype == VariableType::Quantitative);
    f.var_type_is_categorical = Some(vtype == VariableType::Categorical);
    f.var_type_is_temporal = Some(vtype == VariableType::Temporal);
}

// Uniqueness is meaningful for discrete domains only: categorical and
// temporal columns, plus integer columns. Quantitative floats stay null.
fn uniqueness(f: &mut SingleColumnFeatures, v: &[f64], dtype: DataType, vtype: VariableType) {
    if v.is_empty() {
        return;
    }
    let discrete = matches!(vtype, VariableType::Categorical | VariableType::Temporal)
        || dtype == DataType::Integer;
    if !discrete {
        return;
    }
    let n_unique = stats::unique_values(v).len();
    f.num_unique_elements = Some(n_unique as f64);
    f.unique_percent = Some(n_unique as f64 / v.len() as f64);
    f.is_unique = Some(n_unique == v.len());
}

fn statistical(f: &mut SingleColumnFeatures, v: &[f64], vtype: VariableType) {
    if v.is_empty() {
        return;
    }

    // Categorical and temporal samples are the category frequencies, not the
    // raw values.
    let histogram = matches!(vtype, VariableType::Categorical | VariableType::Temporal);
    let sample: Vec<f64> = if histogram {
        stats::value_counts(v)
    } else {
        v.to_vec()
    };

    let sample_mean = stats::mean(&sample);
    let sample_var = stats::variance(&sample);
    let sample_std = stats::std_dev(&sample);
    let sample_median = stats::median(&sample);
    let sample_min = stats::min(&sample);
    let sample_max = stats::max(&sample);

    f.mean = sample_mean;
    f.median = sample_median;
    f.var = sample_var;
    f.std = sample_std;
    f.coeff_var = match (sample_var, sample_mean) {
        (Some(var), Some(mean)) if var != 0.0 && mean != 0.0 => Some(var / mean),
        _ => None,
    };
    f.min = sample_min;
    f.max = sample_max;
    f.range = match (sample_max, sample_min) {
        (Some(hi), Some(lo)) => Some(hi - lo),
        _ => None,
    };

    if histogram {
        f.entropy = stats::entropy(&sample);
    }

    let q1 = stats::percentile(&sample, 1.0);
    let q25 = stats::percentile(&sample, 25.0);
    let q75 = stats::percentile(&sample, 75.0);
    let q99 = stats::percentile(&sample, 99.0);
    f.q25 = q25;
    f.q75 = q75;

    if let Some(med) = sample_median {
        let abs_dev: Vec<f64> = sample.iter().map(|x| (x - med).abs()).collect();
        f.med_abs_dev = stats::median(&abs_dev);
    }
    if let Some(m) = sample_mean {
        let abs_dev: Vec<f64> = sample.iter().map(|x| (x - m).abs()).collect();
        f.avg_abs_dev = stats::mean(&abs_dev);
    }
    f.quant_coeff_disp = match (q75, q25) {
        (Some(hi), Some(lo)) if hi + lo != 0.0 => Some((hi - lo) / (hi + lo)),
        _ => None,
    };

    f.skewness = stats::skewness(&sample);
    f.kurtosis = stats::kurtosis(&sample);
    f.moment_5 = stats::central_moment(&sample, 5);
    f.moment_6 = stats::central_moment(&sample, 6);
    f.moment_7 = stats::central_moment(&sample, 7);
    f.moment_8 = stats::central_moment(&sample, 8);
    f.moment_9 = stats::central_moment(&sample, 9);
    f.moment_10 = stats::central_moment(&sample, 10);

    // Four outlier fences over the same sample
    if let (Some(q25), Some(q75)) = (q25, q75) {
        let iqr = q75 - q25;
        let (pct, has) = outlier_rate(&sample, q25 - 1.5 * iqr, q75 + 1.5 * iqr);
        f.percent_outliers_15iqr = Some(pct);
        f.has_outliers_15iqr = Some(has);
        let (pct, has) = outlier_rate(&sample, q25 - 3.0 * iqr, q75 + 3.0 * iqr);
        f.percent_outliers_3iqr = Some(pct);
        f.has_outliers_3iqr = Some(has);
    }
    if let (Some(q1), Some(q99)) = (q1, q99) {
        let (pct, has) = outlier_rate(&sample, q1, q99);
        f.percent_outliers_1_99 = Some(pct);
        f.has_outliers_1_99 = Some(has);
    }
    if let (Some(m), Some(sd)) = (sample_mean, sample_std) {
        let (pct, has) = outlier_rate(&sample, m - 3.0 * sd, m + 3.0 * sd);
        f.percent_outliers_3std = Some(pct);
        f.has_outliers_3std = Some(has);
    }

    if sample.len() >= NORMALITY_MIN_SAMPLES {
        if let Some(test) = hypothesis::normality(&sample) {
            f.normality_statistic = Some(test.statistic);
            f.normality_p = Some(test.p_value);
            f.is_normal_5 = Some(test.significant_at(0.05));
            f.is_normal_1 = Some(test.significant_at(0.01));
        }
    }
}

fn outlier_rate(sample: &[f64], lo: f64, hi: f64) -> (f64, bool) {
    let outliers = sample.iter().filter(|&&x| x < lo || x > hi).count();
    (outliers as f64 / sample.len() as f64, outliers > 0)
}

fn sequence(f: &mut SingleColumnFeatures, v: &[f64], vtype: VariableType) {
    if v.is_empty() {
        return;
    }
    let sorted = stats::sorted_copy(v);
    let already_sorted = v
        .iter()
        .zip(sorted.iter())
        .all(|(a, b)| a.to_bits() == b.to_bits());
    f.is_sorted = Some(already_sorted);

    if vtype == VariableType::Categorical {
        return;
    }

    // Temporal values are already ordinal (epoch seconds), so the same
    // difference-based checks apply to both remaining classes.
    let diffs: Vec<f64> = v.windows(2).map(|w| w[1] - w[0]).collect();
    f.is_monotonic = Some(diffs.iter().all(|&d| d >= 0.0) || diffs.iter().all(|&d| d <= 0.0));
    f.sortedness = hypothesis::pearson(v, &sorted).map(|t| t.statistic.abs());

    if vtype != VariableType::Quantitative {
        return;
    }

    let sorted_diffs: Vec<f64> = sorted.windows(2).map(|w| w[1] - w[0]).collect();
    f.lin_space_sequence_coeff = spacing_coeff(&sorted_diffs);
    f.is_lin_space = f.lin_space_sequence_coeff.map(|c| c <= 0.001);

    if sorted.windows(2).all(|w| w[1] != 0.0) {
        let ratios: Vec<f64> = sorted.windows(2).map(|w| w[0] / w[1]).collect();
        f.log_space_sequence_coeff = spacing_coeff(&ratios);
        f.is_log_space = f.log_space_sequence_coeff.map(|c| c <= 0.001);
    }
}

// Standard deviation of successive steps divided by their mean; null when
// there are no steps or the mean step is zero.
fn spacing_coeff(steps: &[f64]) -> Option<f64> {
    if steps.is_empty() {
        return None;
    }
    let m = stats::mean(steps)?;
    if m == 0.0 {
        return None;
    }
    Some(stats::std_dev(steps)? / m)
}
