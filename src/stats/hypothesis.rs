//! Hypothesis tests used by the feature libraries
//!
//! P-values use closed-form approximations (Abramowitz-Stegun erf,
//! Wilson-Hilferty chi-square, asymptotic Kolmogorov series, normal-
//! approximated t) rather than exact distribution functions. Formulas and
//! edge-case policies are what matter downstream; every test returns `None`
//! on degenerate input instead of a fabricated result.

use super::{central_moment, mean, sorted_copy};
use std::cmp::Ordering;

/// Statistic plus p-value of one test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestOutcome {
    pub fn significant_at(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Pearson correlation with a two-sided p-value.
///
/// `None` when the samples are shorter than 2 or either side has zero
/// variance (the coefficient is undefined there).
pub fn pearson(a: &[f64], b: &[f64]) -> Option<TestOutcome> {
    let n = a.len();
    if n < 2 || n != b.len() {
        return None;
    }
    let mean_a = mean(a)?;
    let mean_b = mean(b)?;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..n {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    let r = (cov / (var_a * var_b).sqrt()).clamp(-1.0, 1.0);

    let p_value = if n <= 2 || (1.0 - r * r) <= 0.0 {
        0.0
    } else {
        let df = (n - 2) as f64;
        let t = r * (df / (1.0 - r * r)).sqrt();
        t_to_p(t.abs(), df)
    };

    Some(TestOutcome {
        statistic: r,
        p_value,
    })
}

/// Two-sample Kolmogorov-Smirnov test: maximum absolute difference between
/// the two empirical CDFs, with the asymptotic Kolmogorov p-value.
pub fn ks_two_sample(a: &[f64], b: &[f64]) -> Option<TestOutcome> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let a_sorted = sorted_copy(a);
    let b_sorted = sorted_copy(b);

    let mut combined: Vec<f64> = a_sorted.iter().chain(b_sorted.iter()).copied().collect();
    combined.sort_by(|x, y| x.partial_cmp(y).unwrap_or(Ordering::Equal));
    combined.dedup();

    let statistic = combined
        .iter()
        .map(|&x| (ecdf(&a_sorted, x) - ecdf(&b_sorted, x)).abs())
        .fold(0.0, f64::max);

    let en = (a.len() * b.len()) as f64 / (a.len() + b.len()) as f64;
    let lambda = (en.sqrt() + 0.12 + 0.11 / en.sqrt()) * statistic;

    Some(TestOutcome {
        statistic,
        p_value: ks_p_value(lambda),
    })
}

fn ecdf(sorted_data: &[f64], x: f64) -> f64 {
    let count = sorted_data.partition_point(|&v| v <= x);
    count as f64 / sorted_data.len() as f64
}

/// Chi-squared test of independence on a contingency table (rows = values of
/// one column, columns = values of the other, cells = co-occurrence counts).
/// No continuity correction is applied. `None` for degenerate tables.
pub fn chi2_contingency(table: &[Vec<f64>]) -> Option<TestOutcome> {
    let n_rows = table.len();
    let n_cols = table.first().map(Vec::len).unwrap_or(0);
    if n_rows < 1 || n_cols < 1 {
        return None;
    }

    let row_totals: Vec<f64> = table.iter().map(|row| row.iter().sum()).collect();
    let col_totals: Vec<f64> = (0..n_cols)
        .map(|j| table.iter().map(|row| row[j]).sum())
        .collect();
    let total: f64 = row_totals.iter().sum();
    let df = (n_rows - 1) * (n_cols - 1);
    if total <= 0.0 || df == 0 {
        return None;
    }

    let mut statistic = 0.0;
    for i in 0..n_rows {
        for j in 0..n_cols {
            let expected = row_totals[i] * col_totals[j] / total;
            if expected > 0.0 {
                statistic += (table[i][j] - expected).powi(2) / expected;
            }
        }
    }

    Some(TestOutcome {
        statistic,
        p_value: chi_square_p_value(statistic, df),
    })
}

/// One-way ANOVA across two or more partitions of a quantitative column.
/// `None` when fewer than two groups are present, degrees of freedom run
/// out, or the within-group variance is zero.
pub fn one_way_anova(groups: &[Vec<f64>]) -> Option<TestOutcome> {
    if groups.len() < 2 || groups.iter().any(Vec::is_empty) {
        return None;
    }
    let k = groups.len() as f64;
    let n_total: usize = groups.iter().map(Vec::len).sum();
    let df_within = n_total as f64 - k;
    if df_within <= 0.0 {
        return None;
    }

    let grand_mean = groups.iter().flatten().sum::<f64>() / n_total as f64;

    let ss_between: f64 = groups
        .iter()
        .map(|g| {
            let gm = g.iter().sum::<f64>() / g.len() as f64;
            g.len() as f64 * (gm - grand_mean).powi(2)
        })
        .sum();
    let ss_within: f64 = groups
        .iter()
        .map(|g| {
            let gm = g.iter().sum::<f64>() / g.len() as f64;
            g.iter().map(|x| (x - gm).powi(2)).sum::<f64>()
        })
        .sum();

    let df_between = k - 1.0;
    let ms_between = ss_between / df_between;
    let ms_within = ss_within / df_within;
    if ms_within == 0.0 {
        return None;
    }

    let statistic = ms_between / ms_within;
    Some(TestOutcome {
        statistic,
        p_value: f_to_p(statistic, df_between, df_within),
    })
}

/// D'Agostino-Pearson K² normality test. Requires at least 8 observations
/// and non-zero variance; `None` otherwise. The p-value is exact given K²:
/// the chi-squared survival function with two degrees of freedom.
pub fn normality(values: &[f64]) -> Option<TestOutcome> {
    let n = values.len();
    if n < 8 {
        return None;
    }
    let m2 = central_moment(values, 2)?;
    if m2 == 0.0 {
        return None;
    }
    let m3 = central_moment(values, 3)?;
    let m4 = central_moment(values, 4)?;

    let z_skew = skew_z(m3 / m2.powf(1.5), n as f64)?;
    let z_kurt = kurtosis_z(m4 / m2.powi(2), n as f64)?;

    let statistic = z_skew * z_skew + z_kurt * z_kurt;
    Some(TestOutcome {
        statistic,
        p_value: (-statistic / 2.0).exp(),
    })
}

// D'Agostino (1970) transformation of the sample skewness to a standard
// normal deviate.
fn skew_z(g1: f64, n: f64) -> Option<f64> {
    let y = g1 * (((n + 1.0) * (n + 3.0)) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    if w2 <= 1.0 {
        return None;
    }
    let delta = 1.0 / w2.sqrt().ln().sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    let y_scaled = y / alpha;
    Some(delta * (y_scaled + (y_scaled * y_scaled + 1.0).sqrt()).ln())
}

// Anscombe-Glynn (1983) transformation of the sample kurtosis.
fn kurtosis_z(b2: f64, n: f64) -> Option<f64> {
    let e = 3.0 * (n - 1.0) / (n + 1.0);
    let var_b2 = 24.0 * n * (n - 2.0) * (n - 3.0) / ((n + 1.0).powi(2) * (n + 3.0) * (n + 5.0));
    if var_b2 <= 0.0 {
        return None;
    }
    let x = (b2 - e) / var_b2.sqrt();

    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0 + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());

    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    if denom == 0.0 || a <= 4.0 {
        return None;
    }
    let term = ((1.0 - 2.0 / a) / denom).cbrt();
    Some(((1.0 - 2.0 / (9.0 * a)) - term) / (2.0 / (9.0 * a)).sqrt())
}

/// Two-sided p-value for a t statistic, normal-approximated (with a small-df
/// inflation below 30 degrees of freedom)
pub fn t_to_p(t: f64, df: f64) -> f64 {
    let adjusted = if df > 30.0 {
        t
    } else {
        t * (1.0 + 1.0 / (4.0 * df))
    };
    (2.0 * normal_cdf(-adjusted)).clamp(0.0, 1.0)
}

// F p-value through the chi-square approximation of the numerator.
fn f_to_p(f: f64, df1: f64, _df2: f64) -> f64 {
    chi_square_p_value(f * df1, df1.round() as usize)
}

/// Upper-tail chi-square p-value via the Wilson-Hilferty transformation
pub fn chi_square_p_value(chi_sq: f64, df: usize) -> f64 {
    if df == 0 || chi_sq <= 0.0 {
        return 1.0;
    }
    let k = df as f64;
    let z = ((chi_sq / k).powf(1.0 / 3.0) - (1.0 - 2.0 / (9.0 * k))) / (2.0 / (9.0 * k)).sqrt();
    (1.0 - normal_cdf(z)).clamp(0.0, 1.0)
}

/// Asymptotic Kolmogorov distribution survival function:
/// P(D > d) ≈ 2 Σ (-1)^(k+1) exp(-2 k² λ²)
pub fn ks_p_value(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    let mut p = 0.0;
    for k in 1..=100u32 {
        let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
        let term = sign * (-2.0 * f64::from(k).powi(2) * lambda.powi(2)).exp();
        p += term;
        if term.abs() < 1e-10 {
            break;
        }
    }
    (2.0 * p).clamp(0.0, 1.0)
}

/// Standard normal CDF via the error function
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Abramowitz-Stegun error function approximation (7.1.26)
pub fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x >= 0.0 { 1.0 } else { -1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}
