//! Column-set aggregation
//!
//! Rolls the single-column feature rows of one table into a single
//! table-level row. Each feature is reduced across the table's columns by
//! every reducer of its kind; the reducer tables are explicit configuration,
//! so the output header is statically derivable as `feature-reducer` names.

use crate::stats;
use crate::stream::GroupAggregator;
use serde::{Deserialize, Serialize};

use super::{
    single_column_header, ColumnFeatureRow, FeatureKind, FeatureValue,
};

/// Reducers applicable to boolean features. Null entries count as false;
/// `Percentage` divides by the full column count, nulls included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolReducer {
    Num,
    Has,
    OnlyOne,
    All,
    Percentage,
}

impl BoolReducer {
    pub const ALL: [BoolReducer; 5] = [
        BoolReducer::Num,
        BoolReducer::Has,
        BoolReducer::OnlyOne,
        BoolReducer::All,
        BoolReducer::Percentage,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BoolReducer::Num => "num",
            BoolReducer::Has => "has",
            BoolReducer::OnlyOne => "only_one",
            BoolReducer::All => "all",
            BoolReducer::Percentage => "percentage",
        }
    }

    pub fn apply(&self, column: &[FeatureValue]) -> FeatureValue {
        if column.is_empty() {
            return FeatureValue::Null;
        }
        let trues = column
            .iter()
            .filter(|v| v.as_bool() == Some(true))
            .count();
        match self {
            BoolReducer::Num => FeatureValue::Number(trues as f64),
            BoolReducer::Has => FeatureValue::Bool(trues > 0),
            BoolReducer::OnlyOne => FeatureValue::Bool(trues == 1),
            BoolReducer::All => FeatureValue::Bool(trues == column.len()),
            BoolReducer::Percentage => {
                FeatureValue::Number(trues as f64 / column.len() as f64)
            }
        }
    }
}

/// Reducers applicable to numeric features. Nulls are skipped; a reducer
/// whose precondition fails (no values, zero variance) yields null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumReducer {
    Mean,
    Var,
    Std,
    MadMean,
    MadMedian,
    CoeffVar,
    Min,
    Max,
    Range,
}

impl NumReducer {
    pub const ALL: [NumReducer; 9] = [
        NumReducer::Mean,
        NumReducer::Var,
        NumReducer::Std,
        NumReducer::MadMean,
        NumReducer::MadMedian,
        NumReducer::CoeffVar,
        NumReducer::Min,
        NumReducer::Max,
        NumReducer::Range,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NumReducer::Mean => "mean",
            NumReducer::Var => "var",
            NumReducer::Std => "std",
            NumReducer::MadMean => "mad_mean",
            NumReducer::MadMedian => "mad_median",
            NumReducer::CoeffVar => "coeff_var",
            NumReducer::Min => "min",
            NumReducer::Max => "max",
            NumReducer::Range => "range",
        }
    }

    pub fn apply(&self, column: &[FeatureValue]) -> FeatureValue {
        let xs: Vec<f64> = column.iter().filter_map(|v| v.as_number()).collect();
        match self {
            NumReducer::Mean => stats::mean(&xs).into(),
            NumReducer::Var => stats::sample_variance(&xs).into(),
            NumReducer::Std => stats::sample_variance(&xs).map(f64::sqrt).into(),
            NumReducer::MadMean => stats::mean(&xs)
                .and_then(|m| stats::mean(&xs.iter().map(|x| (x - m).abs()).collect::<Vec<_>>()))
                .into(),
            // Signed mean deviation from the median
            NumReducer::MadMedian => stats::median(&xs)
                .and_then(|m| stats::mean(&xs.iter().map(|x| x - m).collect::<Vec<_>>()))
                .into(),
            NumReducer::CoeffVar => match (stats::mean(&xs), stats::sample_variance(&xs)) {
                (Some(mean), Some(var)) if var != 0.0 => FeatureValue::Number(mean / var),
                _ => FeatureValue::Null,
            },
            NumReducer::Min => stats::min(&xs).into(),
            NumReducer::Max => stats::max(&xs).into(),
            NumReducer::Range => match (stats::max(&xs), stats::min(&xs)) {
                (Some(hi), Some(lo)) => FeatureValue::Number(hi - lo),
                _ => FeatureValue::Null,
            },
        }
    }
}

/// Reducer tables keyed by feature kind, passed as configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationPolicy {
    pub bool_reducers: Vec<BoolReducer>,
    pub num_reducers: Vec<NumReducer>,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            bool_reducers: BoolReducer::ALL.to_vec(),
            num_reducers: NumReducer::ALL.to_vec(),
        }
    }
}

impl AggregationPolicy {
    fn reducer_names(&self, kind: FeatureKind) -> Vec<&'static str> {
        match kind {
            FeatureKind::Boolean => self.bool_reducers.iter().map(BoolReducer::name).collect(),
            FeatureKind::Numeric => self.num_reducers.iter().map(NumReducer::name).collect(),
        }
    }
}

/// `feature-reducer` column names of the table-level output row
pub fn aggregate_header(policy: &AggregationPolicy) -> Vec<String> {
    let mut header = Vec::new();
    for spec in single_column_header() {
        for reducer in policy.reducer_names(spec.kind) {
            header.push(format!("{}-{}", spec.name, reducer));
        }
    }
    header
}

/// One table-level feature row, values in [`aggregate_header`] order
#[derive(Debug, Clone, Serialize)]
pub struct TableFeatureRow {
    pub table_id: String,
    pub values: Vec<FeatureValue>,
}

/// Reduces a table's single-column feature rows into one table-level row
#[derive(Debug, Default)]
pub struct FeatureAggregator {
    policy: AggregationPolicy,
    table_id: String,
    matrix: Vec<Vec<FeatureValue>>,
}

impl FeatureAggregator {
    pub fn new(policy: AggregationPolicy) -> Self {
        Self {
            policy,
            table_id: String::new(),
            matrix: Vec::new(),
        }
    }
}

impl GroupAggregator for FeatureAggregator {
    type Row = ColumnFeatureRow;
    type Key = String;
    type Output = TableFeatureRow;

    fn key_of(row: &ColumnFeatureRow) -> String {
        row.table_id.clone()
    }

    fn open(&mut self, key: &String) {
        self.table_id = key.clone();
        self.matrix.clear();
    }

    fn push(&mut self, row: ColumnFeatureRow) {
        self.matrix.push(row.features.values());
    }

    fn close(&mut self) -> Option<TableFeatureRow> {
        if self.matrix.is_empty() {
            return None;
        }
        let mut values = Vec::new();
        for (i, spec) in single_column_header().iter().enumerate() {
            let column: Vec<FeatureValue> = self.matrix.iter().map(|row| row[i]).collect();
            match spec.kind {
                FeatureKind::Boolean => {
                    for reducer in &self.policy.bool_reducers {
                        values.push(reducer.apply(&column));
                    }
                }
                FeatureKind::Numeric => {
                    for reducer in &self.policy.num_reducers {
                        values.push(reducer.apply(&column));
                    }
                }
            }
        }
        self.matrix.clear();
        Some(TableFeatureRow {
            table_id: std::mem::take(&mut self.table_id),
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::single_column_features;
    use crate::stream::GroupedStream;
    use crate::types::DataType;
    use ndarray::array;
    use std::collections::HashMap;

    fn feature_row(table: &str, field: &str, values: ndarray::Array1<f64>) -> ColumnFeatureRow {
        ColumnFeatureRow {
            table_id: table.to_string(),
            field_id: format!("{table}:{field}"),
            trace_role: Some("scatter".to_string()),
            is_x_source: false,
            is_y_source: true,
            features: single_column_features(&values, DataType::Integer),
        }
    }

    #[test]
    fn test_header_shape() {
        let header = aggregate_header(&AggregationPolicy::default());
        let specs = single_column_header();
        let booleans = specs
            .iter()
            .filter(|s| s.kind == FeatureKind::Boolean)
            .count();
        let numerics = specs.len() - booleans;
        assert_eq!(header.len(), numerics * 9 + booleans * 5);
        assert!(header.contains(&"mean-mean".to_string()));
        assert!(header.contains(&"is_sorted-percentage".to_string()));
    }

    #[test]
    fn test_reducer_names_round_trip() {
        for r in BoolReducer::ALL {
            let json = serde_json::to_string(&r).unwrap();
            assert_eq!(json, format!("\"{}\"", r.name()));
        }
        for r in NumReducer::ALL {
            let json = serde_json::to_string(&r).unwrap();
            assert_eq!(json, format!("\"{}\"", r.name()));
        }
    }

    #[test]
    fn test_bool_reducers() {
        let column = vec![
            FeatureValue::Bool(true),
            FeatureValue::Bool(false),
            FeatureValue::Null,
            FeatureValue::Bool(true),
        ];
        assert_eq!(
            BoolReducer::Num.apply(&column),
            FeatureValue::Number(2.0)
        );
        assert_eq!(BoolReducer::Has.apply(&column), FeatureValue::Bool(true));
        assert_eq!(
            BoolReducer::OnlyOne.apply(&column),
            FeatureValue::Bool(false)
        );
        assert_eq!(BoolReducer::All.apply(&column), FeatureValue::Bool(false));
        assert_eq!(
            BoolReducer::Percentage.apply(&column),
            FeatureValue::Number(0.5)
        );
    }

    #[test]
    fn test_num_reducers_skip_nulls() {
        let column = vec![
            FeatureValue::Number(1.0),
            FeatureValue::Null,
            FeatureValue::Number(3.0),
        ];
        assert_eq!(NumReducer::Mean.apply(&column), FeatureValue::Number(2.0));
        assert_eq!(NumReducer::Min.apply(&column), FeatureValue::Number(1.0));
        assert_eq!(NumReducer::Range.apply(&column), FeatureValue::Number(2.0));
        // Sample variance of [1, 3]
        assert_eq!(NumReducer::Var.apply(&column), FeatureValue::Number(2.0));
    }

    #[test]
    fn test_num_reducers_degenerate() {
        assert_eq!(NumReducer::Mean.apply(&[]), FeatureValue::Null);
        let single = vec![FeatureValue::Number(5.0)];
        assert_eq!(NumReducer::Var.apply(&single), FeatureValue::Null);
        let constant = vec![FeatureValue::Number(5.0), FeatureValue::Number(5.0)];
        assert_eq!(NumReducer::CoeffVar.apply(&constant), FeatureValue::Null);
    }

    #[test]
    fn test_one_row_per_table() {
        let mut stream = GroupedStream::new(FeatureAggregator::new(AggregationPolicy::default()));
        let mut out = Vec::new();
        out.extend(stream.push_row(feature_row("t:1", "aa", array![1.0, 2.0, 3.0])));
        out.extend(stream.push_row(feature_row("t:1", "ab", array![4.0, 5.0, 6.0])));
        out.extend(stream.push_row(feature_row("t:2", "aa", array![7.0, 8.0, 9.0])));
        out.extend(stream.finish());

        assert_eq!(out.len(), 2);
        let header = aggregate_header(&AggregationPolicy::default());
        assert_eq!(out[0].values.len(), header.len());

        let by_name: HashMap<&str, FeatureValue> = header
            .iter()
            .map(String::as_str)
            .zip(out[0].values.iter().copied())
            .collect();
        // Both columns of t:1 have length 3
        assert_eq!(by_name["length-mean"], FeatureValue::Number(3.0));
        assert_eq!(by_name["length-range"], FeatureValue::Number(0.0));
        // Means 2.0 and 5.0 across the two columns
        assert_eq!(by_name["mean-mean"], FeatureValue::Number(3.5));
        assert_eq!(
            by_name["var_type_is_quantitative-all"],
            FeatureValue::Bool(true)
        );
        assert_eq!(
            by_name["var_type_is_quantitative-percentage"],
            FeatureValue::Number(1.0)
        );
    }
}
