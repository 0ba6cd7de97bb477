//! Feature vectors and their static headers
//!
//! Feature vectors are fixed-field structs, not maps: the header is known at
//! compile time and column order is explicit. A feature holds its declared
//! null when a precondition (sample size, non-degenerate variance, cost
//! guard) is not met.

mod aggregate;
mod pairwise;
mod single;

pub use aggregate::{
    aggregate_header, AggregationPolicy, BoolReducer, FeatureAggregator, NumReducer,
    TableFeatureRow,
};
pub use pairwise::{pairwise_features, pairwise_header, PairwiseFeatures, MAX_GROUPS};
pub use single::{single_column_features, single_column_header, SingleColumnFeatures};

use serde::Serialize;

/// Single-column feature vector prefixed with the identity of the column it
/// describes. The per-column output record, and the input row of table-level
/// aggregation.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnFeatureRow {
    pub table_id: String,
    pub field_id: String,
    pub trace_role: Option<String>,
    pub is_x_source: bool,
    pub is_y_source: bool,
    pub features: SingleColumnFeatures,
}

/// Scalar value of one feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Null,
    Number(f64),
    Bool(bool),
}

impl FeatureValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FeatureValue::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FeatureValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<Option<f64>> for FeatureValue {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(n) => FeatureValue::Number(n),
            None => FeatureValue::Null,
        }
    }
}

impl From<Option<bool>> for FeatureValue {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(b) => FeatureValue::Bool(b),
            None => FeatureValue::Null,
        }
    }
}

/// Declared value kind of a feature; selects the reducer family during
/// table-level aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric,
    Boolean,
}

/// Name and kind of one feature column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub kind: FeatureKind,
}

impl FeatureSpec {
    pub const fn numeric(name: &'static str) -> Self {
        Self {
            name,
            kind: FeatureKind::Numeric,
        }
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self {
            name,
            kind: FeatureKind::Boolean,
        }
    }
}
