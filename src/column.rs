//! Core data model: raw cells, typed columns, table records

use crate::types::{DataType, VariableType};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A single heterogeneous cell as it arrives from the corpus, before any
/// type has been assigned.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Numeric coercion. Text cells parse as f64; booleans coerce to 0/1.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Null => None,
            RawValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            RawValue::Int(i) => Some(*i as f64),
            RawValue::Float(f) => Some(*f),
            RawValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    RawValue::Int(i)
                } else {
                    RawValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => RawValue::Text(s),
            // Nested payloads carry no usable scalar
            _ => RawValue::Null,
        }
    }
}

/// One typed, imputed column of a source table.
///
/// `values` is the canonical f64 storage for every dtype: integers and
/// decimals directly, booleans as 0/1, datetimes as epoch seconds, text as
/// first-seen dictionary ids. NaN marks a missing entry before imputation;
/// after a successful fill the column contains no NaN.
#[derive(Debug, Clone)]
pub struct ColumnRecord {
    /// Group key shared by all columns of one source table
    pub table_id: String,
    /// Corpus-unique id, `<table id>:<within-table uid>`
    pub field_id: String,
    /// Chart trace type this column feeds, if any
    pub trace_role: Option<String>,
    /// Column feeds the chart's x-axis
    pub is_x_source: bool,
    /// Column feeds the chart's y-axis
    pub is_y_source: bool,
    /// Column is the only x-axis source of its chart
    pub is_only_x_source: bool,
    /// Column is the only y-axis source of its chart
    pub is_only_y_source: bool,
    /// Realized storage type (post-cast, may differ from the inferred one)
    pub dtype: DataType,
    pub values: Array1<f64>,
}

impl ColumnRecord {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Derived semantic class; recomputed from `dtype`, never stored.
    pub fn variable_type(&self) -> VariableType {
        self.dtype.variable_type()
    }
}

/// Aggregated, validated record for one accepted table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRecord {
    pub table_id: String,
    pub trace_role: Option<String>,
    /// Columns participating in a trace
    pub n_traces: usize,
    pub n_x_source: usize,
    pub n_y_source: usize,
    /// Row count shared by every column of the table
    pub row_length: usize,
}
