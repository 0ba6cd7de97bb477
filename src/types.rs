//! Closed type tags for column data

use serde::{Deserialize, Serialize};

/// Concrete storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Integer,
    Decimal,
    Text,
    Boolean,
    DateTime,
}

/// Coarse semantic class derived from the concrete type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    Quantitative,
    Categorical,
    Temporal,
}

impl DataType {
    /// All concrete types, in header order
    pub const ALL: [DataType; 5] = [
        DataType::Integer,
        DataType::Decimal,
        DataType::Text,
        DataType::Boolean,
        DataType::DateTime,
    ];

    /// The fixed dtype-to-variable-type mapping. Never stored separately;
    /// always recomputed from the concrete type.
    pub fn variable_type(self) -> VariableType {
        match self {
            DataType::Integer | DataType::Decimal => VariableType::Quantitative,
            DataType::Text | DataType::Boolean => VariableType::Categorical,
            DataType::DateTime => VariableType::Temporal,
        }
    }

    /// Stable lowercase name used in feature headers
    pub fn name(self) -> &'static str {
        match self {
            DataType::Integer => "integer",
            DataType::Decimal => "decimal",
            DataType::Text => "string",
            DataType::Boolean => "bool",
            DataType::DateTime => "datetime",
        }
    }
}

impl VariableType {
    /// All variable types, in header order
    pub const ALL: [VariableType; 3] = [
        VariableType::Quantitative,
        VariableType::Categorical,
        VariableType::Temporal,
    ];

    /// Stable lowercase name used in feature headers
    pub fn name(self) -> &'static str {
        match self {
            VariableType::Quantitative => "quantitative",
            VariableType::Categorical => "categorical",
            VariableType::Temporal => "temporal",
        }
    }
}
