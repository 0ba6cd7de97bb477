//! Casting raw cells to typed f64 storage

use crate::column::RawValue;
use crate::types::DataType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use ndarray::Array1;
use std::collections::HashMap;

/// Result of a cast: the f64 storage plus the realized dtype.
///
/// When the requested dtype fails structurally (no value parses), the cast
/// falls back to text encoding and `dtype` reports [`DataType::Text`].
/// Callers must use the realized dtype for all downstream logic.
#[derive(Debug, Clone)]
pub struct CastOutcome {
    pub values: Array1<f64>,
    pub dtype: DataType,
}

/// Cast raw cells to the storage representation of `target`.
///
/// Integers and decimals store their numeric value, booleans 0/1, datetimes
/// epoch seconds, text a per-column first-seen dictionary id. Cells that do
/// not parse become NaN (the pre-imputation missing marker).
pub fn cast(values: &[RawValue], target: DataType) -> CastOutcome {
    let parsed: Vec<f64> = match target {
        DataType::Integer | DataType::Decimal => values
            .iter()
            .map(|v| v.as_number().unwrap_or(f64::NAN))
            .collect(),
        DataType::DateTime => values
            .iter()
            .map(|v| match v {
                // Numeric cells in a datetime column are taken as epoch seconds
                RawValue::Int(i) => *i as f64,
                RawValue::Float(f) => *f,
                RawValue::Text(s) => parse_datetime(s).unwrap_or(f64::NAN),
                _ => f64::NAN,
            })
            .collect(),
        DataType::Boolean => values
            .iter()
            .map(|v| match v {
                RawValue::Bool(b) => {
                    if *b {
                        1.0
                    } else {
                        0.0
                    }
                }
                RawValue::Int(0) => 0.0,
                RawValue::Int(1) => 1.0,
                RawValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" => 1.0,
                    "false" => 0.0,
                    _ => f64::NAN,
                },
                _ => f64::NAN,
            })
            .collect(),
        DataType::Text => return cast_text(values),
    };

    // Structural failure: nothing parsed at all
    if !parsed.is_empty() && parsed.iter().all(|v| v.is_nan()) {
        return cast_text(values);
    }

    CastOutcome {
        values: Array1::from_vec(parsed),
        dtype: target,
    }
}

/// Bag-of-words encoding: each distinct string maps to a stable integer id
/// in first-seen order. The dictionary is local to one column. Non-string
/// and empty cells become missing.
fn cast_text(values: &[RawValue]) -> CastOutcome {
    let mut bag: HashMap<&str, f64> = HashMap::new();
    let parsed: Vec<f64> = values
        .iter()
        .map(|v| match v {
            RawValue::Text(s) if !s.is_empty() => {
                let next_id = bag.len() as f64;
                *bag.entry(s.as_str()).or_insert(next_id)
            }
            _ => f64::NAN,
        })
        .collect();

    CastOutcome {
        values: Array1::from_vec(parsed),
        dtype: DataType::Text,
    }
}

/// Parse a datetime string to epoch seconds. Accepts RFC 3339 plus the
/// date and date-time layouts commonly seen in the corpus.
pub fn parse_datetime(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).timestamp() as f64);
    }

    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp() as f64);
        }
    }

    const DATE_FORMATS: [&str; 7] = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%m-%d-%Y",
        "%d %b %Y",
        "%b %d, %Y",
        "%B %d, %Y",
    ];
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp() as f64);
        }
    }

    None
}
