//! Chunk-driven extraction pipeline
//!
//! Wires the typing, screening, and feature layers together:
//! raw chart columns → [`ColumnTyper`] → typed [`ColumnRecord`]s →
//! [`TableScreen`](crate::stream::TableScreen) / [`SingleColumnExtractor`] /
//! [`PairwiseExtractor`] → identified feature rows, emitted incrementally so
//! output can be consumed before the whole corpus has been read.

use crate::column::{ColumnRecord, RawValue};
use crate::error::{FeatureError, Result};
use crate::features::{
    pairwise_features, single_column_features, ColumnFeatureRow, PairwiseFeatures,
};
use crate::stream::GroupAggregator;
use crate::typing::{cast, fill, TypeDetector};
use serde::Serialize;
use tracing::warn;

/// One untyped chart column as it arrives from the corpus
#[derive(Debug, Clone)]
pub struct RawColumn {
    /// Chart id, `<owner>:<chart number>`
    pub table_id: String,
    /// Within-chart column uid
    pub uid: String,
    pub trace_role: Option<String>,
    pub is_x_source: bool,
    pub is_y_source: bool,
    pub cells: Vec<RawValue>,
}

/// Parse one raw column record from its JSON form.
///
/// Required fields: `table_id`, `uid`, and a `cells` array; anything else is
/// a malformed record the caller should skip and count.
pub fn parse_column_row(value: serde_json::Value) -> Result<RawColumn> {
    let obj = value
        .as_object()
        .ok_or_else(|| FeatureError::MalformedRecord("row is not an object".to_string()))?;

    let table_id = obj
        .get("table_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| FeatureError::MalformedRecord("missing table_id".to_string()))?
        .to_string();
    let uid = obj
        .get("uid")
        .and_then(|v| v.as_str())
        .ok_or_else(|| FeatureError::MalformedRecord("missing uid".to_string()))?
        .to_string();
    let cells = obj
        .get("cells")
        .and_then(|v| v.as_array())
        .ok_or_else(|| FeatureError::MalformedRecord("missing cells array".to_string()))?
        .iter()
        .cloned()
        .map(RawValue::from)
        .collect();

    Ok(RawColumn {
        table_id,
        uid,
        trace_role: obj
            .get("trace_role")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        is_x_source: obj.get("is_x_source").and_then(|v| v.as_bool()).unwrap_or(false),
        is_y_source: obj.get("is_y_source").and_then(|v| v.as_bool()).unwrap_or(false),
        cells,
    })
}

/// Parse a chunk of JSON rows. Malformed rows are skipped and counted so one
/// bad record never aborts the stream; report the returned skip count to the
/// consuming stream via
/// [`GroupedStream::note_skipped`](crate::stream::GroupedStream::note_skipped)
/// so it shows up in the run's counters.
pub fn parse_chunk(rows: Vec<serde_json::Value>) -> (Vec<RawColumn>, usize) {
    let mut skipped = 0;
    let parsed = rows
        .into_iter()
        .filter_map(|row| match parse_column_row(row) {
            Ok(column) => Some(column),
            Err(err) => {
                warn!(%err, "row skipped");
                skipped += 1;
                None
            }
        })
        .collect();
    (parsed, skipped)
}

/// Turns raw columns into typed, imputed [`ColumnRecord`]s:
/// detect → cast → fill.
///
/// A column whose fill fails keeps its missing entries; the validity screen
/// rejects its table downstream.
#[derive(Debug, Clone, Default)]
pub struct ColumnTyper {
    detector: TypeDetector,
}

impl ColumnTyper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detector(detector: TypeDetector) -> Self {
        Self { detector }
    }

    /// Type every column of one chart. The only-x/only-y flags are set when
    /// exactly one column of the chart feeds that axis.
    pub fn type_table(&self, columns: Vec<RawColumn>) -> Vec<ColumnRecord> {
        let n_x = columns.iter().filter(|c| c.is_x_source).count();
        let n_y = columns.iter().filter(|c| c.is_y_source).count();
        columns
            .into_iter()
            .map(|c| self.type_column(c, n_x == 1, n_y == 1))
            .collect()
    }

    fn type_column(&self, raw: RawColumn, single_x: bool, single_y: bool) -> ColumnRecord {
        let inferred = self.detector.detect(&raw.cells);
        let mut outcome = cast(&raw.cells, inferred);
        // Downstream logic keys off the realized dtype, never the inferred one
        if !fill(&mut outcome.values, outcome.dtype) {
            warn!(
                table_id = %raw.table_id,
                uid = %raw.uid,
                "imputation failed, column left incomplete"
            );
        }

        let owner = raw.table_id.split(':').next().unwrap_or("").to_string();
        ColumnRecord {
            field_id: format!("{owner}:{}", raw.uid),
            table_id: raw.table_id,
            trace_role: raw.trace_role,
            is_only_x_source: raw.is_x_source && single_x,
            is_only_y_source: raw.is_y_source && single_y,
            is_x_source: raw.is_x_source,
            is_y_source: raw.is_y_source,
            dtype: outcome.dtype,
            values: outcome.values,
        }
    }
}

/// Per-column feature extraction: a stateless map from typed columns to
/// identified single-column feature rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleColumnExtractor;

impl SingleColumnExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, column: &ColumnRecord) -> ColumnFeatureRow {
        ColumnFeatureRow {
            table_id: column.table_id.clone(),
            field_id: column.field_id.clone(),
            trace_role: column.trace_role.clone(),
            is_x_source: column.is_x_source,
            is_y_source: column.is_y_source,
            features: single_column_features(&column.values, column.dtype),
        }
    }

    /// Map one chunk of typed columns
    pub fn extract_chunk<'a, I>(&self, columns: I) -> Vec<ColumnFeatureRow>
    where
        I: IntoIterator<Item = &'a ColumnRecord>,
    {
        columns.into_iter().map(|c| self.extract(c)).collect()
    }
}

/// Pairwise feature vector prefixed with the identity of its column pair
#[derive(Debug, Clone, Serialize)]
pub struct PairFeatureRow {
    pub table_id: String,
    pub a_field_id: String,
    pub b_field_id: String,
    pub features: PairwiseFeatures,
}

/// Buffers one table's typed columns and emits a [`PairFeatureRow`] per
/// 2-combination when the table closes.
#[derive(Debug, Default)]
pub struct PairwiseExtractor {
    table_id: String,
    columns: Vec<ColumnRecord>,
}

impl PairwiseExtractor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GroupAggregator for PairwiseExtractor {
    type Row = ColumnRecord;
    type Key = String;
    type Output = Vec<PairFeatureRow>;

    fn key_of(row: &ColumnRecord) -> String {
        row.table_id.clone()
    }

    fn open(&mut self, key: &String) {
        self.table_id = key.clone();
        self.columns.clear();
    }

    fn push(&mut self, row: ColumnRecord) {
        self.columns.push(row);
    }

    fn close(&mut self) -> Option<Vec<PairFeatureRow>> {
        if self.columns.len() < 2 {
            self.columns.clear();
            return None;
        }
        let mut rows = Vec::new();
        for i in 0..self.columns.len() {
            for j in (i + 1)..self.columns.len() {
                let (a, b) = (&self.columns[i], &self.columns[j]);
                match pairwise_features(a, b) {
                    Ok(features) => rows.push(PairFeatureRow {
                        table_id: self.table_id.clone(),
                        a_field_id: a.field_id.clone(),
                        b_field_id: b.field_id.clone(),
                        features,
                    }),
                    Err(err) => {
                        warn!(table_id = %self.table_id, %err, "pair skipped");
                    }
                }
            }
        }
        self.columns.clear();
        Some(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::GroupedStream;
    use crate::types::DataType;
    use ndarray::array;
    use serde_json::json;

    fn raw(table: &str, uid: &str, x: bool, cells: Vec<RawValue>) -> RawColumn {
        RawColumn {
            table_id: table.to_string(),
            uid: uid.to_string(),
            trace_role: Some("scatter".to_string()),
            is_x_source: x,
            is_y_source: !x,
            cells,
        }
    }

    fn int_cells(values: &[i64]) -> Vec<RawValue> {
        values.iter().map(|&v| RawValue::Int(v)).collect()
    }

    #[test]
    fn test_parse_column_row() {
        let row = parse_column_row(json!({
            "table_id": "owner:14",
            "uid": "ab12cd",
            "trace_role": "bar",
            "is_x_source": true,
            "cells": [1, 2, null, "3"],
        }))
        .unwrap();
        assert_eq!(row.table_id, "owner:14");
        assert_eq!(row.uid, "ab12cd");
        assert!(row.is_x_source);
        assert!(!row.is_y_source);
        assert_eq!(row.cells.len(), 4);
        assert!(row.cells[2].is_null());
    }

    #[test]
    fn test_parse_column_row_rejects_malformed() {
        for bad in [
            json!([1, 2, 3]),
            json!({"uid": "a", "cells": []}),
            json!({"table_id": "t:1", "uid": "a", "cells": "oops"}),
        ] {
            let err = parse_column_row(bad).unwrap_err();
            assert!(matches!(err, FeatureError::MalformedRecord(_)));
        }
    }

    #[test]
    fn test_parse_chunk_skips_and_counts() {
        let (rows, skipped) = parse_chunk(vec![
            json!({"table_id": "t:1", "uid": "aa", "cells": [1, 2]}),
            json!("garbage"),
            json!({"table_id": "t:1", "uid": "ab", "cells": [3, 4]}),
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_typer_produces_typed_records() {
        let typer = ColumnTyper::new();
        let records = typer.type_table(vec![
            raw("owner:14", "aa", true, int_cells(&[1, 2, 3])),
            raw(
                "owner:14",
                "bb",
                false,
                vec![
                    RawValue::Float(1.5),
                    RawValue::Null,
                    RawValue::Float(2.5),
                ],
            ),
        ]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].field_id, "owner:aa");
        assert_eq!(records[0].dtype, DataType::Integer);
        assert!(records[0].is_only_x_source);
        assert!(!records[0].is_only_y_source);
        assert!(records[1].is_only_y_source);
        // Missing entry imputed with the mean
        assert_eq!(records[1].dtype, DataType::Decimal);
        assert_eq!(records[1].values, array![1.5, 2.0, 2.5]);
    }

    #[test]
    fn test_only_flags_require_a_single_source() {
        let typer = ColumnTyper::new();
        let records = typer.type_table(vec![
            raw("t:1", "aa", true, int_cells(&[1, 2])),
            raw("t:1", "ab", true, int_cells(&[3, 4])),
        ]);
        assert!(records.iter().all(|r| !r.is_only_x_source));
    }

    #[test]
    fn test_failed_fill_leaves_missing_entries() {
        let typer = ColumnTyper::new();
        let records = typer.type_table(vec![raw(
            "t:1",
            "aa",
            true,
            vec![RawValue::Null, RawValue::Null],
        )]);
        assert!(records[0].values.iter().any(|v| v.is_nan()));
    }

    #[test]
    fn test_single_column_extractor_keeps_identity() {
        let typer = ColumnTyper::new();
        let records = typer.type_table(vec![raw("t:1", "aa", true, int_cells(&[1, 2, 3]))]);
        let row = SingleColumnExtractor::new().extract(&records[0]);
        assert_eq!(row.table_id, "t:1");
        assert_eq!(row.field_id, "t:aa");
        assert!(row.is_x_source);
        assert_eq!(row.features.length, Some(3.0));
    }

    #[test]
    fn test_pairwise_extractor_emits_combinations() {
        let typer = ColumnTyper::new();
        let mut columns = typer.type_table(vec![
            raw("t:1", "aa", true, int_cells(&[1, 2, 3])),
            raw("t:1", "ab", false, int_cells(&[3, 2, 1])),
            raw("t:1", "ac", false, int_cells(&[1, 2, 3])),
        ]);
        columns.extend(typer.type_table(vec![
            raw("t:2", "aa", true, int_cells(&[1, 2])),
            raw("t:2", "ab", false, int_cells(&[2, 1])),
        ]));

        let mut stream = GroupedStream::new(PairwiseExtractor::new());
        let mut out: Vec<PairFeatureRow> = Vec::new();
        for chunk in columns.chunks(2) {
            out.extend(stream.push_chunk(chunk.to_vec()).into_iter().flatten());
        }
        out.extend(stream.finish().into_iter().flatten());

        // C(3,2) pairs for t:1 plus one pair for t:2
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].a_field_id, "t:aa");
        assert_eq!(out[0].b_field_id, "t:ab");
        assert!((out[0].features.correlation_value.unwrap() + 1.0).abs() < 1e-9);
        assert_eq!(out[3].table_id, "t:2");
    }

    #[test]
    fn test_pairwise_extractor_needs_two_columns() {
        let typer = ColumnTyper::new();
        let columns = typer.type_table(vec![raw("t:1", "aa", true, int_cells(&[1, 2]))]);
        let mut stream = GroupedStream::new(PairwiseExtractor::new());
        stream.push_chunk(columns);
        assert!(stream.finish().is_none());
    }
}
