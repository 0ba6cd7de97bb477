//! Table validity filter
//!
//! Layered on the group lifecycle: running table-level aggregates plus an
//! `is_valid` flag seeded true on open. Validity is monotone — once a rule
//! fires, later columns of the group are consumed to preserve stream
//! position but no longer inspected. Invalid groups are dropped silently and
//! show up only in the stream counters.

use crate::column::{ColumnRecord, TableRecord};

use super::GroupAggregator;

/// Validates one table's columns and emits a [`TableRecord`] per accepted
/// table.
///
/// A table is rejected when any column is flagged for both axes or neither,
/// carries a trace role different from the table's, is unusable (empty, <2
/// points, or imputation left missing entries), has a row length different
/// from the table's, or when more than one column feeds the x-axis.
#[derive(Debug, Default)]
pub struct TableScreen {
    table_id: String,
    trace_role: Option<String>,
    role_seen: bool,
    n_traces: usize,
    n_x_source: usize,
    n_y_source: usize,
    row_length: Option<usize>,
    valid: bool,
}

impl TableScreen {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GroupAggregator for TableScreen {
    type Row = ColumnRecord;
    type Key = String;
    type Output = TableRecord;

    fn key_of(row: &ColumnRecord) -> String {
        row.table_id.clone()
    }

    fn open(&mut self, key: &String) {
        self.table_id = key.clone();
        self.trace_role = None;
        self.role_seen = false;
        self.n_traces = 0;
        self.n_x_source = 0;
        self.n_y_source = 0;
        self.row_length = None;
        self.valid = true;
    }

    fn push(&mut self, column: ColumnRecord) {
        if !self.valid {
            return;
        }

        // The first column defines the table's trace role
        if !self.role_seen {
            self.trace_role = column.trace_role.clone();
            self.role_seen = true;
        }

        // A column must feed exactly one axis
        if column.is_x_source == column.is_y_source {
            self.valid = false;
            return;
        }

        // Mixed trace types within one table are out of scope
        if column.trace_role != self.trace_role {
            self.valid = false;
            return;
        }

        // Unusable data: too short, or imputation left missing entries
        if column.len() < 2 || column.values.iter().any(|v| v.is_nan()) {
            self.valid = false;
            return;
        }

        match self.row_length {
            None => self.row_length = Some(column.len()),
            Some(len) if len != column.len() => {
                self.valid = false;
                return;
            }
            Some(_) => {}
        }

        self.n_traces += 1;
        if column.is_x_source {
            self.n_x_source += 1;
        }
        if column.is_y_source {
            self.n_y_source += 1;
        }

        // At most one column may feed the x-axis
        if self.n_x_source > 1 {
            self.valid = false;
        }
    }

    fn close(&mut self) -> Option<TableRecord> {
        if !self.valid || self.n_traces == 0 {
            return None;
        }
        Some(TableRecord {
            table_id: std::mem::take(&mut self.table_id),
            trace_role: self.trace_role.take(),
            n_traces: self.n_traces,
            n_x_source: self.n_x_source,
            n_y_source: self.n_y_source,
            row_length: self.row_length?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::GroupedStream;
    use crate::types::DataType;
    use ndarray::{array, Array1};

    fn column(table: &str, field: &str, x: bool, y: bool, values: Array1<f64>) -> ColumnRecord {
        ColumnRecord {
            table_id: table.to_string(),
            field_id: format!("{table}:{field}"),
            trace_role: Some("scatter".to_string()),
            is_x_source: x,
            is_y_source: y,
            is_only_x_source: x,
            is_only_y_source: false,
            dtype: DataType::Integer,
            values,
        }
    }

    #[test]
    fn test_accepts_well_formed_table() {
        let mut stream = GroupedStream::new(TableScreen::new());
        stream.push_row(column("t:1", "aa", true, false, array![1.0, 2.0, 3.0]));
        stream.push_row(column("t:1", "ab", false, true, array![4.0, 5.0, 6.0]));
        let record = stream.finish().expect("table accepted");
        assert_eq!(record.table_id, "t:1");
        assert_eq!(record.n_traces, 2);
        assert_eq!(record.n_x_source, 1);
        assert_eq!(record.n_y_source, 1);
        assert_eq!(record.row_length, 3);
    }

    #[test]
    fn test_double_x_source_drops_table() {
        let mut stream = GroupedStream::new(TableScreen::new());
        stream.push_row(column("t:1", "aa", true, false, array![1.0, 2.0]));
        stream.push_row(column("t:1", "ab", true, false, array![3.0, 4.0]));
        assert!(stream.finish().is_none());
        assert_eq!(stream.stats().groups_dropped, 1);
    }

    #[test]
    fn test_both_axes_or_neither_drops_table() {
        let mut stream = GroupedStream::new(TableScreen::new());
        stream.push_row(column("t:1", "aa", true, true, array![1.0, 2.0]));
        assert!(stream.finish().is_none());

        let mut stream = GroupedStream::new(TableScreen::new());
        stream.push_row(column("t:2", "aa", false, false, array![1.0, 2.0]));
        assert!(stream.finish().is_none());
    }

    #[test]
    fn test_length_mismatch_drops_table() {
        let mut stream = GroupedStream::new(TableScreen::new());
        stream.push_row(column("t:1", "aa", true, false, array![1.0, 2.0, 3.0]));
        stream.push_row(column("t:1", "ab", false, true, array![4.0, 5.0]));
        assert!(stream.finish().is_none());
    }

    #[test]
    fn test_short_or_unfilled_column_drops_table() {
        let mut stream = GroupedStream::new(TableScreen::new());
        stream.push_row(column("t:1", "aa", true, false, array![1.0]));
        assert!(stream.finish().is_none());

        let mut stream = GroupedStream::new(TableScreen::new());
        stream.push_row(column("t:2", "aa", true, false, array![1.0, f64::NAN]));
        assert!(stream.finish().is_none());
    }

    #[test]
    fn test_mixed_trace_role_drops_table() {
        let mut stream = GroupedStream::new(TableScreen::new());
        stream.push_row(column("t:1", "aa", true, false, array![1.0, 2.0]));
        let mut bar = column("t:1", "ab", false, true, array![3.0, 4.0]);
        bar.trace_role = Some("bar".to_string());
        stream.push_row(bar);
        assert!(stream.finish().is_none());
    }

    #[test]
    fn test_validity_is_monotone() {
        // A valid-looking column after the violation cannot re-validate
        let mut stream = GroupedStream::new(TableScreen::new());
        stream.push_row(column("t:1", "aa", true, true, array![1.0, 2.0]));
        stream.push_row(column("t:1", "ab", false, true, array![3.0, 4.0]));
        stream.push_row(column("t:1", "ac", false, true, array![5.0, 6.0]));
        assert!(stream.finish().is_none());
    }

    #[test]
    fn test_invalid_table_does_not_leak_into_next_group() {
        let mut stream = GroupedStream::new(TableScreen::new());
        stream.push_row(column("t:1", "aa", true, true, array![1.0, 2.0]));
        let emitted = stream.push_row(column("t:2", "aa", true, false, array![1.0, 2.0]));
        assert!(emitted.is_none());
        stream.push_row(column("t:2", "ab", false, true, array![3.0, 4.0]));
        let record = stream.finish().expect("second table accepted");
        assert_eq!(record.table_id, "t:2");
        assert_eq!(stream.stats().groups_dropped, 1);
        assert_eq!(stream.stats().groups_emitted, 1);
    }
}
