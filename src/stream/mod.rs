//! Grouped stream aggregation
//!
//! State machine over a row stream sorted by group key and delivered in
//! chunks of arbitrary size. Chunk boundaries are invisible to correctness:
//! the open group's accumulator lives in [`GroupedStream`], outside any
//! per-chunk scope, and the final open group is closed by an explicit
//! [`GroupedStream::finish`] call.
//!
//! The sorted-input precondition is not validated here; an unsorted stream
//! silently emits one record per key run. Tests assert chunking invariance
//! instead.

pub mod screen;

pub use screen::TableScreen;

use tracing::debug;

/// Group lifecycle: open on the first row of a key, push every row of the
/// run, close when the key changes or the stream ends.
pub trait GroupAggregator {
    type Row;
    type Key: PartialEq + Clone + std::fmt::Debug;
    type Output;

    /// Group key of one row
    fn key_of(row: &Self::Row) -> Self::Key;

    /// Reset accumulator state for a new group
    fn open(&mut self, key: &Self::Key);

    /// Consume one row of the open group
    fn push(&mut self, row: Self::Row);

    /// Close the open group; `None` drops the group from the output
    fn close(&mut self) -> Option<Self::Output>;
}

/// Counters observable after (or during) a run
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamStats {
    pub rows_seen: usize,
    pub groups_emitted: usize,
    pub groups_dropped: usize,
    pub rows_skipped: usize,
}

/// Drives a [`GroupAggregator`] over a chunked, key-sorted row stream.
///
/// Memory residency is one open group plus the in-flight output, never the
/// whole corpus.
pub struct GroupedStream<A: GroupAggregator> {
    aggregator: A,
    open_key: Option<A::Key>,
    stats: StreamStats,
}

impl<A: GroupAggregator> GroupedStream<A> {
    pub fn new(aggregator: A) -> Self {
        Self {
            aggregator,
            open_key: None,
            stats: StreamStats::default(),
        }
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Feed one row; returns the closed group's record when this row opens a
    /// new key.
    pub fn push_row(&mut self, row: A::Row) -> Option<A::Output> {
        self.stats.rows_seen += 1;
        let key = A::key_of(&row);

        let mut emitted = None;
        match &self.open_key {
            Some(open) if *open == key => {}
            Some(_) => {
                emitted = self.close_open();
                self.aggregator.open(&key);
                self.open_key = Some(key);
            }
            None => {
                self.aggregator.open(&key);
                self.open_key = Some(key);
            }
        }
        self.aggregator.push(row);
        emitted
    }

    /// Feed one chunk; returns the records of every group closed within it.
    pub fn push_chunk<I>(&mut self, chunk: I) -> Vec<A::Output>
    where
        I: IntoIterator<Item = A::Row>,
    {
        chunk.into_iter().filter_map(|row| self.push_row(row)).collect()
    }

    /// Close the final open group. Mandatory at end-of-stream.
    pub fn finish(&mut self) -> Option<A::Output> {
        if self.open_key.is_none() {
            return None;
        }
        let out = self.close_open();
        self.open_key = None;
        out
    }

    fn close_open(&mut self) -> Option<A::Output> {
        let key = self.open_key.clone();
        match self.aggregator.close() {
            Some(out) => {
                self.stats.groups_emitted += 1;
                debug!(?key, "group closed");
                Some(out)
            }
            None => {
                self.stats.groups_dropped += 1;
                debug!(?key, "group dropped");
                None
            }
        }
    }

    /// Record malformed rows that were skipped before reaching the
    /// aggregator, e.g. the skip count of
    /// [`parse_chunk`](crate::pipeline::parse_chunk).
    pub fn note_skipped(&mut self, rows: usize) {
        self.stats.rows_skipped += rows;
    }

    pub fn aggregator(&self) -> &A {
        &self.aggregator
    }

    pub fn aggregator_mut(&mut self) -> &mut A {
        &mut self.aggregator
    }
}
