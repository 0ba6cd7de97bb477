//! chart-features - Streaming feature extraction for tabular chart corpora
//!
//! Turns a corpus of raw chart columns into per-column, per-pair, and
//! per-table statistical feature vectors:
//! - Type inference, casting, and imputation of heterogeneous cell data
//! - Chunk-boundary-aware grouped aggregation with table validity screening
//! - Fixed-header single-column, pairwise, and table-level feature vectors
//!
//! # Modules
//!
//! ## Data model
//! - [`types`] - Closed data-type and variable-type enums
//! - [`column`] - Raw cells, typed columns, accepted-table records
//!
//! ## Typing
//! - [`typing`] - Type inference, f64 casting, missing-value imputation
//!
//! ## Streaming
//! - [`stream`] - Group lifecycle trait and chunked stream driver
//!
//! ## Features
//! - [`stats`] - Descriptive statistics and hypothesis tests
//! - [`features`] - Single-column, pairwise, and table-level feature vectors
//! - [`pipeline`] - Extractors wiring typing, screening, and features
//!
//! # Example
//!
//! ```
//! use chart_features::column::RawValue;
//! use chart_features::pipeline::{ColumnTyper, SingleColumnExtractor, RawColumn};
//!
//! let typer = ColumnTyper::new();
//! let columns = typer.type_table(vec![RawColumn {
//!     table_id: "owner:1".to_string(),
//!     uid: "aa".to_string(),
//!     trace_role: Some("scatter".to_string()),
//!     is_x_source: true,
//!     is_y_source: false,
//!     cells: vec![RawValue::Int(1), RawValue::Null, RawValue::Int(3)],
//! }]);
//!
//! let row = SingleColumnExtractor::new().extract(&columns[0]);
//! assert_eq!(row.features.length, Some(3.0));
//! ```

pub mod column;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod stats;
pub mod stream;
pub mod types;
pub mod typing;

pub use error::{FeatureError, Result};

/// Commonly used types
pub mod prelude {
    pub use crate::column::{ColumnRecord, RawValue, TableRecord};
    pub use crate::error::{FeatureError, Result};
    pub use crate::features::{
        aggregate_header, pairwise_features, pairwise_header, single_column_features,
        single_column_header, AggregationPolicy, ColumnFeatureRow, FeatureAggregator,
        FeatureValue, PairwiseFeatures, SingleColumnFeatures, TableFeatureRow,
    };
    pub use crate::pipeline::{
        parse_chunk, parse_column_row, ColumnTyper, PairFeatureRow, PairwiseExtractor,
        RawColumn, SingleColumnExtractor,
    };
    pub use crate::stream::{GroupAggregator, GroupedStream, StreamStats, TableScreen};
    pub use crate::types::{DataType, VariableType};
    pub use crate::typing::{cast, fill, TypeDetector};
}
