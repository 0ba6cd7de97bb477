//! Type inference, casting, and imputation
//!
//! Turns raw heterogeneous cell values into a typed, complete numeric
//! representation:
//! - [`TypeDetector`] infers a canonical [`DataType`](crate::types::DataType)
//!   from a sample of the raw cells
//! - [`cast`] converts the cells to the type's f64 storage, reporting the
//!   realized dtype (which may fall back to text)
//! - [`fill`] repairs missing entries with a deterministic summary statistic

mod cast;
mod detect;
mod fill;

pub use cast::{cast, parse_datetime, CastOutcome};
pub use detect::TypeDetector;
pub use fill::fill;
