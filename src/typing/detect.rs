//! Automatic column type inference

use crate::column::RawValue;
use crate::types::DataType;
use rand::rngs::StdRng;
use rand::{seq::index, SeedableRng};

use super::cast::parse_datetime;

/// Infers the canonical data type of a raw column from a sample of its cells.
///
/// Policy: the sample is drawn first (the whole input when it is smaller than
/// `sample_size`, otherwise a uniform subset without replacement), then nulls
/// are stripped from the sample. A candidate type is accepted when fewer than
/// `confidence * sample_len + 1` cells fail its coercion and at least one
/// cell coerces successfully. The attempt order is fixed: numeric, then
/// datetime, then text; the first acceptance wins.
#[derive(Debug, Clone)]
pub struct TypeDetector {
    sample_size: usize,
    confidence: f64,
    seed: Option<u64>,
}

impl TypeDetector {
    /// Create a detector with the default sample size (500) and error
    /// tolerance (0.01)
    pub fn new() -> Self {
        Self {
            sample_size: 500,
            confidence: 0.01,
            seed: None,
        }
    }

    /// Set the maximum number of cells sampled per column
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size.max(1);
        self
    }

    /// Set the tolerated fraction of failed coercions
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Fix the sampling seed for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Infer the data type of a raw column
    pub fn detect(&self, values: &[RawValue]) -> DataType {
        let sample = self.draw_sample(values);
        if sample.is_empty() {
            return DataType::Text;
        }

        let max_errors = self.confidence * sample.len() as f64 + 1.0;

        // All-boolean columns coerce numerically too, so they are matched
        // before the numeric attempt.
        if sample.iter().all(|v| matches!(v, RawValue::Bool(_))) {
            return DataType::Boolean;
        }

        // A candidate needs at least one successful coercion: on tiny samples
        // max_errors exceeds 1, which would otherwise accept an empty
        // coerced set.
        let numeric_errors = sample.iter().filter(|v| v.as_number().is_none()).count();
        if (numeric_errors as f64) < max_errors && numeric_errors < sample.len() {
            let integral = sample
                .iter()
                .filter_map(|v| v.as_number())
                .all(|n| n.fract() == 0.0 && n.is_finite());
            return if integral {
                DataType::Integer
            } else {
                DataType::Decimal
            };
        }

        let datetime_errors = sample
            .iter()
            .filter(|v| match v {
                RawValue::Text(s) => parse_datetime(s).is_none(),
                _ => true,
            })
            .count();
        if (datetime_errors as f64) < max_errors && datetime_errors < sample.len() {
            return DataType::DateTime;
        }

        DataType::Text
    }

    /// Sample cells, then strip nulls. Missing cells carry no evidence about
    /// the type of the present ones.
    fn draw_sample<'a>(&self, values: &'a [RawValue]) -> Vec<&'a RawValue> {
        if values.len() <= self.sample_size {
            return values.iter().filter(|v| !v.is_null()).collect();
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        index::sample(&mut rng, values.len(), self.sample_size)
            .into_iter()
            .map(|i| &values[i])
            .filter(|v| !v.is_null())
            .collect()
    }
}

impl Default for TypeDetector {
    fn default() -> Self {
        Self::new()
    }
}
