//! Numeric aggregators for database functions.

use crate::error::DatabaseError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A pure reduction over the numeric values a D-function projects.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregator {
    Sum,
    Average,
    Count,
    Max,
    Min,
    Product,
    /// Sample standard deviation (n-1 denominator)
    StdDev,
    /// Population standard deviation (n denominator)
    StdDevP,
    /// Sample variance (n-1 denominator)
    Var,
    /// Population variance (n denominator)
    VarP,
}

fn require(values: &[f64], required: usize) -> Result<(), DatabaseError> {
    if values.len() < required {
        return Err(DatabaseError::InsufficientSamples {
            required,
            actual: values.len(),
        });
    }
    Ok(())
}

/// Sum of squared deviations from the mean, two-pass.
fn sum_sq_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|x| (x - mean).powi(2)).sum()
}

impl Aggregator {
    /// Smallest input the aggregator accepts.
    pub fn min_samples(self) -> usize {
        match self {
            Aggregator::StdDev | Aggregator::Var => 2,
            Aggregator::Average | Aggregator::StdDevP | Aggregator::VarP => 1,
            _ => 0,
        }
    }

    /// Reduce `values`. A result that overflows to infinity (or is NaN) is
    /// reported as [`DatabaseError::NonFinite`].
    pub fn apply(self, values: &[f64]) -> Result<f64, DatabaseError> {
        require(values, self.min_samples())?;
        let n = values.len() as f64;
        let out = match self {
            Aggregator::Sum => values.iter().sum(),
            Aggregator::Average => values.iter().sum::<f64>() / n,
            Aggregator::Count => n,
            // empty Max/Min/Product report 0, as the spreadsheet functions do
            Aggregator::Max => values.iter().copied().reduce(f64::max).unwrap_or(0.0),
            Aggregator::Min => values.iter().copied().reduce(f64::min).unwrap_or(0.0),
            Aggregator::Product if values.is_empty() => 0.0,
            Aggregator::Product => values.iter().product(),
            Aggregator::Var => sum_sq_dev(values) / (n - 1.0),
            Aggregator::VarP => sum_sq_dev(values) / n,
            Aggregator::StdDev => (sum_sq_dev(values) / (n - 1.0)).sqrt(),
            Aggregator::StdDevP => (sum_sq_dev(values) / n).sqrt(),
        };
        if !out.is_finite() {
            return Err(DatabaseError::NonFinite);
        }
        Ok(out)
    }
}
