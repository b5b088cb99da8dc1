//! Input validation run before any engine invocation.
//!
//! Validators are pure functions over the request and the read-only
//! [`ServiceLimits`](crate::config::ServiceLimits). Each one returns the first
//! violated constraint as a [`StructuredError`].

pub mod bounds;
pub mod file;
pub mod mapping_file;
pub mod model_file;

pub use bounds::{Parametric, check_bounds};
pub use file::SourceFile;
pub use mapping_file::validate_mapping_file;
pub use model_file::{ArrayPropertyName, ModelSummary, validate_model_file};

use crate::{
    config::above_max,
    error::{Metric, StructuredError, saturating_i64},
};

/// Fail with [`StructuredError::MaxNumberExceeded`] when `count` is above `max`.
pub(crate) fn check_count(metric: Metric, count: usize, max: i64) -> Result<(), StructuredError> {
    check_quantity(metric, saturating_i64(count), max)
}

/// Fail with [`StructuredError::MaxNumberExceeded`] when `actual_value` is above `max`.
pub(crate) fn check_quantity(
    metric: Metric,
    actual_value: i64,
    max: i64,
) -> Result<(), StructuredError> {
    if above_max(actual_value, max) {
        return Err(StructuredError::MaxNumberExceeded {
            metric_name: metric,
            actual_value,
            max_value: max,
        });
    }
    Ok(())
}
