//! Structured errors returned to API callers.
//!
//! Every failure that leaves the gateway is one [`StructuredError`]. The enum
//! serializes to a flat JSON record whose `type` field names the variant, so
//! clients can decode errors without parsing free text.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::validation::ArrayPropertyName;

/// Quantities bounded by the file limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    /// Distinct agent declarations in a model file.
    NumberOfAgentTypes,
    /// Instance count of a single agent declaration.
    NumberOfAgentsPerType,
    /// Sum of instance counts over all agent declarations.
    NumberOfAgentsTotal,
    /// Distinct state names referenced by transitions.
    NumberOfStates,
    /// Transition declarations in a model file.
    NumberOfTransitions,
    /// Entries of the `COALITION` property.
    CoalitionSize,
    /// Entries of the `PERSISTENT` property.
    NumberOfPersistentVariables,
    /// Entries of the `REDUCTION` property.
    NumberOfReductionVariables,
    /// Entries of the `GOAL` property.
    NumberOfGoalVariables,
    /// Mapping lines in a bisimulation specification.
    NumberOfMappings,
}

impl Metric {
    /// Wire name of the metric.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NumberOfAgentTypes => "numberOfAgentTypes",
            Self::NumberOfAgentsPerType => "numberOfAgentsPerType",
            Self::NumberOfAgentsTotal => "numberOfAgentsTotal",
            Self::NumberOfStates => "numberOfStates",
            Self::NumberOfTransitions => "numberOfTransitions",
            Self::CoalitionSize => "coalitionSize",
            Self::NumberOfPersistentVariables => "numberOfPersistentVariables",
            Self::NumberOfReductionVariables => "numberOfReductionVariables",
            Self::NumberOfGoalVariables => "numberOfGoalVariables",
            Self::NumberOfMappings => "numberOfMappings",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// Errors reported to callers of the compute API.
///
/// User-input variants (`FileSizeError` through `FileFormatError`) describe a
/// request the caller must fix. The remaining variants describe engine or
/// gateway faults.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum StructuredError {
    /// A submitted file is larger than its configured ceiling.
    #[serde(rename = "FileSizeError")]
    #[error("file '{file_id}' is {actual_size} bytes, above the limit of {max_size}")]
    FileSize {
        /// Identifier of the offending file.
        file_id: String,
        /// Byte length of the submitted content.
        actual_size: i64,
        /// Configured byte ceiling.
        max_size: i64,
    },
    /// A model parameter lies outside its configured range.
    #[serde(rename = "ParameterRangeError")]
    #[error("parameter '{parameter_name}' = {value} is outside [{min}, {max}]")]
    ParameterRange {
        /// Wire name of the parameter.
        parameter_name: String,
        /// Submitted value.
        value: i64,
        /// Lower bound, or the unlimited sentinel.
        min: i64,
        /// Upper bound, or the unlimited sentinel.
        max: i64,
    },
    /// A counted quantity in a file exceeds its configured maximum.
    #[serde(rename = "MaxNumberExceededError")]
    #[error("{metric_name} = {actual_value} exceeds the maximum of {max_value}")]
    MaxNumberExceeded {
        /// Quantity that overflowed.
        metric_name: Metric,
        /// Observed value.
        actual_value: i64,
        /// Configured maximum.
        max_value: i64,
    },
    /// An array property was declared more than once in a model file.
    #[serde(rename = "DuplicatePropertyError")]
    #[error("property {property_name} is declared more than once")]
    DuplicateProperty {
        /// Name of the repeated property.
        property_name: ArrayPropertyName,
    },
    /// A file could not be parsed.
    #[serde(rename = "FileFormatError")]
    #[error("file '{file_id}' is malformed")]
    FileFormat {
        /// Identifier of the offending file.
        file_id: String,
    },
    /// The engine could not be launched or failed while running.
    #[serde(rename = "ComputeError")]
    #[error("engine failure: {message}")]
    Compute {
        /// Human-readable failure description.
        message: String,
    },
    /// The engine did not finish within the configured ceiling.
    #[serde(rename = "MaxExecutionTimeExceededError")]
    #[error("engine exceeded the maximum execution time")]
    MaxExecutionTimeExceeded,
    /// Fallback for failures that fit no other variant.
    #[serde(rename = "UnknownError")]
    #[error("unknown error")]
    Unknown {
        /// Optional diagnostic detail.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extra: Option<String>,
    },
}

impl StructuredError {
    /// Build a [`StructuredError::Compute`] from any displayable message.
    pub fn compute(message: impl Into<String>) -> Self {
        Self::Compute {
            message: message.into(),
        }
    }

    /// Build a [`StructuredError::FileFormat`] for the given file.
    pub fn file_format(file_id: impl Into<String>) -> Self {
        Self::FileFormat {
            file_id: file_id.into(),
        }
    }

    /// Build a [`StructuredError::Unknown`] carrying diagnostic detail.
    pub fn unknown(extra: impl Into<String>) -> Self {
        Self::Unknown {
            extra: Some(extra.into()),
        }
    }

    /// Whether the error describes a request the caller must correct.
    #[must_use]
    pub const fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::FileSize { .. }
                | Self::ParameterRange { .. }
                | Self::MaxNumberExceeded { .. }
                | Self::DuplicateProperty { .. }
                | Self::FileFormat { .. }
        )
    }

    /// Wire discriminant of the variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::FileSize { .. } => "FileSizeError",
            Self::ParameterRange { .. } => "ParameterRangeError",
            Self::MaxNumberExceeded { .. } => "MaxNumberExceededError",
            Self::DuplicateProperty { .. } => "DuplicatePropertyError",
            Self::FileFormat { .. } => "FileFormatError",
            Self::Compute { .. } => "ComputeError",
            Self::MaxExecutionTimeExceeded => "MaxExecutionTimeExceededError",
            Self::Unknown { .. } => "UnknownError",
        }
    }

    /// Serialize into the JSON record sent to callers.
    ///
    /// Serialization failures degrade to an `UnknownError` record so callers
    /// always receive a decodable body.
    #[must_use]
    pub fn to_json_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|err| {
            json!({
                "type": "UnknownError",
                "extra": err.to_string(),
            })
        })
    }
}

/// Convert a count into the signed representation used by the limits.
pub(crate) fn saturating_i64(count: usize) -> i64 { i64::try_from(count).unwrap_or(i64::MAX) }
