//! Limit checks for bisimulation mapping files.

use super::{SourceFile, check_count};
use crate::{
    config::MappingFileLimits,
    error::{Metric, StructuredError},
};

const MAPPING_ARROW: &str = "->";

/// Validate a mapping file and return its number of mappings.
///
/// Every significant line containing `->` counts as one mapping.
///
/// # Errors
///
/// Returns [`StructuredError::FileSize`] when the file is too large and
/// [`StructuredError::MaxNumberExceeded`] when it holds too many mappings.
pub fn validate_mapping_file(
    file_id: &str,
    content: &str,
    limits: &MappingFileLimits,
) -> Result<usize, StructuredError> {
    let file = SourceFile::open(file_id, content, limits.max_file_size_bytes)?;
    let mappings = file
        .significant_lines()
        .filter(|line| line.contains(MAPPING_ARROW))
        .count();
    check_count(Metric::NumberOfMappings, mappings, limits.max_number_of_mappings)?;
    Ok(mappings)
}
