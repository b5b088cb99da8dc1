//! Size gate and line view shared by the file validators.
//!
//! [`SourceFile::open`] enforces the byte ceiling; only a file that passed it
//! exposes its [significant lines](SourceFile::significant_lines). Comment and
//! whitespace handling lives here so the DSL parsers never see either.

use crate::{
    config::above_max,
    error::{StructuredError, saturating_i64},
};

/// Leading character of a comment line.
pub const COMMENT_MARKER: char = '%';

/// A submitted file that passed its size check.
#[derive(Clone, Copy, Debug)]
pub struct SourceFile<'a> {
    id: &'a str,
    content: &'a str,
}

impl<'a> SourceFile<'a> {
    /// Check `content` against `max_size_bytes` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`StructuredError::FileSize`] when the content is longer than
    /// the ceiling. An [`UNLIMITED`](crate::config::UNLIMITED) ceiling skips
    /// the check.
    pub fn open(id: &'a str, content: &'a str, max_size_bytes: i64) -> Result<Self, StructuredError> {
        let actual_size = saturating_i64(content.len());
        if above_max(actual_size, max_size_bytes) {
            return Err(StructuredError::FileSize {
                file_id: id.to_owned(),
                actual_size,
                max_size: max_size_bytes,
            });
        }
        Ok(Self { id, content })
    }

    /// Identifier used in error reports.
    #[must_use]
    pub const fn id(&self) -> &'a str { self.id }

    /// Trimmed lines that are neither blank nor comments.
    pub fn significant_lines(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::config::UNLIMITED;

    #[rstest]
    #[case(10, true)]
    #[case(11, true)]
    #[case(9, false)]
    #[case(UNLIMITED, true)]
    fn enforces_byte_ceiling(#[case] ceiling: i64, #[case] accepted: bool) {
        let content = "0123456789";
        let result = SourceFile::open("model", content, ceiling);
        assert_eq!(result.is_ok(), accepted);
    }

    #[rstest]
    fn size_error_reports_file_and_sizes() {
        let err = SourceFile::open("specification", "abcd", 3).expect_err("too large");
        assert_eq!(
            err,
            StructuredError::FileSize {
                file_id: "specification".into(),
                actual_size: 4,
                max_size: 3,
            }
        );
    }

    #[rstest]
    fn size_counts_bytes_not_characters() {
        // Four characters, seven bytes.
        let content = "żółw";
        assert_eq!(content.len(), 7);
        assert!(SourceFile::open("model", content, 6).is_err());
        assert!(SourceFile::open("model", content, 7).is_ok());
    }

    #[rstest]
    fn strips_comments_and_blank_lines() {
        let content = "% header\n\n  Agent A[1]:  \r\n\t% indented comment\ninit: idle\n   \n";
        let file = SourceFile::open("model", content, UNLIMITED).expect("open");
        let lines: Vec<_> = file.significant_lines().collect();
        assert_eq!(lines, ["Agent A[1]:", "init: idle"]);
    }

    #[rstest]
    fn empty_file_has_no_lines() {
        let file = SourceFile::open("model", "", 0).expect("open");
        assert_eq!(file.significant_lines().count(), 0);
    }
}
