//! Line records
//!
//! One line of a coverage report. Status is an explicit tagged value; the
//! string sentinels that encode it on disk live in [`super::sentinel`] only.

/// Execution status of a single source line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineStatus {
    /// The line carries no executable code
    NonExecutable,
    /// The line is executable and ran this many times (possibly zero)
    Count(u64),
}

impl LineStatus {
    /// Check if the line holds executable code
    #[inline]
    #[must_use]
    pub const fn is_executable(self) -> bool {
        matches!(self, Self::Count(_))
    }

    /// Check if the line ran at least once
    #[inline]
    #[must_use]
    pub const fn is_covered(self) -> bool {
        matches!(self, Self::Count(n) if n > 0)
    }

    /// Execution count, `None` for non-executable lines
    #[inline]
    #[must_use]
    pub const fn count(self) -> Option<u64> {
        match self {
            Self::NonExecutable => None,
            Self::Count(n) => Some(n),
        }
    }
}

/// One line of a coverage report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    /// Execution status
    pub status: LineStatus,
    /// 1-based line in the original source file
    pub line_number: u32,
    /// Verbatim source text (display only)
    pub text: String,
}

impl LineRecord {
    /// Create a new line record
    #[must_use]
    pub fn new(status: LineStatus, line_number: u32, text: impl Into<String>) -> Self {
        Self {
            status,
            line_number,
            text: text.into(),
        }
    }

    /// Create a record for a line without executable code
    #[must_use]
    pub fn non_executable(line_number: u32, text: impl Into<String>) -> Self {
        Self::new(LineStatus::NonExecutable, line_number, text)
    }

    /// Create a record for an executable line
    #[must_use]
    pub fn counted(count: u64, line_number: u32, text: impl Into<String>) -> Self {
        Self::new(LineStatus::Count(count), line_number, text)
    }

    /// Check if both records denote the same physical source line
    #[must_use]
    pub fn same_line(&self, other: &Self) -> bool {
        self.line_number == other.line_number && self.text == other.text
    }
}
