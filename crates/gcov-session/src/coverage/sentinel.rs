//! Sentinel Normalizer
//!
//! Translates status tokens between gcov's native convention and the
//! convention used while reports are being accumulated.
//!
//! ```text
//! status          native    internal
//! NonExecutable   -         -
//! Count(0)        #####     0
//! Count(n)        n         n
//! ```
//!
//! The internal form keeps "executable, never hit" as a plain summable zero,
//! distinct from "never executable". Finalization switches the zeros back
//! to `#####` so downstream gcov consumers read what they expect.

use super::LineStatus;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Marker for a line without executable code
pub const NON_EXECUTABLE: &str = "-";

/// gcov marker for an executable line that never ran
pub const UNEXECUTED: &str = "#####";

/// gcov marker for an unexecuted block only reachable through exceptions
pub const UNEXECUTED_EXCEPTIONAL: &str = "=====";

/// Which status token convention a report is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentinelConvention {
    /// gcov's own convention, used by raw and finalized reports
    #[default]
    Native,
    /// Mergeable convention used inside the accumulation area
    Internal,
}

impl SentinelConvention {
    /// Parse a (trimmed) status token
    ///
    /// # Errors
    ///
    /// Returns a description of the token if it is not valid in this convention
    pub fn parse(self, token: &str) -> Result<LineStatus, String> {
        if token == NON_EXECUTABLE {
            return Ok(LineStatus::NonExecutable);
        }
        let status = match self {
            Self::Native => {
                if token == UNEXECUTED || token == UNEXECUTED_EXCEPTIONAL {
                    return Ok(LineStatus::Count(0));
                }
                // gcov appends `*` to lines that contain an unexecuted block
                parse_count(token.strip_suffix('*').unwrap_or(token))
            }
            Self::Internal => parse_count(token),
        };
        status.ok_or_else(|| format!("unrecognized {} status token `{token}`", self.name()))
    }

    /// Render a status token
    #[must_use]
    pub fn render(self, status: LineStatus) -> Cow<'static, str> {
        match (self, status) {
            (_, LineStatus::NonExecutable) => Cow::Borrowed(NON_EXECUTABLE),
            (Self::Native, LineStatus::Count(0)) => Cow::Borrowed(UNEXECUTED),
            (_, LineStatus::Count(n)) => Cow::Owned(n.to_string()),
        }
    }

    /// Re-encode a token from this convention into `target`
    ///
    /// # Errors
    ///
    /// Returns a description of the token if it is not valid in this convention
    pub fn translate(self, token: &str, target: Self) -> Result<Cow<'static, str>, String> {
        self.parse(token).map(|status| target.render(status))
    }

    /// Display name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Internal => "internal",
        }
    }
}

fn parse_count(token: &str) -> Option<LineStatus> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok().map(LineStatus::Count)
}
