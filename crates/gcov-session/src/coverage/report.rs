//! Coverage Report Reader and Writer
//!
//! A report is the per-source-unit line listing gcov writes for one
//! coverage data artifact:
//!
//! ```text
//!         -:    0:Source:/work/avm/src/private/stack.c
//!         -:    0:Graph:_ffi_test_stack.gcno
//!         -:    0:Data:_ffi_test_stack.gcda
//!         -:    0:Runs:1
//!         -:    1:#include "stack.h"
//!         3:    2:int push(astack_t *s) {
//!     #####:    3:    return 0;
//! ```
//!
//! Every line has three colon-separated fields. The first record is the
//! `Source:` header; later line-0 records are per-run metadata and are
//! dropped while parsing.

use super::{LineRecord, LineStatus, SentinelConvention, NON_EXECUTABLE};
use crate::result::{SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::Path;

const SOURCE_TAG: &str = "Source:";

/// Coverage summary statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    /// Number of source units summarized
    pub units: usize,
    /// Lines holding executable code
    pub executable_lines: usize,
    /// Executable lines that ran at least once
    pub covered_lines: usize,
    /// Sum of all execution counts
    pub total_hits: u64,
    /// Covered share of executable lines
    pub coverage_percent: f64,
}

impl Default for CoverageSummary {
    fn default() -> Self {
        Self {
            units: 0,
            executable_lines: 0,
            covered_lines: 0,
            total_hits: 0,
            coverage_percent: percent(0, 0),
        }
    }
}

impl CoverageSummary {
    /// Fold another summary into this one
    pub fn combine(&mut self, other: &Self) {
        self.units += other.units;
        self.executable_lines += other.executable_lines;
        self.covered_lines += other.covered_lines;
        self.total_hits = self.total_hits.saturating_add(other.total_hits);
        self.coverage_percent = percent(self.covered_lines, self.executable_lines);
    }
}

fn percent(covered: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0; // Vacuously true
    }
    (covered as f64 / total as f64) * 100.0
}

/// Line coverage for one source unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageReport {
    /// Path from the `Source:` header
    source: String,
    /// Source lines in file order
    lines: Vec<LineRecord>,
}

impl CoverageReport {
    /// Create a report from already-parsed lines
    #[must_use]
    pub fn new(source: impl Into<String>, lines: Vec<LineRecord>) -> Self {
        Self {
            source: source.into(),
            lines,
        }
    }

    /// Read only the header of `text`, returning the source path
    ///
    /// # Errors
    ///
    /// Returns `MalformedReport` if the first line is not a `Source:` header
    pub fn read_source(text: &str, origin: &Path) -> SessionResult<String> {
        let first = text
            .lines()
            .next()
            .ok_or_else(|| SessionError::malformed(origin, 1, "empty report"))?;
        let (_, number, rest) = split_fields(first).ok_or_else(|| {
            SessionError::malformed(origin, 1, "expected `<status>:<line>:<text>`")
        })?;
        if number.trim() != "0" {
            return Err(SessionError::malformed(
                origin,
                1,
                format!("header must be line 0, found `{}`", number.trim()),
            ));
        }
        let source = rest.strip_prefix(SOURCE_TAG).ok_or_else(|| {
            SessionError::malformed(origin, 1, "first record is not a `Source:` header")
        })?;
        Ok(source.trim().to_string())
    }

    /// Parse report text written in `convention`
    ///
    /// `origin` is only used to identify the report in errors.
    ///
    /// # Errors
    ///
    /// Returns `MalformedReport` on the first line that does not split into
    /// three fields, has a non-numeric line number, or has a status token
    /// that is invalid in `convention`
    pub fn parse(text: &str, origin: &Path, convention: SentinelConvention) -> SessionResult<Self> {
        let source = Self::read_source(text, origin)?;
        let mut lines = Vec::new();

        for (idx, row) in text.lines().enumerate().skip(1) {
            let row_no = idx + 1;
            let (status, number, source_text) = split_fields(row).ok_or_else(|| {
                SessionError::malformed(origin, row_no, "expected `<status>:<line>:<text>`")
            })?;
            let number = number.trim();
            let line_number: u32 = number.parse().map_err(|_| {
                SessionError::malformed(origin, row_no, format!("invalid line number `{number}`"))
            })?;
            if line_number == 0 {
                // Graph:/Data:/Runs:/Programs: preamble
                continue;
            }
            let status = convention
                .parse(status.trim())
                .map_err(|reason| SessionError::malformed(origin, row_no, reason))?;
            lines.push(LineRecord::new(status, line_number, source_text));
        }

        Ok(Self { source, lines })
    }

    /// Render as report text in `convention`
    #[must_use]
    pub fn render(&self, convention: SentinelConvention) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "{NON_EXECUTABLE:>9}:{:>5}:{SOURCE_TAG}{}", 0, self.source);
        for line in &self.lines {
            let _ = writeln!(
                output,
                "{:>9}:{:>5}:{}",
                convention.render(line.status),
                line.line_number,
                line.text
            );
        }
        output
    }

    /// Replace the header path
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Path from the `Source:` header
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Source lines in file order
    #[must_use]
    pub fn lines(&self) -> &[LineRecord] {
        &self.lines
    }

    /// Consume the report, returning its lines
    #[must_use]
    pub fn into_lines(self) -> Vec<LineRecord> {
        self.lines
    }

    /// Number of source lines (the header is not counted)
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the report has no source lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Status of a 1-based source line
    #[must_use]
    pub fn status_of(&self, line_number: u32) -> Option<LineStatus> {
        self.lines
            .iter()
            .find(|l| l.line_number == line_number)
            .map(|l| l.status)
    }

    /// Get coverage summary
    #[must_use]
    pub fn summary(&self) -> CoverageSummary {
        let executable = self.lines.iter().filter(|l| l.status.is_executable());
        let executable_lines = executable.clone().count();
        let covered_lines = executable.clone().filter(|l| l.status.is_covered()).count();
        let total_hits = executable
            .filter_map(|l| l.status.count())
            .fold(0u64, u64::saturating_add);
        CoverageSummary {
            units: 1,
            executable_lines,
            covered_lines,
            total_hits,
            coverage_percent: percent(covered_lines, executable_lines),
        }
    }
}

/// A report stored in the accumulation area under its unit key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulatedReport {
    unit: String,
    report: CoverageReport,
}

impl AccumulatedReport {
    /// Key a report by its source unit file name
    #[must_use]
    pub fn new(unit: impl Into<String>, report: CoverageReport) -> Self {
        Self {
            unit: unit.into(),
            report,
        }
    }

    /// Unit key (the report's file name)
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Accumulated line data
    #[must_use]
    pub fn report(&self) -> &CoverageReport {
        &self.report
    }

    /// Split into key and report
    #[must_use]
    pub fn into_parts(self) -> (String, CoverageReport) {
        (self.unit, self.report)
    }
}

fn split_fields(row: &str) -> Option<(&str, &str, &str)> {
    let mut fields = row.splitn(3, ':');
    Some((fields.next()?, fields.next()?, fields.next()?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const RAW: &str = "        -:    0:Source:/work/avm/src/private/stack.c
        -:    0:Graph:_ffi_test_stack.gcno
        -:    0:Data:_ffi_test_stack.gcda
        -:    0:Runs:1
        -:    0:Programs:1
        -:    1:#include \"stack.h\"
        3:    2:int push(astack_t *s) {
    #####:    3:    return 0;
        2*:   4:    if (a) b(); else c();
        -:    5:}
";

    fn origin() -> &'static Path {
        Path::new("stack.c.gcov")
    }

    #[test]
    fn test_parse_reads_header_source() {
        let report = CoverageReport::parse(RAW, origin(), SentinelConvention::Native).unwrap();
        assert_eq!(report.source(), "/work/avm/src/private/stack.c");
    }

    #[test]
    fn test_parse_drops_preamble() {
        let report = CoverageReport::parse(RAW, origin(), SentinelConvention::Native).unwrap();
        assert_eq!(report.len(), 5);
        assert_eq!(report.lines()[0].line_number, 1);
    }

    #[test]
    fn test_parse_statuses() {
        let report = CoverageReport::parse(RAW, origin(), SentinelConvention::Native).unwrap();
        assert_eq!(report.status_of(1), Some(LineStatus::NonExecutable));
        assert_eq!(report.status_of(2), Some(LineStatus::Count(3)));
        assert_eq!(report.status_of(3), Some(LineStatus::Count(0)));
        assert_eq!(report.status_of(4), Some(LineStatus::Count(2)));
        assert_eq!(report.status_of(99), None);
    }

    #[test]
    fn test_parse_keeps_text_verbatim() {
        let report = CoverageReport::parse(RAW, origin(), SentinelConvention::Native).unwrap();
        assert_eq!(report.lines()[2].text, "    return 0;");
        assert_eq!(report.lines()[3].text, "    if (a) b(); else c();");
    }

    #[test]
    fn test_text_may_contain_colons() {
        let raw = "-:0:Source:/a.c\n1:1:label: goto label;\n";
        let report = CoverageReport::parse(raw, origin(), SentinelConvention::Native).unwrap();
        assert_eq!(report.lines()[0].text, "label: goto label;");
    }

    #[test]
    fn test_empty_report_is_malformed() {
        let err = CoverageReport::parse("", origin(), SentinelConvention::Native).unwrap_err();
        assert!(matches!(err, SessionError::MalformedReport { line: 1, .. }));
    }

    #[test]
    fn test_missing_header_is_malformed() {
        let raw = "        1:    1:int x;\n";
        let err = CoverageReport::parse(raw, origin(), SentinelConvention::Native).unwrap_err();
        assert!(matches!(err, SessionError::MalformedReport { line: 1, .. }));
    }

    #[test]
    fn test_two_field_line_is_malformed() {
        let raw = "-:0:Source:/a.c\n1:1:ok\nbroken:line\n";
        let err = CoverageReport::parse(raw, origin(), SentinelConvention::Native).unwrap_err();
        match err {
            SessionError::MalformedReport { line, path, .. } => {
                assert_eq!(line, 3);
                assert_eq!(path, origin());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_line_number_is_malformed() {
        let raw = "-:0:Source:/a.c\n1:x:int y;\n";
        let err = CoverageReport::parse(raw, origin(), SentinelConvention::Native).unwrap_err();
        assert!(err.to_string().contains("invalid line number"));
    }

    #[test]
    fn test_bad_status_is_malformed() {
        let raw = "-:0:Source:/a.c\n#####:1:int y;\n";
        let err = CoverageReport::parse(raw, origin(), SentinelConvention::Internal).unwrap_err();
        assert!(matches!(err, SessionError::MalformedReport { line: 2, .. }));
    }

    #[test]
    fn test_render_uses_convention() {
        let report = CoverageReport::new(
            "avm/src/private/stack.c",
            vec![
                LineRecord::non_executable(1, "#include \"stack.h\""),
                LineRecord::counted(0, 2, "  return 0;"),
                LineRecord::counted(7, 3, "}"),
            ],
        );
        let native = report.render(SentinelConvention::Native);
        assert_eq!(
            native,
            "        -:    0:Source:avm/src/private/stack.c\n        -:    1:#include \"stack.h\"\n    #####:    2:  return 0;\n        7:    3:}\n"
        );
        let internal = report.render(SentinelConvention::Internal);
        assert!(internal.contains("        0:    2:  return 0;"));
    }

    #[test]
    fn test_render_then_parse_preserves_report() {
        let report = CoverageReport::parse(RAW, origin(), SentinelConvention::Native).unwrap();
        for convention in [SentinelConvention::Native, SentinelConvention::Internal] {
            let text = report.render(convention);
            let back = CoverageReport::parse(&text, origin(), convention).unwrap();
            assert_eq!(back, report);
        }
    }

    #[test]
    fn test_summary_excludes_non_executable() {
        let report = CoverageReport::parse(RAW, origin(), SentinelConvention::Native).unwrap();
        let summary = report.summary();
        assert_eq!(summary.units, 1);
        assert_eq!(summary.executable_lines, 3);
        assert_eq!(summary.covered_lines, 2);
        assert_eq!(summary.total_hits, 5);
    }

    #[test]
    fn test_summary_of_empty_report_is_full() {
        let summary = CoverageReport::new("/a.c", Vec::new()).summary();
        assert_eq!(summary.coverage_percent, 100.0);
        assert_eq!(CoverageSummary::default().coverage_percent, 100.0);
    }

    #[test]
    fn test_summary_combine() {
        let a = CoverageReport::new("/a.c", vec![LineRecord::counted(1, 1, "x")]).summary();
        let b = CoverageReport::new("/b.c", vec![LineRecord::counted(0, 1, "y")]).summary();
        let mut total = CoverageSummary::default();
        total.combine(&a);
        total.combine(&b);
        assert_eq!(total.units, 2);
        assert_eq!(total.executable_lines, 2);
        assert_eq!(total.covered_lines, 1);
        assert_eq!(total.coverage_percent, 50.0);
    }

    #[test]
    fn test_with_source_renames_header() {
        let report = CoverageReport::new("/abs/a.c", Vec::new()).with_source("avm/a.c");
        assert_eq!(report.source(), "avm/a.c");
    }
}
