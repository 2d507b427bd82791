//! LCOV Report Formatter
//!
//! Generates LCOV-format coverage reports from accumulated gcov reports.
//!
//! ## LCOV Format
//!
//! ```text
//! TN:<test name>
//! SF:<source file>
//! DA:<line>,<execution count>
//! LF:<lines found>
//! LH:<lines hit>
//! end_of_record
//! ```

use crate::coverage::CoverageReport;
use crate::result::{IoContext, SessionResult};
use std::fmt::Write;
use std::path::Path;

/// LCOV format report generator
#[derive(Debug)]
pub struct LcovFormatter<'a> {
    reports: Vec<&'a CoverageReport>,
    test_name: Option<String>,
}

impl<'a> LcovFormatter<'a> {
    /// Create a new LCOV formatter over a set of reports
    #[must_use]
    pub fn new(reports: impl IntoIterator<Item = &'a CoverageReport>) -> Self {
        let mut reports: Vec<_> = reports.into_iter().collect();
        reports.sort_by(|a, b| a.source().cmp(b.source()));
        Self {
            reports,
            test_name: None,
        }
    }

    /// Set the test name for the report
    #[must_use]
    pub fn with_test_name(mut self, name: impl Into<String>) -> Self {
        self.test_name = Some(name.into());
        self
    }

    /// Generate LCOV format report as a string
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        // Test name (TN)
        if let Some(ref name) = self.test_name {
            let _ = writeln!(output, "TN:{name}");
        } else {
            output.push_str("TN:\n");
        }

        for report in &self.reports {
            let _ = writeln!(output, "SF:{}", report.source());

            let mut found = 0;
            let mut hit = 0;
            for line in report.lines() {
                // Non-executable lines have no DA entry
                let Some(count) = line.status.count() else {
                    continue;
                };
                let _ = writeln!(output, "DA:{},{count}", line.line_number);
                found += 1;
                if count > 0 {
                    hit += 1;
                }
            }

            let _ = writeln!(output, "LF:{found}");
            let _ = writeln!(output, "LH:{hit}");
            output.push_str("end_of_record\n");
        }

        output
    }

    /// Save the LCOV report to a file
    ///
    /// # Errors
    ///
    /// Returns error if file write fails
    pub fn save(&self, path: &Path) -> SessionResult<()> {
        std::fs::write(path, self.generate()).at(path)
    }
}
