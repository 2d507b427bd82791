//! Accumulation area
//!
//! One report file per source unit, named after the unit. Reports are kept
//! in the internal sentinel convention while a session is active and in the
//! native convention once it has been finalized.

use crate::coverage::{AccumulatedReport, CoverageReport, SentinelConvention};
use crate::result::{IoContext, SessionError, SessionResult};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Extension of report files
pub const REPORT_EXTENSION: &str = "gcov";

/// Marker left in the area by a session-aborting error
pub const ABORT_MARKER: &str = ".aborted";

/// On-disk store of accumulated reports
#[derive(Debug, Clone)]
pub struct AccumulationArea {
    dir: PathBuf,
}

impl AccumulationArea {
    /// Open the area rooted at `dir` (nothing is created)
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the reports
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Check if the area exists on disk
    #[must_use]
    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Delete the area and recreate it empty
    ///
    /// # Errors
    ///
    /// Returns `Filesystem` if removal or creation fails
    pub fn reset(&self) -> SessionResult<()> {
        remove_dir_if_exists(&self.dir)?;
        fs::create_dir_all(&self.dir).at(&self.dir)
    }

    /// Move the area to `<dir>.previous`, then recreate it empty
    ///
    /// Any older `.previous` directory is replaced.
    ///
    /// # Errors
    ///
    /// Returns `Filesystem` if any step fails
    pub fn archive_and_reset(&self) -> SessionResult<Option<PathBuf>> {
        let archived = if self.exists() {
            let target = self.archive_dir();
            remove_dir_if_exists(&target)?;
            fs::rename(&self.dir, &target).at(&self.dir)?;
            Some(target)
        } else {
            None
        };
        self.reset()?;
        Ok(archived)
    }

    /// Sibling directory used by [`Self::archive_and_reset`]
    #[must_use]
    pub fn archive_dir(&self) -> PathBuf {
        let mut name = self
            .dir
            .file_name()
            .map_or_else(|| OsString::from("accumulated"), OsString::from);
        name.push(".previous");
        self.dir.with_file_name(name)
    }

    /// Record that the session hit an aborting error
    ///
    /// # Errors
    ///
    /// Returns `Filesystem` if the marker cannot be written
    pub fn mark_aborted(&self, reason: &str) -> SessionResult<()> {
        let path = self.dir.join(ABORT_MARKER);
        fs::write(&path, format!("{reason}\n")).at(&path)
    }

    /// Reason recorded by [`Self::mark_aborted`], if any
    #[must_use]
    pub fn abort_reason(&self) -> Option<String> {
        fs::read_to_string(self.dir.join(ABORT_MARKER))
            .ok()
            .map(|r| r.trim_end().to_string())
    }

    /// Path of the report for `unit`
    #[must_use]
    pub fn path_for(&self, unit: &str) -> PathBuf {
        self.dir.join(unit)
    }

    /// Unit keys present in the area, sorted
    ///
    /// # Errors
    ///
    /// Returns `Filesystem` if the directory cannot be listed
    pub fn units(&self) -> SessionResult<Vec<String>> {
        Ok(list_reports(&self.dir)?
            .iter()
            .filter_map(|p| unit_key(p))
            .collect())
    }

    /// Load the report for `unit` as written while accumulating
    ///
    /// # Errors
    ///
    /// Returns `Filesystem` on read failure, `MalformedReport` on parse failure
    pub fn load(&self, unit: &str) -> SessionResult<Option<AccumulatedReport>> {
        self.load_as(unit, SentinelConvention::Internal)
    }

    /// Load the report for `unit` written in `convention`
    ///
    /// # Errors
    ///
    /// Returns `Filesystem` on read failure, `MalformedReport` on parse failure
    pub fn load_as(
        &self,
        unit: &str,
        convention: SentinelConvention,
    ) -> SessionResult<Option<AccumulatedReport>> {
        let path = self.path_for(unit);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionError::filesystem(&path, e)),
        };
        let report = CoverageReport::parse(&text, &path, convention)?;
        Ok(Some(AccumulatedReport::new(unit, report)))
    }

    /// Load every report, accepting either convention
    ///
    /// # Errors
    ///
    /// Returns `Filesystem` on read failure, `MalformedReport` on parse failure
    pub fn load_all(&self) -> SessionResult<Vec<AccumulatedReport>> {
        // Native parsing is a superset of internal parsing
        self.units()?
            .into_iter()
            .filter_map(|unit| self.load_as(&unit, SentinelConvention::Native).transpose())
            .collect()
    }

    /// Write a report for its unit in the internal convention
    ///
    /// # Errors
    ///
    /// Returns `Filesystem` if the write fails
    pub fn store(&self, report: &AccumulatedReport) -> SessionResult<()> {
        self.store_as(report, SentinelConvention::Internal)
    }

    /// Write a report for its unit in `convention`
    ///
    /// The file is replaced atomically so an interrupted write never leaves
    /// a truncated report behind.
    ///
    /// # Errors
    ///
    /// Returns `Filesystem` if the write fails
    pub fn store_as(
        &self,
        report: &AccumulatedReport,
        convention: SentinelConvention,
    ) -> SessionResult<()> {
        let path = self.path_for(report.unit());
        let tmp = self.dir.join(format!(".{}.tmp", report.unit()));
        fs::write(&tmp, report.report().render(convention)).at(&tmp)?;
        fs::rename(&tmp, &path).at(&path)
    }
}

/// Unit key of a report file: its file name
#[must_use]
pub fn unit_key(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// `*.gcov` files directly inside `dir`, sorted by path
///
/// # Errors
///
/// Returns `Filesystem` if the directory cannot be listed
pub fn list_reports(dir: &Path) -> SessionResult<Vec<PathBuf>> {
    let mut reports = Vec::new();
    for entry in fs::read_dir(dir).at(dir)? {
        let path = entry.at(dir)?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == REPORT_EXTENSION) {
            reports.push(path);
        }
    }
    reports.sort();
    Ok(reports)
}

/// Remove `dir` and everything in it, if present
///
/// # Errors
///
/// Returns `Filesystem` if removal fails for any reason other than absence
pub fn remove_dir_if_exists(dir: &Path) -> SessionResult<()> {
    match fs::remove_dir_all(dir) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(SessionError::filesystem(dir, e)),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::coverage::{LineRecord, LineStatus};

    fn sample() -> AccumulatedReport {
        AccumulatedReport::new(
            "stack.c.gcov",
            CoverageReport::new(
                "avm/src/private/stack.c",
                vec![
                    LineRecord::non_executable(1, "#include \"stack.h\""),
                    LineRecord::counted(0, 2, "  return 0;"),
                    LineRecord::counted(4, 3, "  push();"),
                ],
            ),
        )
    }

    fn area() -> (tempfile::TempDir, AccumulationArea) {
        let dir = tempfile::tempdir().unwrap();
        let area = AccumulationArea::new(dir.path().join("merged"));
        area.reset().unwrap();
        (dir, area)
    }

    #[test]
    fn test_store_then_load() {
        let (_dir, area) = area();
        area.store(&sample()).unwrap();
        assert_eq!(area.load("stack.c.gcov").unwrap(), Some(sample()));
    }

    #[test]
    fn test_store_writes_internal_zero() {
        let (_dir, area) = area();
        area.store(&sample()).unwrap();
        let text = fs::read_to_string(area.path_for("stack.c.gcov")).unwrap();
        assert!(text.contains("        0:    2:  return 0;"));
        assert!(!text.contains("#####"));
    }

    #[test]
    fn test_load_missing_unit() {
        let (_dir, area) = area();
        assert_eq!(area.load("nope.c.gcov").unwrap(), None);
    }

    #[test]
    fn test_internal_load_rejects_finalized_report() {
        let (_dir, area) = area();
        area.store_as(&sample(), SentinelConvention::Native).unwrap();
        assert!(area.load("stack.c.gcov").is_err());
        let loaded = area
            .load_as("stack.c.gcov", SentinelConvention::Native)
            .unwrap()
            .unwrap();
        assert_eq!(loaded.report().status_of(2), Some(LineStatus::Count(0)));
    }

    #[test]
    fn test_units_lists_only_reports() {
        let (_dir, area) = area();
        area.store(&sample()).unwrap();
        fs::write(area.dir().join("notes.txt"), "x").unwrap();
        assert_eq!(area.units().unwrap(), vec!["stack.c.gcov".to_string()]);
    }

    #[test]
    fn test_load_all_reads_both_conventions() {
        let (_dir, area) = area();
        area.store(&sample()).unwrap();
        let other = AccumulatedReport::new(
            "vm.c.gcov",
            CoverageReport::new("avm/src/private/vm.c", vec![LineRecord::counted(0, 1, "x")]),
        );
        area.store_as(&other, SentinelConvention::Native).unwrap();
        let all = area.load_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].report().status_of(1), Some(LineStatus::Count(0)));
    }

    #[test]
    fn test_reset_clears_reports() {
        let (_dir, area) = area();
        area.store(&sample()).unwrap();
        area.reset().unwrap();
        assert!(area.units().unwrap().is_empty());
    }

    #[test]
    fn test_archive_and_reset() {
        let (_dir, area) = area();
        area.store(&sample()).unwrap();
        let archived = area.archive_and_reset().unwrap().unwrap();
        assert!(archived.ends_with("merged.previous"));
        assert!(archived.join("stack.c.gcov").is_file());
        assert!(area.units().unwrap().is_empty());

        // A second archive replaces the first
        area.archive_and_reset().unwrap();
        assert!(!area.archive_dir().join("stack.c.gcov").exists());
    }

    #[test]
    fn test_abort_marker() {
        let (_dir, area) = area();
        assert_eq!(area.abort_reason(), None);
        area.mark_aborted("Line table mismatch for stack.c.gcov").unwrap();
        assert_eq!(
            area.abort_reason().as_deref(),
            Some("Line table mismatch for stack.c.gcov")
        );
        // Not a report
        assert!(area.units().unwrap().is_empty());

        area.reset().unwrap();
        assert_eq!(area.abort_reason(), None);
    }

    #[test]
    fn test_remove_missing_dir_is_ok() {
        remove_dir_if_exists(Path::new("/nonexistent/gcov-session/scratch")).unwrap();
    }
}
