//! Merge Engine
//!
//! Sums an incoming report into the report already accumulated for the
//! same unit. The two line tables must agree exactly; anything else means
//! the source changed mid-session or two files collided on one key, and
//! summing misaligned lines would produce meaningless totals.

use super::{AccumulatedReport, CoverageReport, LineRecord, LineStatus};
use crate::result::{SessionError, SessionResult};

/// Merge `incoming` into `existing`
///
/// With no existing report the incoming one is returned unchanged. The
/// operation is commutative and associative over reports with matching
/// line tables.
///
/// # Errors
///
/// Returns `CoverageLineTableMismatch` if the units, source paths, line
/// counts, line identities or executability of any line disagree
pub fn merge(
    existing: Option<AccumulatedReport>,
    incoming: AccumulatedReport,
) -> SessionResult<AccumulatedReport> {
    let Some(existing) = existing else {
        return Ok(incoming);
    };

    let (unit, incoming) = incoming.into_parts();
    let (existing_unit, existing) = existing.into_parts();
    if existing_unit != unit {
        return Err(SessionError::mismatch(
            unit,
            format!("cannot merge into the report for {existing_unit}"),
        ));
    }
    if existing.source() != incoming.source() {
        return Err(SessionError::mismatch(
            unit,
            format!(
                "source {} collides with accumulated source {}",
                incoming.source(),
                existing.source()
            ),
        ));
    }
    if existing.len() != incoming.len() {
        return Err(SessionError::mismatch(
            unit,
            format!(
                "{} lines accumulated, {} lines incoming",
                existing.len(),
                incoming.len()
            ),
        ));
    }

    let source = incoming.source().to_string();
    let lines = existing
        .into_lines()
        .into_iter()
        .zip(incoming.into_lines())
        .map(|(acc, new)| merge_line(&unit, acc, &new))
        .collect::<SessionResult<Vec<_>>>()?;

    Ok(AccumulatedReport::new(unit, CoverageReport::new(source, lines)))
}

fn merge_line(unit: &str, acc: LineRecord, new: &LineRecord) -> SessionResult<LineRecord> {
    if !acc.same_line(new) {
        return Err(SessionError::mismatch(
            unit,
            format!(
                "line {} `{}` does not match incoming line {} `{}`",
                acc.line_number, acc.text, new.line_number, new.text
            ),
        ));
    }
    let status = match (acc.status, new.status) {
        (LineStatus::NonExecutable, LineStatus::NonExecutable) => LineStatus::NonExecutable,
        (LineStatus::Count(a), LineStatus::Count(b)) => LineStatus::Count(a.saturating_add(b)),
        _ => {
            return Err(SessionError::mismatch(
                unit,
                format!(
                    "line {} is executable in one report and not in the other",
                    acc.line_number
                ),
            ))
        }
    };
    Ok(LineRecord { status, ..acc })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn unit(lines: Vec<LineRecord>) -> AccumulatedReport {
        AccumulatedReport::new("foo.c.gcov", CoverageReport::new("avm/foo.c", lines))
    }

    #[test]
    fn test_first_merge_stores_incoming() {
        let incoming = unit(vec![LineRecord::counted(1, 1, "x")]);
        let merged = merge(None, incoming.clone()).unwrap();
        assert_eq!(merged, incoming);
    }

    #[test]
    fn test_counts_are_summed() {
        let a = unit(vec![LineRecord::counted(2, 1, "x"), LineRecord::counted(0, 2, "y")]);
        let b = unit(vec![LineRecord::counted(3, 1, "x"), LineRecord::counted(0, 2, "y")]);
        let merged = merge(Some(a), b).unwrap();
        assert_eq!(merged.report().status_of(1), Some(LineStatus::Count(5)));
        assert_eq!(merged.report().status_of(2), Some(LineStatus::Count(0)));
    }

    #[test]
    fn test_non_executable_survives() {
        let a = unit(vec![LineRecord::non_executable(1, "}")]);
        let b = unit(vec![LineRecord::non_executable(1, "}")]);
        let merged = merge(Some(a), b).unwrap();
        assert_eq!(merged.report().status_of(1), Some(LineStatus::NonExecutable));
    }

    #[test]
    fn test_mixed_executability_is_mismatch() {
        let a = unit(vec![LineRecord::non_executable(1, "x")]);
        let b = unit(vec![LineRecord::counted(0, 1, "x")]);
        let err = merge(Some(a), b).unwrap_err();
        assert!(matches!(err, SessionError::CoverageLineTableMismatch { .. }));
    }

    #[test]
    fn test_length_difference_is_mismatch() {
        let a = unit(vec![LineRecord::counted(1, 1, "x")]);
        let b = unit(vec![LineRecord::counted(1, 1, "x"), LineRecord::counted(1, 2, "y")]);
        let err = merge(Some(a), b).unwrap_err();
        assert!(err.to_string().contains("1 lines accumulated, 2 lines incoming"));
    }

    #[test]
    fn test_text_difference_is_mismatch() {
        let a = unit(vec![LineRecord::counted(1, 1, "int x;")]);
        let b = unit(vec![LineRecord::counted(1, 1, "int y;")]);
        assert!(merge(Some(a), b).is_err());
    }

    #[test]
    fn test_source_collision_is_mismatch() {
        let a = unit(vec![LineRecord::counted(1, 1, "x")]);
        let b = AccumulatedReport::new(
            "foo.c.gcov",
            CoverageReport::new("avm/other/foo.c", vec![LineRecord::counted(1, 1, "x")]),
        );
        let err = merge(Some(a), b).unwrap_err();
        assert!(err.to_string().contains("collides"));
    }

    #[test]
    fn test_unit_difference_is_mismatch() {
        let a = unit(vec![]);
        let b = AccumulatedReport::new("bar.c.gcov", CoverageReport::new("avm/foo.c", vec![]));
        assert!(merge(Some(a), b).is_err());
    }

    #[test]
    fn test_counts_saturate() {
        let a = unit(vec![LineRecord::counted(u64::MAX, 1, "x")]);
        let b = unit(vec![LineRecord::counted(1, 1, "x")]);
        let merged = merge(Some(a), b).unwrap();
        assert_eq!(merged.report().status_of(1), Some(LineStatus::Count(u64::MAX)));
    }
}
