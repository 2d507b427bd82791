//! Read-only inspection: summary, lcov

use super::load_session_config;
use crate::commands::{LcovArgs, SummaryArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{format_summary, Printer};
use gcov_session::{AccumulatedReport, AccumulationArea, CoverageSummary, LcovFormatter};
use tracing::warn;

/// Load every accumulated report, refusing areas an aborted or failed
/// session left behind unless `allow_unfinalized` is set
fn load_area(config: &CliConfig, allow_unfinalized: bool) -> CliResult<Vec<AccumulatedReport>> {
    let session_config = load_session_config(config)?;
    let area = AccumulationArea::new(session_config.accumulation_dir);
    if !area.exists() {
        return Err(CliError::config(format!(
            "no accumulation area at {}; run `gcov-session start` first",
            area.dir().display()
        )));
    }
    if let Some(reason) = area.abort_reason() {
        if !allow_unfinalized {
            return Err(CliError::config(format!(
                "coverage in {} is unreliable: {reason} (use --allow-unfinalized to read it anyway)",
                area.dir().display()
            )));
        }
        warn!(area = %area.dir().display(), %reason, "reading unfinalized coverage");
    }
    Ok(area.load_all()?)
}

/// Execute the summary command
///
/// # Errors
///
/// Returns an error if the accumulation area cannot be read or belongs to
/// an aborted session
pub fn execute_summary(config: &CliConfig, args: &SummaryArgs) -> CliResult<()> {
    let mut summary = CoverageSummary::default();
    for report in load_area(config, args.allow_unfinalized)? {
        summary.combine(&report.report().summary());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", format_summary(&summary));
    }
    Ok(())
}

/// Execute the lcov command
///
/// # Errors
///
/// Returns an error if the accumulation area cannot be read or the output
/// cannot be written
pub fn execute_lcov(config: &CliConfig, args: &LcovArgs) -> CliResult<()> {
    let reports = load_area(config, args.allow_unfinalized)?;
    let mut formatter = LcovFormatter::new(reports.iter().map(AccumulatedReport::report));
    if let Some(name) = &args.test_name {
        formatter = formatter.with_test_name(name.clone());
    }

    match &args.output {
        Some(path) => {
            formatter.save(path)?;
            Printer::new(config).line(&format!(
                "Wrote LCOV for {} units to {}",
                reports.len(),
                path.display()
            ));
        }
        None => print!("{}", formatter.generate()),
    }
    Ok(())
}
