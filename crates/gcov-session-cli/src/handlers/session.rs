//! Lifecycle hooks: start, record, finish
//!
//! Each hook runs in its own process, so `record` and `finish` attach to
//! the accumulation area left behind by `start`.

use super::load_session_config;
use crate::commands::{FinishArgs, RecordArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::Printer;
use gcov_session::{FinishStatus, Session};
use tracing::debug;

/// Execute the start command
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the session
/// areas cannot be reset
pub fn execute_start(config: &CliConfig) -> CliResult<()> {
    let mut session = Session::new(load_session_config(config)?)?;
    session.start()?;
    Printer::new(config).started(session.area().dir());
    Ok(())
}

/// Execute the record command
///
/// # Errors
///
/// Returns an error if no artifacts were named, no session is in progress
/// or any run fails to merge
pub fn execute_record(config: &CliConfig, args: &RecordArgs) -> CliResult<()> {
    if args.artifacts.is_empty() && args.dir.is_none() {
        return Err(CliError::invalid_argument(
            "give at least one artifact or --dir",
        ));
    }

    let mut session = Session::new(load_session_config(config)?)?;
    session.attach()?;
    let printer = Printer::new(config);

    for artifact in &args.artifacts {
        let run = session.record_run(artifact)?;
        printer.recorded(&run);
    }
    if let Some(dir) = &args.dir {
        let runs = session.record_dir(dir)?;
        if runs.is_empty() {
            printer.line(&format!(
                "No artifacts matching {} in {}",
                session.config().artifact_pattern,
                dir.display()
            ));
        }
        for run in &runs {
            printer.recorded(run);
        }
    }
    Ok(())
}

/// Session outcome requested on the command line
#[must_use]
pub fn finish_status(args: &FinishArgs) -> FinishStatus {
    if args.failure {
        return FinishStatus::Failure;
    }
    args.exit_code
        .map_or(FinishStatus::Success, FinishStatus::from_exit_code)
}

/// Execute the finish command
///
/// # Errors
///
/// Returns an error if no session is in progress, the session was aborted
/// by an earlier error, or finalization fails
pub fn execute_finish(config: &CliConfig, args: &FinishArgs) -> CliResult<()> {
    let mut session = Session::new(load_session_config(config)?)?;
    session.attach()?;
    let status = finish_status(args);
    debug!(?status, "finishing coverage session");
    let summary = session.finish(status)?;
    Printer::new(config).finished(&summary);
    Ok(())
}
