//! Diagnostic logging setup
//!
//! Logs go to stderr so that `summary --json` and `lcov` output on stdout
//! stays machine readable. `RUST_LOG` takes precedence over `-v`/`-q`.

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use tracing_subscriber::EnvFilter;

/// Filter directives for a verbosity level
#[must_use]
pub fn default_directives(config: &CliConfig) -> String {
    let level = config.verbosity.log_level();
    format!("gcov_session={level},gcov_session_cli={level}")
}

fn resolve_filter(config: &CliConfig) -> CliResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_directives(config))
            .map_err(|e| CliError::logging(e.to_string())),
    }
}

/// Install the global stderr subscriber
///
/// # Errors
///
/// Returns `Logging` if the filter is invalid or a subscriber is already set
pub fn init(config: &CliConfig) -> CliResult<()> {
    let filter = resolve_filter(config)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(config.color.should_color())
        .with_target(config.verbosity.is_verbose())
        .try_init()
        .map_err(|e| CliError::logging(e.to_string()))
}
