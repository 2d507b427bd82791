//! Command handlers

pub mod report;
pub mod session;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use gcov_session::SessionConfig;

/// Load the session configuration named on the command line
///
/// # Errors
///
/// Returns `Config` if the file is missing, otherwise any load error
pub fn load_session_config(config: &CliConfig) -> CliResult<SessionConfig> {
    let path = &config.config_path;
    if !path.is_file() {
        return Err(CliError::config(format!(
            "session configuration {} not found (use --config)",
            path.display()
        )));
    }
    Ok(SessionConfig::from_yaml_file(path)?)
}
