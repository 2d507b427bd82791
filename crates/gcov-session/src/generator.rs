//! Report generator seam
//!
//! The toolchain's report generator turns one coverage data artifact into
//! zero or more raw `*.gcov` reports in an output directory.

use crate::config::GeneratorConfig;
use crate::result::{SessionError, SessionResult};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Produces raw reports for a coverage data artifact
pub trait ReportGenerator {
    /// Write the reports for `artifact` into `output_dir`
    ///
    /// # Errors
    ///
    /// Returns `ToolInvocationFailure` if the generator fails
    fn generate(&self, artifact: &Path, output_dir: &Path) -> SessionResult<()>;
}

/// Runs `gcov` (or a compatible program) as a child process
#[derive(Debug, Clone)]
pub struct GcovTool {
    program: String,
    args: Vec<String>,
}

impl GcovTool {
    /// Create a tool running `program args... <artifact>`
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Create from configuration
    #[must_use]
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    /// Program being run
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for GcovTool {
    fn default() -> Self {
        Self::from_config(&GeneratorConfig::default())
    }
}

impl ReportGenerator for GcovTool {
    fn generate(&self, artifact: &Path, output_dir: &Path) -> SessionResult<()> {
        debug!(program = %self.program, artifact = %artifact.display(), "running report generator");

        let failure = |status: String, output: String| SessionError::ToolInvocationFailure {
            program: self.program.clone(),
            artifact: artifact.to_path_buf(),
            status,
            output,
        };

        // gcov writes its reports into the working directory
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(artifact)
            .current_dir(output_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| failure(format!("spawn failed: {e}"), String::new()))?;

        let mut messages = String::from_utf8_lossy(&output.stdout).into_owned();
        messages.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(failure(output.status.to_string(), messages));
        }
        debug!(output = %messages.trim_end(), "report generator finished");
        Ok(())
    }
}
