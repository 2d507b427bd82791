//! Human-readable output on stdout

use crate::config::CliConfig;
use console::Style;
use gcov_session::{CoverageSummary, FinishSummary, RunSummary};

/// Writes status lines, honoring quiet mode and color choice
#[derive(Debug, Clone)]
pub struct Printer {
    quiet: bool,
    ok: Style,
    warn: Style,
    dim: Style,
}

impl Printer {
    /// Create a printer for the given configuration
    #[must_use]
    pub fn new(config: &CliConfig) -> Self {
        let color = config.color.should_color();
        let styled = |style: Style| style.force_styling(color);
        Self {
            quiet: config.verbosity.is_quiet(),
            ok: styled(Style::new().green().bold()),
            warn: styled(Style::new().yellow().bold()),
            dim: styled(Style::new().dim()),
        }
    }

    /// Print a line unless quiet
    pub fn line(&self, message: &str) {
        if !self.quiet {
            println!("{message}");
        }
    }

    /// Report a started session
    pub fn started(&self, dir: &std::path::Path) {
        self.line(&format!(
            "{} coverage session in {}",
            self.ok.apply_to("Started"),
            dir.display()
        ));
    }

    /// Report one recorded run
    pub fn recorded(&self, run: &RunSummary) {
        self.line(&format!(
            "{} {} {}",
            self.ok.apply_to("Recorded"),
            run.artifact.display(),
            self.dim.apply_to(format!(
                "({} merged, {} out of scope)",
                run.merged_units.len(),
                run.out_of_scope
            ))
        ));
    }

    /// Report the end of a session
    pub fn finished(&self, summary: &FinishSummary) {
        if summary.finalized {
            self.line(&format!(
                "{} {}",
                self.ok.apply_to("Finalized"),
                format_summary(&summary.coverage)
            ));
        } else {
            self.line(&format!(
                "{} session failed; coverage left unfinalized",
                self.warn.apply_to("Finished")
            ));
        }
    }
}

/// One-line rendering of coverage totals
#[must_use]
pub fn format_summary(summary: &CoverageSummary) -> String {
    format!(
        "{} units, {}/{} lines covered ({:.1}%), {} hits",
        summary.units,
        summary.covered_lines,
        summary.executable_lines,
        summary.coverage_percent,
        summary.total_hits
    )
}
