//! Session Coordinator
//!
//! Owns the accumulation area and the scratch directory for one test
//! session:
//!
//! ```text
//!          start                record_run (×N)            finish
//!  Idle ──────────► Active ─────────────────────► Active ──────────► Idle
//!                     │  gcov → scope → normalize → merge    │
//!                     │                                       ├─ success: Finalizing
//!                     │                                       │  (restore native sentinels,
//!                     │                                       │   drop scratch) → Idle
//!                     │                                       └─ failure: drop scratch → Idle
//! ```
//!
//! A failed or abandoned session leaves the accumulation area in the
//! internal convention; the next `start` wipes it.

use crate::artifact::discover_artifacts;
use crate::config::{SessionConfig, StalePolicy};
use crate::coverage::{
    merge, AccumulatedReport, CoverageReport, CoverageSummary, ScopeFilter, SentinelConvention,
};
use crate::generator::{GcovTool, ReportGenerator};
use crate::result::{IoContext, SessionError, SessionResult};
use crate::store::{list_reports, remove_dir_if_exists, unit_key, AccumulationArea};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SessionState {
    /// No session in progress
    #[default]
    Idle,
    /// Accepting runs
    Active,
    /// Restoring native sentinels
    Finalizing,
}

/// Overall outcome of the hosting test session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FinishStatus {
    /// Every test passed
    Success,
    /// At least one test failed or the session was aborted
    Failure,
}

impl FinishStatus {
    /// Map a process exit code (0 = success)
    #[must_use]
    pub const fn from_exit_code(code: i32) -> Self {
        if code == 0 {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

/// What one `record_run` did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Coverage data artifact processed
    pub artifact: PathBuf,
    /// Raw reports produced by the generator
    pub reports: usize,
    /// Reports dropped by the scope filter
    pub out_of_scope: usize,
    /// Units merged into the accumulation area
    pub merged_units: Vec<String>,
}

/// What `finish` did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishSummary {
    /// Status the session finished with
    pub status: FinishStatus,
    /// Whether native sentinels were restored
    pub finalized: bool,
    /// Coverage over the accumulation area (empty when not finalized)
    pub coverage: CoverageSummary,
}

/// A coverage accumulation session
///
/// Generic over the report generator so hosts and tests can substitute the
/// toolchain's `gcov`.
#[derive(Debug)]
pub struct Session<G = GcovTool> {
    config: SessionConfig,
    scope: ScopeFilter,
    area: AccumulationArea,
    generator: G,
    state: SessionState,
    /// Set once a session-aborting error was seen
    aborted: bool,
}

impl Session<GcovTool> {
    /// Create an idle session using the configured generator program
    ///
    /// # Errors
    ///
    /// Returns `Config` if the configuration is invalid
    pub fn new(config: SessionConfig) -> SessionResult<Self> {
        let generator = GcovTool::from_config(&config.generator);
        Self::with_generator(config, generator)
    }
}

impl<G: ReportGenerator> Session<G> {
    /// Create an idle session with a custom report generator
    ///
    /// # Errors
    ///
    /// Returns `Config` if the configuration is invalid
    pub fn with_generator(config: SessionConfig, generator: G) -> SessionResult<Self> {
        config.validate()?;
        let scope = config.scope_filter()?;
        let area = AccumulationArea::new(config.accumulation_dir.clone());
        Ok(Self {
            config,
            scope,
            area,
            generator,
            state: SessionState::Idle,
            aborted: false,
        })
    }

    /// Begin a session, discarding (or archiving) any earlier state
    ///
    /// Valid in every state.
    ///
    /// # Errors
    ///
    /// Returns `Filesystem` if the areas cannot be removed or recreated
    pub fn start(&mut self) -> SessionResult<()> {
        match self.config.stale_policy {
            StalePolicy::Discard => self.area.reset()?,
            StalePolicy::Preserve => {
                if let Some(archived) = self.area.archive_and_reset()? {
                    info!(archived = %archived.display(), "preserved previous accumulation area");
                }
            }
        }
        remove_dir_if_exists(&self.config.scratch_dir)?;
        self.state = SessionState::Active;
        self.aborted = false;
        info!(dir = %self.area.dir().display(), "coverage session started");
        Ok(())
    }

    /// Resume a session started by another process
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if there is no accumulation area to resume
    pub fn attach(&mut self) -> SessionResult<()> {
        if !self.area.exists() {
            return Err(SessionError::invalid_state(format!(
                "no accumulation area at {}; start a session first",
                self.area.dir().display()
            )));
        }
        self.state = SessionState::Active;
        self.aborted = self.area.abort_reason().is_some();
        debug!(dir = %self.area.dir().display(), aborted = self.aborted, "attached to coverage session");
        Ok(())
    }

    /// Record one instrumented execution
    ///
    /// Runs the report generator on `artifact` and merges every in-scope
    /// report it produces into the accumulation area.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` outside an active session; otherwise any
    /// generator, parse, merge or filesystem error. Those abort the session,
    /// since reports merged earlier in the run may already be in the area.
    pub fn record_run(&mut self, artifact: &Path) -> SessionResult<RunSummary> {
        self.ensure_active("record a run")?;
        let result = self.record_run_inner(artifact);
        if let Err(ref e) = result {
            if e.aborts_session() {
                self.abort(&e.to_string());
            }
        }
        result
    }

    /// Mark the session unfinalizable, here and for later attached processes
    fn abort(&mut self, reason: &str) {
        self.aborted = true;
        if let Err(marker) = self.area.mark_aborted(reason) {
            warn!(error = %marker, "failed to record session abort");
        }
    }

    /// Record every artifact matching the configured pattern in `dir`
    ///
    /// # Errors
    ///
    /// Stops at the first failing artifact, as [`Self::record_run`]
    pub fn record_dir(&mut self, dir: &Path) -> SessionResult<Vec<RunSummary>> {
        self.ensure_active("record a run")?;
        let artifacts = discover_artifacts(dir, &self.config.artifact_pattern)?;
        if artifacts.is_empty() {
            debug!(dir = %dir.display(), pattern = %self.config.artifact_pattern, "no coverage artifacts found");
        }
        artifacts
            .iter()
            .map(|artifact| self.record_run(artifact))
            .collect()
    }

    fn record_run_inner(&mut self, artifact: &Path) -> SessionResult<RunSummary> {
        // The generator runs inside the scratch directory
        let artifact = fs::canonicalize(artifact).at(artifact)?;
        let scratch = self.config.scratch_dir.clone();
        remove_dir_if_exists(&scratch)?;
        fs::create_dir_all(&scratch).at(&scratch)?;

        info!(artifact = %artifact.display(), "recording coverage run");
        self.generator.generate(&artifact, &scratch)?;

        let mut summary = RunSummary {
            artifact,
            ..RunSummary::default()
        };
        for path in list_reports(&scratch)? {
            summary.reports += 1;
            match self.ingest(&path)? {
                Some(unit) => summary.merged_units.push(unit),
                None => summary.out_of_scope += 1,
            }
        }
        info!(
            reports = summary.reports,
            merged = summary.merged_units.len(),
            out_of_scope = summary.out_of_scope,
            "coverage run recorded"
        );
        Ok(summary)
    }

    /// Merge one raw report; `None` if it was out of scope
    fn ingest(&self, path: &Path) -> SessionResult<Option<String>> {
        let text = fs::read_to_string(path).at(path)?;

        // Out-of-scope reports are dropped before the body is parsed
        let source = CoverageReport::read_source(&text, path)?;
        let Some(key) = self.scope.canonicalize(&source) else {
            debug!(source = %source, "skipping out-of-scope report");
            return Ok(None);
        };

        let report =
            CoverageReport::parse(&text, path, SentinelConvention::Native)?.with_source(key);
        let unit = unit_key(path)
            .ok_or_else(|| SessionError::malformed(path, 0, "report has no file name"))?;

        let existing = self.area.load(&unit)?;
        let merged = merge(existing, AccumulatedReport::new(unit.clone(), report))?;
        self.area.store(&merged)?;
        Ok(Some(unit))
    }

    /// End the session
    ///
    /// On success every accumulated report is rewritten in the native
    /// convention and the scratch directory is removed. On failure only the
    /// scratch directory is removed; accumulated reports stay unfinalized.
    /// A session that hit a line table mismatch or filesystem error is
    /// never finalized, even when finished with `Success`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` outside an active session or after an
    /// aborting error, otherwise any filesystem or parse error
    pub fn finish(&mut self, status: FinishStatus) -> SessionResult<FinishSummary> {
        self.ensure_active("finish")?;

        if status == FinishStatus::Failure || self.aborted {
            self.state = SessionState::Idle;
            if !self.aborted {
                self.abort("test session finished with failure status");
            }
            remove_dir_if_exists(&self.config.scratch_dir)?;
            info!(?status, "coverage session finished without finalization");
            if status == FinishStatus::Success {
                return Err(SessionError::invalid_state(
                    "session was aborted by an earlier error; coverage left unfinalized",
                ));
            }
            return Ok(FinishSummary {
                status,
                finalized: false,
                coverage: CoverageSummary::default(),
            });
        }

        self.state = SessionState::Finalizing;
        let result = self.finalize();
        self.state = SessionState::Idle;
        if let Err(ref e) = result {
            // Some reports may already be native; the area is unusable
            self.abort(&e.to_string());
            if let Err(e) = remove_dir_if_exists(&self.config.scratch_dir) {
                warn!(error = %e, "failed to remove scratch directory");
            }
        }
        result
    }

    fn finalize(&self) -> SessionResult<FinishSummary> {
        let mut coverage = CoverageSummary::default();
        for unit in self.area.units()? {
            let Some(report) = self.area.load(&unit)? else {
                continue;
            };
            self.area.store_as(&report, SentinelConvention::Native)?;
            coverage.combine(&report.report().summary());
        }
        remove_dir_if_exists(&self.config.scratch_dir)?;
        info!(
            units = coverage.units,
            coverage_percent = coverage.coverage_percent,
            "coverage session finalized"
        );
        Ok(FinishSummary {
            status: FinishStatus::Success,
            finalized: true,
            coverage,
        })
    }

    /// Coverage over whatever is currently accumulated
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the area belongs to an aborted or failed
    /// session, `Filesystem` or `MalformedReport` if a report cannot be read
    pub fn summary(&self) -> SessionResult<CoverageSummary> {
        if let Some(reason) = self.area.abort_reason() {
            return Err(SessionError::invalid_state(format!(
                "coverage in {} is unreliable: {reason}",
                self.area.dir().display()
            )));
        }
        let mut coverage = CoverageSummary::default();
        for report in self.area.load_all()? {
            coverage.combine(&report.report().summary());
        }
        Ok(coverage)
    }

    fn ensure_active(&self, action: &str) -> SessionResult<()> {
        if self.state == SessionState::Active {
            Ok(())
        } else {
            Err(SessionError::invalid_state(format!(
                "cannot {action} while the session is {:?}",
                self.state
            )))
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Accumulation area
    #[must_use]
    pub fn area(&self) -> &AccumulationArea {
        &self.area
    }

    /// Report generator
    #[must_use]
    pub fn generator(&self) -> &G {
        &self.generator
    }
}

impl<G> Drop for Session<G> {
    fn drop(&mut self) {
        // An abandoned session keeps its accumulated reports for inspection
        if self.state != SessionState::Idle {
            if let Err(e) = remove_dir_if_exists(&self.config.scratch_dir) {
                warn!(error = %e, "failed to remove scratch directory of abandoned session");
            }
        }
    }
}
