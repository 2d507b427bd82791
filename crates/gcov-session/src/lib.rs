//! gcov-session: cross-run line coverage accumulation
//!
//! A natively instrumented library that is rebuilt and re-run by many
//! independent test invocations produces one set of gcov reports per run.
//! This crate sums them per source unit over a whole test session so that
//! coverage is reported for the session, not for the last run.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   GCOV-SESSION Architecture                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ .gcda      │    │ gcov       │    │ Scope /    │            │
//! │   │ artifact   │───►│ (scratch)  │───►│ Normalize /│            │
//! │   │            │    │            │    │ Merge      │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                                             ▼                    │
//! │                                    accumulation area             │
//! │                                    (finalized on success)        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use gcov_session::{FinishStatus, Session, SessionConfig};
//! use std::path::Path;
//!
//! # fn main() -> gcov_session::SessionResult<()> {
//! let config = SessionConfig::from_yaml_file(Path::new("gcov-session.yaml"))?;
//! let mut session = Session::new(config)?;
//! session.start()?;
//! session.record_dir(Path::new("src"))?;
//! session.finish(FinishStatus::Success)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

/// Coverage data artifact discovery
pub mod artifact;
/// Session configuration
pub mod config;
/// gcov line coverage model: reader, scope filter, sentinels, merge, LCOV
pub mod coverage;
/// External report generator seam
pub mod generator;
mod result;
/// Session coordinator
pub mod session;
/// Accumulation area on disk
pub mod store;

pub use artifact::discover_artifacts;
pub use config::{GeneratorConfig, SessionConfig, SessionConfigBuilder, StalePolicy};
pub use coverage::{
    merge, AccumulatedReport, CoverageReport, CoverageSummary, LcovFormatter, LineRecord,
    LineStatus, ScopeFilter, SentinelConvention,
};
pub use generator::{GcovTool, ReportGenerator};
pub use result::{SessionError, SessionResult};
pub use session::{FinishStatus, FinishSummary, RunSummary, Session, SessionState};
pub use store::AccumulationArea;
