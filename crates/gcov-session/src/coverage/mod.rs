//! gcov Line Coverage Model
//!
//! Parsing, scoping, sentinel translation and merging of per-unit gcov
//! reports.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  RAW REPORT → Scope Filter → Sentinel Normalizer → Merge Engine  │
//! │   (*.gcov)      (rename)       (native→internal)     (sum)       │
//! │                                                        ↓         │
//! │                                            Accumulated report    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod formatters;
mod line;
mod merge;
mod report;
mod scope;
mod sentinel;

pub use formatters::LcovFormatter;
pub use line::{LineRecord, LineStatus};
pub use merge::merge;
pub use report::{AccumulatedReport, CoverageReport, CoverageSummary};
pub use scope::{normalize_lexically, ScopeFilter};
pub use sentinel::{SentinelConvention, NON_EXECUTABLE, UNEXECUTED, UNEXECUTED_EXCEPTIONAL};
