//! gcov-session CLI library
//!
//! Command-line hooks that let any test engine drive a cross-run coverage
//! session: `start` from its session-start hook, `record` after each
//! instrumented run, `finish` from its session-finish hook.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, FinishArgs, LcovArgs, RecordArgs, SummaryArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity, DEFAULT_CONFIG_FILE};
pub use error::{CliError, CliResult};
pub use output::{format_summary, Printer};
