//! CLI command definitions using clap

use crate::config::DEFAULT_CONFIG_FILE;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// gcov-session: accumulate gcov line coverage across test runs
///
/// Call `start` from the test engine's session-start hook, `record` after
/// each instrumented run and `finish` from the session-finish hook.
#[derive(Parser, Debug)]
#[command(name = "gcov-session")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Session configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "GCOV_SESSION_CONFIG",
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Begin a session, discarding coverage from any earlier one
    Start,

    /// Merge the coverage of one or more instrumented runs
    Record(RecordArgs),

    /// End the session; finalize coverage when it succeeded
    Finish(FinishArgs),

    /// Print coverage totals for the accumulation area
    Summary(SummaryArgs),

    /// Export the accumulation area as LCOV
    Lcov(LcovArgs),
}

/// Arguments for the record command
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Coverage data artifacts (`.gcda`), one run each
    pub artifacts: Vec<PathBuf>,

    /// Record every artifact in this directory matching the configured pattern
    #[arg(short, long)]
    pub dir: Option<PathBuf>,
}

/// Arguments for the finish command
#[derive(Args, Debug)]
pub struct FinishArgs {
    /// The test session failed; leave coverage unfinalized
    #[arg(long, conflicts_with = "exit_code")]
    pub failure: bool,

    /// Exit code of the test session (0 = success)
    #[arg(long, allow_negative_numbers = true)]
    pub exit_code: Option<i32>,
}

/// Arguments for the summary command
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Read an area left by an aborted or failed session anyway
    #[arg(long)]
    pub allow_unfinalized: bool,
}

/// Arguments for the lcov command
#[derive(Args, Debug)]
pub struct LcovArgs {
    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Test name written to the `TN:` record
    #[arg(long)]
    pub test_name: Option<String>,

    /// Export an area left by an aborted or failed session anyway
    #[arg(long)]
    pub allow_unfinalized: bool,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
