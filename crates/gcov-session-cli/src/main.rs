//! gcov-session: accumulate gcov line coverage across test runs
//!
//! ## Usage
//!
//! ```bash
//! gcov-session start                          # session-start hook
//! gcov-session record --dir build             # after each instrumented run
//! gcov-session finish --exit-code "$status"   # session-finish hook
//! gcov-session summary --json
//! gcov-session lcov -o coverage.info
//! ```

use clap::Parser;
use gcov_session_cli::{
    handlers::{report, session},
    logging, Cli, CliConfig, CliResult, Commands, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    // Build configuration from CLI args
    let config = build_config(&cli);
    logging::init(&config)?;

    match cli.command {
        Commands::Start => session::execute_start(&config),
        Commands::Record(args) => session::execute_record(&config, &args),
        Commands::Finish(args) => session::execute_finish(&config, &args),
        Commands::Summary(args) => report::execute_summary(&config, &args),
        Commands::Lcov(args) => report::execute_lcov(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.clone().into())
        .with_config_path(&cli.config)
}
