//! Flowprobe CLI: end-to-end browser journeys with screenshot evidence
//!
//! ## Usage
//!
//! ```bash
//! flowprobe list                               # Suites and scenario ids
//! flowprobe run                                # Every suite, desktop Chrome
//! flowprobe run -s forgot-password -p pixel-5  # One suite on a phone
//! flowprobe run -f apply-contact --retries 2   # Filtered, with retries
//! flowprobe config                             # Effective settings, secrets masked
//! ```

use clap::Parser;
use flowprobe_cli::{Cli, CliConfig, CliError, CliResult, Commands, Verbosity};
use std::process::ExitCode;

fn main() -> ExitCode {
    match dispatch() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn dispatch() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    config.init_logging();

    match cli.command {
        Commands::Run(args) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|e| CliError::config(format!("cannot start async runtime: {e}")))?;
            runtime.block_on(flowprobe_cli::run(args, &config))
        }
        Commands::List(args) => flowprobe_cli::list(&args),
        Commands::Config(args) => flowprobe_cli::show_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_log_json(cli.log_json)
}
