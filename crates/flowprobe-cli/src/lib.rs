//! Flowprobe CLI library
//!
//! Command-line front end for the Flowprobe journey harness: suite and
//! scenario selection, configuration layering, progress output and the
//! `report.json` written after every run.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, ListArgs, PolicyArg, ProjectArg, RunArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{describe_duration, ProgressReporter};
pub use runner::{
    list, masked, run, run_label, select_scenarios, show_config, suite_config, write_report,
    RunReport, REPORT_FILE,
};
