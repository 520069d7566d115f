//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use flowprobe::{DeviceProfile, ResolutionPolicy};
use std::path::PathBuf;

/// Flowprobe: run end-to-end browser journeys against the loan site and storefront
#[derive(Parser, Debug)]
#[command(name = "flowprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (failures and the summary only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run journeys in a browser and collect evidence
    Run(RunArgs),

    /// List suites and scenarios
    List(ListArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Suites to run (repeatable; all suites when omitted)
    #[arg(short, long)]
    pub suite: Vec<String>,

    /// Only scenarios whose id, title or group contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Device projects (repeatable; overrides the config file)
    #[arg(short, long)]
    pub project: Vec<ProjectArg>,

    /// Whole-scenario retries after a failure
    #[arg(long)]
    pub retries: Option<u32>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Locator strategy policy
    #[arg(long)]
    pub policy: Option<PolicyArg>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for report.json
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Root of the screenshot tree
    #[arg(long)]
    pub evidence_dir: Option<PathBuf>,

    /// Stop after the first failed scenario
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for the list command
#[derive(Parser, Debug, Default)]
pub struct ListArgs {
    /// Only this suite
    #[arg(short, long)]
    pub suite: Option<String>,

    /// Only scenarios whose id, title or group contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug, Default)]
pub struct ConfigArgs {
    /// YAML configuration file to layer under the environment
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print credentials instead of masking them
    #[arg(long)]
    pub show_secrets: bool,
}

/// Device project argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectArg {
    /// Desktop Chrome, 1280x720
    DesktopChrome,
    /// Pixel 5 emulation
    #[value(name = "pixel-5", alias = "pixel5")]
    Pixel5,
}

impl From<ProjectArg> for DeviceProfile {
    fn from(arg: ProjectArg) -> Self {
        match arg {
            ProjectArg::DesktopChrome => Self::DesktopChrome,
            ProjectArg::Pixel5 => Self::Pixel5,
        }
    }
}

/// Locator policy argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyArg {
    /// First strategy with any match wins
    FirstStrategy,
    /// First element in document order matching any strategy
    DocumentOrder,
}

impl From<PolicyArg> for ResolutionPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::FirstStrategy => Self::FirstStrategy,
            PolicyArg::DocumentOrder => Self::DocumentOrder,
        }
    }
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
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
