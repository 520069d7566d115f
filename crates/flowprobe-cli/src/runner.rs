//! Scenario selection, configuration layering and the `run`, `list` and
//! `config` commands.

use crate::commands::{ConfigArgs, ListArgs, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use chrono::{DateTime, Utc};
use flowprobe::journeys::{self, SUITES};
use flowprobe::{DeviceProfile, Scenario, Site, SuiteConfig, SuiteResults};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// File name of the run report inside the output directory
pub const REPORT_FILE: &str = "report.json";

const MASK: &str = "********";

/// Scenarios of `suites` (every suite when empty), narrowed by `filter`
pub fn select_scenarios(suites: &[String], filter: Option<&str>) -> CliResult<Vec<Scenario>> {
    let mut selected = if suites.is_empty() {
        journeys::catalogue()
    } else {
        let mut picked = Vec::new();
        for name in suites {
            let scenarios = journeys::suite(name).ok_or_else(|| {
                CliError::invalid_argument(format!(
                    "unknown suite '{name}' (available: {})",
                    SUITES.join(", ")
                ))
            })?;
            picked.extend_from_slice(scenarios);
        }
        picked
    };

    if let Some(filter) = filter {
        selected.retain(|s| s.matches(filter));
    }
    if selected.is_empty() {
        return Err(CliError::invalid_argument("no scenario matches the selection"));
    }
    Ok(selected)
}

/// Defaults, then YAML, then `.env` and environment, then flags
pub fn suite_config(args: &RunArgs) -> CliResult<SuiteConfig> {
    let mut config = SuiteConfig::load(args.config.as_deref())?;
    if !args.project.is_empty() {
        let mut projects: Vec<DeviceProfile> = Vec::new();
        for project in args.project.iter().copied().map(DeviceProfile::from) {
            if !projects.contains(&project) {
                projects.push(project);
            }
        }
        config.browser.projects = projects;
    }
    if let Some(retries) = args.retries {
        config.retries = retries;
    }
    if args.headed {
        config.browser.headless = false;
    }
    if let Some(policy) = args.policy {
        config.browser.policy = policy.into();
    }
    if let Some(output) = &args.output {
        config.output_dir.clone_from(output);
    }
    if let Some(evidence) = &args.evidence_dir {
        config.evidence_dir.clone_from(evidence);
    }
    config.validate()?;
    Ok(config)
}

/// `<timestamp>-<short uuid>`, sortable and unique per run
#[must_use]
pub fn run_label(id: Uuid, at: DateTime<Utc>) -> String {
    let short: String = id.simple().to_string().chars().take(8).collect();
    format!("{}-{short}", at.format("%Y%m%d-%H%M%S"))
}

/// `report.json` contents
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Unique run id
    pub run_id: Uuid,
    /// Directory holding this run's screenshots
    pub evidence_root: PathBuf,
    /// Suites requested (empty for all)
    pub suites: Vec<String>,
    /// Scenario filter
    pub filter: Option<String>,
    /// Projects run
    pub projects: Vec<DeviceProfile>,
    /// Outcomes
    #[serde(flatten)]
    pub results: SuiteResults,
}

/// Write `report` to `<dir>/report.json`
pub fn write_report(report: &RunReport, dir: &Path) -> CliResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| CliError::report_generation(e.to_string()))?;
    let path = dir.join(REPORT_FILE);
    fs::write(&path, json)?;
    Ok(path)
}

/// `flowprobe run`
pub async fn run(args: RunArgs, cli: &CliConfig) -> CliResult<()> {
    let scenarios = select_scenarios(&args.suite, args.filter.as_deref())?;
    let mut config = suite_config(&args)?;

    let run_id = Uuid::new_v4();
    let label = run_label(run_id, Utc::now());
    config.evidence_dir = config.evidence_dir.join(&label);
    info!(%run_id, scenarios = scenarios.len(), evidence = %config.evidence_dir.display(), "run starting");

    let mut reporter = ProgressReporter::new(cli.color.should_color(), cli.verbosity.is_quiet());
    reporter.header(&format!("flowprobe run {label}"));
    reporter.info(&format!("evidence: {}", config.evidence_dir.display()));
    if !config.loan.credentials.is_configured() && scenarios.iter().any(|s| s.site == Site::Loan) {
        reporter.warning("LOGIN_USERNAME / LOGIN_PASSWORD look unset; login journeys will fail");
    }
    let total = scenarios.len() * config.browser.projects.len();
    reporter.start_progress(total as u64);
    let reporter = Arc::new(reporter);

    let results = execute(&config, &scenarios, args.fail_fast, Arc::clone(&reporter)).await?;
    reporter.finish();
    reporter.summary(&results);

    let report = RunReport {
        run_id,
        evidence_root: config.evidence_dir.clone(),
        suites: args.suite,
        filter: args.filter,
        projects: config.browser.projects.clone(),
        results,
    };
    let path = write_report(&report, &config.output_dir)?;
    reporter.info(&format!("report: {}", path.display()));

    let failed = report.results.failed_count();
    if failed > 0 {
        return Err(CliError::ScenariosFailed {
            failed,
            total: report.results.total(),
        });
    }
    Ok(())
}

#[cfg(feature = "browser")]
async fn execute(
    config: &SuiteConfig,
    scenarios: &[Scenario],
    fail_fast: bool,
    reporter: Arc<ProgressReporter>,
) -> CliResult<SuiteResults> {
    use flowprobe::{ChromiumSessionFactory, Harness, SessionFactory};

    let factory = Arc::new(ChromiumSessionFactory::launch(&config.browser, config.loan.clone()).await?);
    let harness = Harness::new(config.clone(), Arc::clone(&factory) as Arc<dyn SessionFactory>)
        .with_fail_fast(fail_fast)
        .with_observer(move |event| reporter.on_event(event));
    let results = harness.run(scenarios).await;
    drop(harness);

    match Arc::try_unwrap(factory) {
        Ok(factory) => {
            if let Err(e) = factory.shutdown().await {
                tracing::warn!(error = %e, "browser did not shut down cleanly");
            }
        }
        Err(_) => tracing::warn!("browser still in use, leaving it to exit with the process"),
    }
    Ok(results)
}

#[cfg(not(feature = "browser"))]
async fn execute(
    _config: &SuiteConfig,
    _scenarios: &[Scenario],
    _fail_fast: bool,
    _reporter: Arc<ProgressReporter>,
) -> CliResult<SuiteResults> {
    Err(CliError::config(
        "flowprobe-cli was built without the `browser` feature",
    ))
}

#[derive(Debug, Serialize)]
struct ListedScenario {
    suite: &'static str,
    id: &'static str,
    title: &'static str,
    group: &'static str,
    site: Site,
}

fn listed(args: &ListArgs) -> CliResult<Vec<ListedScenario>> {
    let names: Vec<&'static str> = match &args.suite {
        Some(name) => {
            let known = SUITES.iter().find(|s| **s == name.as_str()).ok_or_else(|| {
                CliError::invalid_argument(format!(
                    "unknown suite '{name}' (available: {})",
                    SUITES.join(", ")
                ))
            })?;
            vec![*known]
        }
        None => SUITES.to_vec(),
    };

    let mut rows = Vec::new();
    for suite in names {
        for scenario in journeys::suite(suite).unwrap_or_default() {
            if args.filter.as_deref().map_or(true, |f| scenario.matches(f)) {
                rows.push(ListedScenario {
                    suite,
                    id: scenario.id,
                    title: scenario.title,
                    group: scenario.group,
                    site: scenario.site,
                });
            }
        }
    }
    Ok(rows)
}

/// `flowprobe list`
pub fn list(args: &ListArgs) -> CliResult<()> {
    let rows = listed(args)?;
    if args.json {
        let json = serde_json::to_string_pretty(&rows)
            .map_err(|e| CliError::report_generation(e.to_string()))?;
        println!("{json}");
        return Ok(());
    }

    let mut current = "";
    for row in &rows {
        if row.suite != current {
            current = row.suite;
            println!("{current}");
        }
        println!("  {:<34} {:<6} {}", row.id, row.site.to_string(), row.title);
    }
    println!("{} scenarios", rows.len());
    Ok(())
}

/// Copy of `config` with every password replaced by a mask
#[must_use]
pub fn masked(config: &SuiteConfig) -> SuiteConfig {
    let mut shown = config.clone();
    shown.loan.credentials.password = MASK.to_string();
    if let Some(auth) = shown.loan.basic_auth.as_mut() {
        auth.password = MASK.to_string();
    }
    shown
}

/// `flowprobe config`
pub fn show_config(args: &ConfigArgs) -> CliResult<()> {
    let config = SuiteConfig::load(args.config.as_deref())?;
    let shown = if args.show_secrets {
        config
    } else {
        masked(&config)
    };
    print!("{}", shown.to_yaml()?);
    Ok(())
}
