//! Sequential scenario runner.
//!
//! One worker: scenarios run one after another, each attempt on a fresh page
//! from a [`SessionFactory`]. A failed attempt leaves a `failure.png` and the
//! whole scenario is retried up to the configured count. Skips are never
//! retried.

use crate::config::{DeviceProfile, SuiteConfig};
use crate::driver::PageDriver;
use crate::evidence::EvidenceStore;
use crate::result::{FlowError, FlowResult};
use crate::scenario::{Observation, Outcome, Scenario, ScenarioContext, ScenarioReport, Site};
use crate::session::Session;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Step id of the screenshot taken when an attempt fails
pub const FAILURE_STEP: &str = "failure";

/// Opens a fresh, isolated page for one attempt
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// New page emulating `project`, prepared for `site`
    async fn open(&self, project: DeviceProfile, site: Site) -> FlowResult<Arc<dyn PageDriver>>;
}

/// Progress notifications
#[derive(Debug, Clone)]
pub enum HarnessEvent {
    /// An attempt is starting
    Started {
        /// Scenario id
        id: String,
        /// Project
        project: DeviceProfile,
        /// 1-based attempt
        attempt: u32,
    },
    /// An attempt failed and will be retried
    Retrying {
        /// Scenario id
        id: String,
        /// Failed attempt
        attempt: u32,
        /// Why it failed
        error: String,
    },
    /// Final result of a scenario
    Finished(ScenarioReport),
}

type Observer = Arc<dyn Fn(&HarnessEvent) + Send + Sync>;

/// Results of a whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteResults {
    /// Start of the run
    pub started_at: DateTime<Utc>,
    /// Per scenario and project
    pub reports: Vec<ScenarioReport>,
    /// Total wall time
    pub duration_ms: u64,
    /// Whether fail-fast stopped the run early
    pub aborted: bool,
}

impl SuiteResults {
    /// No failures (skips allowed)
    #[must_use]
    pub fn all_passed(&self) -> bool {
        !self.reports.iter().any(|r| r.outcome.is_failed())
    }

    /// Count passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_passed()).count()
    }

    /// Count failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_failed()).count()
    }

    /// Count skipped scenarios
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_skipped()).count()
    }

    /// Scenarios run
    #[must_use]
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    /// Failed reports
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioReport> {
        self.reports.iter().filter(|r| r.outcome.is_failed()).collect()
    }

    /// Pretty JSON
    pub fn to_json(&self) -> FlowResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Scenario runner
pub struct Harness {
    config: Arc<SuiteConfig>,
    factory: Arc<dyn SessionFactory>,
    fail_fast: bool,
    observer: Option<Observer>,
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("retries", &self.config.retries)
            .field("projects", &self.config.browser.projects)
            .field("fail_fast", &self.fail_fast)
            .finish_non_exhaustive()
    }
}

impl Harness {
    /// Harness over `factory` using `config`
    #[must_use]
    pub fn new(config: SuiteConfig, factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            config: Arc::new(config),
            factory,
            fail_fast: false,
            observer: None,
        }
    }

    /// Stop after the first failed scenario
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Receive progress events
    #[must_use]
    pub fn with_observer(mut self, observer: impl Fn(&HarnessEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    fn emit(&self, event: HarnessEvent) {
        if let Some(observer) = &self.observer {
            observer(&event);
        }
    }

    /// Evidence root for `project`; projects get their own subtree when
    /// more than one runs
    #[must_use]
    pub fn evidence_root(&self, project: DeviceProfile) -> PathBuf {
        if self.config.browser.projects.len() > 1 {
            self.config.evidence_dir.join(project.name())
        } else {
            self.config.evidence_dir.clone()
        }
    }

    /// Run every scenario on every configured project
    pub async fn run(&self, scenarios: &[Scenario]) -> SuiteResults {
        let started_at = Utc::now();
        let started = Instant::now();
        let mut reports = Vec::new();
        let mut aborted = false;

        'projects: for &project in &self.config.browser.projects {
            let evidence = Arc::new(EvidenceStore::new(self.evidence_root(project)));
            for scenario in scenarios {
                let report = self.run_scenario(scenario, project, &evidence).await;
                let failed = report.outcome.is_failed();
                self.emit(HarnessEvent::Finished(report.clone()));
                reports.push(report);
                if failed && self.fail_fast {
                    warn!(scenario = scenario.id, "fail-fast: stopping run");
                    aborted = true;
                    break 'projects;
                }
            }
        }

        let results = SuiteResults {
            started_at,
            reports,
            duration_ms: started.elapsed().as_millis() as u64,
            aborted,
        };
        info!(
            total = results.total(),
            passed = results.passed_count(),
            failed = results.failed_count(),
            skipped = results.skipped_count(),
            duration_ms = results.duration_ms,
            "run finished"
        );
        results
    }

    /// Run one scenario with retries
    pub async fn run_scenario(
        &self,
        scenario: &Scenario,
        project: DeviceProfile,
        evidence: &Arc<EvidenceStore>,
    ) -> ScenarioReport {
        let started = Instant::now();
        let max_attempts = self.config.retries + 1;
        let mut attempt = 0;

        let (outcome, observations) = loop {
            attempt += 1;
            self.emit(HarnessEvent::Started {
                id: scenario.id.to_string(),
                project,
                attempt,
            });
            info!(scenario = scenario.id, %project, attempt, "scenario started");

            let (result, failure_shot, seen) = self.attempt(scenario, project, evidence, attempt).await;
            match result {
                Ok(()) => {
                    info!(scenario = scenario.id, %project, attempt, "scenario passed");
                    break (Outcome::Passed, seen);
                }
                Err(e) if e.is_skip() => {
                    info!(scenario = scenario.id, %project, reason = %e, "scenario skipped");
                    let reason = match e {
                        FlowError::Skipped { reason } => reason,
                        other => other.to_string(),
                    };
                    break (Outcome::Skipped { reason }, seen);
                }
                Err(e) if attempt < max_attempts => {
                    warn!(scenario = scenario.id, %project, attempt, error = %e, "attempt failed, retrying");
                    self.emit(HarnessEvent::Retrying {
                        id: scenario.id.to_string(),
                        attempt,
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(scenario = scenario.id, %project, attempt, error = %e, "scenario failed");
                    let failed = Outcome::Failed {
                        error: e.to_string(),
                        evidence: failure_shot,
                    };
                    break (failed, seen);
                }
            }
        };

        ScenarioReport {
            id: scenario.id.to_string(),
            title: scenario.title.to_string(),
            group: scenario.group.to_string(),
            project,
            outcome,
            attempts: attempt,
            duration_ms: started.elapsed().as_millis() as u64,
            evidence: evidence.records_for(scenario.id),
            observations,
        }
    }

    async fn attempt(
        &self,
        scenario: &Scenario,
        project: DeviceProfile,
        evidence: &Arc<EvidenceStore>,
        attempt: u32,
    ) -> (FlowResult<()>, Option<PathBuf>, Vec<Observation>) {
        let driver = match self.factory.open(project, scenario.site).await {
            Ok(driver) => driver,
            Err(e) => return (Err(e), None, Vec::new()),
        };
        let session = Session::configured(Arc::clone(&driver), &self.config);
        let ctx = ScenarioContext::new(session, Arc::clone(&self.config), Arc::clone(evidence), scenario.id)
            .with_project(project)
            .with_attempt(attempt);

        let result = scenario.run(&ctx).await;

        let mut failure_shot = None;
        if matches!(&result, Err(e) if !e.is_skip()) {
            match evidence
                .capture(driver.as_ref(), scenario.id, FAILURE_STEP, attempt)
                .await
            {
                Ok(record) => failure_shot = Some(record.path),
                Err(e) => warn!(scenario = scenario.id, error = %e, "no failure screenshot"),
            }
        }
        if let Err(e) = driver.close().await {
            warn!(scenario = scenario.id, error = %e, "closing page failed");
        }
        (result, failure_shot, ctx.observations())
    }
}

/// Factory handing out pages built by a closure; used with [`crate::FakeDriver`]
pub struct FnSessionFactory<F> {
    build: F,
}

impl<F> fmt::Debug for FnSessionFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSessionFactory").finish_non_exhaustive()
    }
}

impl<F> FnSessionFactory<F>
where
    F: Fn(DeviceProfile, Site) -> FlowResult<Arc<dyn PageDriver>> + Send + Sync,
{
    /// Wrap `build`
    #[must_use]
    pub const fn new(build: F) -> Self {
        Self { build }
    }
}

#[async_trait]
impl<F> SessionFactory for FnSessionFactory<F>
where
    F: Fn(DeviceProfile, Site) -> FlowResult<Arc<dyn PageDriver>> + Send + Sync,
{
    async fn open(&self, project: DeviceProfile, site: Site) -> FlowResult<Arc<dyn PageDriver>> {
        (self.build)(project, site)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::driver::FakeDriver;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicU32, Ordering};

    static FLAKY_RUNS: AtomicU32 = AtomicU32::new(0);

    fn passes(_ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn fails(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
        Box::pin(async move {
            ctx.capture("01-start").await?;
            Err(FlowError::assertion("a success banner", "nothing"))
        })
    }

    fn skips(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
        Box::pin(async move { ctx.require(false, "account not configured") })
    }

    fn flaky(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
        Box::pin(async move {
            ctx.observe("attempt", ctx.attempt());
            if FLAKY_RUNS.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(FlowError::driver("socket closed"))
            } else {
                Ok(())
            }
        })
    }

    fn harness(dir: &std::path::Path, retries: u32) -> Harness {
        let config = SuiteConfig {
            retries,
            evidence_dir: dir.to_path_buf(),
            ..SuiteConfig::default()
        };
        let factory = FnSessionFactory::new(|_, _| Ok(Arc::new(FakeDriver::new()) as Arc<dyn PageDriver>));
        Harness::new(config, Arc::new(factory))
    }

    #[tokio::test]
    async fn test_outcomes_are_classified() {
        let dir = tempfile::tempdir().unwrap();
        let scenarios = [
            Scenario::new("P", "passes", "g", Site::Loan, passes),
            Scenario::new("F", "fails", "g", Site::Loan, fails),
            Scenario::new("S", "skips", "g", Site::Store, skips),
        ];
        let results = harness(dir.path(), 0).run(&scenarios).await;
        assert_eq!(results.total(), 3);
        assert_eq!(results.passed_count(), 1);
        assert_eq!(results.failed_count(), 1);
        assert_eq!(results.skipped_count(), 1);
        assert!(!results.all_passed());
        assert_eq!(
            results.reports[2].outcome,
            Outcome::Skipped {
                reason: "account not configured".into()
            }
        );
    }

    #[tokio::test]
    async fn test_failure_retries_whole_scenario_with_evidence() {
        let dir = tempfile::tempdir().unwrap();
        let scenarios = [Scenario::new("F", "fails", "g", Site::Loan, fails)];
        let results = harness(dir.path(), 2).run(&scenarios).await;
        let report = &results.reports[0];
        assert_eq!(report.attempts, 3);
        match &report.outcome {
            Outcome::Failed { evidence, .. } => {
                assert!(evidence.as_ref().unwrap().ends_with("F/failure.retry2.png"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(dir.path().join("F/01-start.png").exists());
        assert!(dir.path().join("F/01-start.retry1.png").exists());
        assert!(dir.path().join("F/failure.png").exists());
        assert_eq!(report.evidence.len(), 6);
    }

    #[tokio::test]
    async fn test_skip_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let scenarios = [Scenario::new("S", "skips", "g", Site::Store, skips)];
        let results = harness(dir.path(), 2).run(&scenarios).await;
        assert_eq!(results.reports[0].attempts, 1);
        assert!(results.all_passed());
    }

    #[tokio::test]
    async fn test_flaky_scenario_passes_on_retry() {
        let dir = tempfile::tempdir().unwrap();
        let events = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let scenarios = [Scenario::new("R", "flaky", "g", Site::Loan, flaky)];
        let results = harness(dir.path(), 1)
            .with_observer(move |e| {
                let tag = match e {
                    HarnessEvent::Started { .. } => "started",
                    HarnessEvent::Retrying { .. } => "retrying",
                    HarnessEvent::Finished(_) => "finished",
                };
                sink.lock().unwrap().push(tag);
            })
            .run(&scenarios)
            .await;
        let report = &results.reports[0];
        assert!(report.outcome.is_passed());
        assert_eq!(report.attempts, 2);
        assert_eq!(report.observations[0].value, "2");
        assert_eq!(
            *events.lock().unwrap(),
            vec!["started", "retrying", "started", "finished"]
        );
    }

    #[tokio::test]
    async fn test_fail_fast_stops_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let scenarios = [
            Scenario::new("F", "fails", "g", Site::Loan, fails),
            Scenario::new("P", "passes", "g", Site::Loan, passes),
        ];
        let results = harness(dir.path(), 0).with_fail_fast(true).run(&scenarios).await;
        assert_eq!(results.total(), 1);
        assert!(results.aborted);
    }

    #[tokio::test]
    async fn test_projects_get_separate_evidence_roots() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = harness(dir.path(), 0);
        Arc::get_mut(&mut h.config).unwrap().browser.projects = DeviceProfile::ALL.to_vec();
        let scenarios = [Scenario::new("F", "fails", "g", Site::Loan, fails)];
        let results = h.run(&scenarios).await;
        assert_eq!(results.total(), 2);
        assert!(dir.path().join("desktop-chrome/F/failure.png").exists());
        assert!(dir.path().join("pixel-5/F/failure.png").exists());
    }

    #[tokio::test]
    async fn test_factory_error_fails_the_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let config = SuiteConfig {
            retries: 0,
            evidence_dir: dir.path().to_path_buf(),
            ..SuiteConfig::default()
        };
        let factory = FnSessionFactory::new(|_, _| Err(FlowError::BrowserLaunch { message: "no chromium".into() }));
        let results = Harness::new(config, Arc::new(factory))
            .run(&[Scenario::new("P", "passes", "g", Site::Loan, passes)])
            .await;
        match &results.reports[0].outcome {
            Outcome::Failed { error, evidence } => {
                assert!(error.contains("no chromium"));
                assert!(evidence.is_none());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
