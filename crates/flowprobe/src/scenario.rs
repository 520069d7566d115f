//! Scenario definitions and the per-attempt context.
//!
//! A scenario is a linear, assertion-bearing script. It receives a
//! [`ScenarioContext`] holding one session, the suite configuration and the
//! evidence store, and returns `Ok(())` or the first error. The only branch
//! a scenario takes on its own is [`ScenarioContext::require`], which turns a
//! missing environment precondition into a skip.

use crate::config::{DeviceProfile, SuiteConfig};
use crate::evidence::{EvidenceRecord, EvidenceStore};
use crate::result::{FlowError, FlowResult};
use crate::session::Session;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

/// Body of a scenario
pub type ScenarioFn = for<'a> fn(&'a ScenarioContext) -> BoxFuture<'a, FlowResult<()>>;

/// Application a scenario targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Site {
    /// Loan application site (basic auth, login)
    Loan,
    /// Shopify storefront
    Store,
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loan => write!(f, "loan"),
            Self::Store => write!(f, "store"),
        }
    }
}

/// A named journey
#[derive(Clone, Copy)]
pub struct Scenario {
    /// Stable id, also the evidence directory
    pub id: &'static str,
    /// Human title
    pub title: &'static str,
    /// Group within its suite, e.g. "Apply Now: contact step"
    pub group: &'static str,
    /// Target application
    pub site: Site,
    run: ScenarioFn,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("group", &self.group)
            .field("site", &self.site)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    /// Define a scenario
    #[must_use]
    pub const fn new(
        id: &'static str,
        title: &'static str,
        group: &'static str,
        site: Site,
        run: ScenarioFn,
    ) -> Self {
        Self {
            id,
            title,
            group,
            site,
            run,
        }
    }

    /// Case-insensitive substring match on id, title or group
    #[must_use]
    pub fn matches(&self, filter: &str) -> bool {
        let filter = filter.to_lowercase();
        [self.id, self.title, self.group]
            .iter()
            .any(|s| s.to_lowercase().contains(&filter))
    }

    /// Run the body against `ctx`
    pub async fn run(&self, ctx: &ScenarioContext) -> FlowResult<()> {
        (self.run)(ctx).await
    }
}

/// Informational finding that never fails a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// What was looked at
    pub label: String,
    /// What was seen
    pub value: String,
    /// When
    pub at: DateTime<Utc>,
}

/// Everything one scenario attempt needs
#[derive(Debug)]
pub struct ScenarioContext {
    session: Session,
    config: Arc<SuiteConfig>,
    evidence: Arc<EvidenceStore>,
    scenario_id: String,
    project: DeviceProfile,
    attempt: u32,
    observations: Mutex<Vec<Observation>>,
}

impl ScenarioContext {
    /// Context for attempt `attempt` (1-based) of `scenario_id`
    #[must_use]
    pub fn new(
        session: Session,
        config: Arc<SuiteConfig>,
        evidence: Arc<EvidenceStore>,
        scenario_id: impl Into<String>,
    ) -> Self {
        Self {
            session,
            config,
            evidence,
            scenario_id: scenario_id.into(),
            project: DeviceProfile::default(),
            attempt: 1,
            observations: Mutex::new(Vec::new()),
        }
    }

    /// Set the device project
    #[must_use]
    pub const fn with_project(mut self, project: DeviceProfile) -> Self {
        self.project = project;
        self
    }

    /// Set the attempt number
    #[must_use]
    pub const fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    /// The page under test
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Suite configuration
    #[must_use]
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Scenario id
    #[must_use]
    pub fn scenario_id(&self) -> &str {
        &self.scenario_id
    }

    /// Device project
    #[must_use]
    pub const fn project(&self) -> DeviceProfile {
        self.project
    }

    /// 1-based attempt number
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Full-page screenshot stored as `<scenario>/<step>.png`
    pub async fn capture(&self, step: &str) -> FlowResult<EvidenceRecord> {
        self.evidence
            .capture(self.session.driver(), &self.scenario_id, step, self.attempt)
            .await
    }

    /// Where a capture for `step` of this attempt lands
    #[must_use]
    pub fn evidence_path(&self, step: &str) -> PathBuf {
        self.evidence.path_for(&self.scenario_id, step, self.attempt)
    }

    /// Record an informational finding
    pub fn observe(&self, label: impl Into<String>, value: impl fmt::Display) {
        let observation = Observation {
            label: label.into(),
            value: value.to_string(),
            at: Utc::now(),
        };
        info!(
            scenario = %self.scenario_id,
            label = %observation.label,
            value = %observation.value,
            "observation"
        );
        self.observations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observation);
    }

    /// Findings recorded so far
    #[must_use]
    pub fn observations(&self) -> Vec<Observation> {
        self.observations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Skip the scenario unless `condition` holds
    pub fn require(&self, condition: bool, reason: impl Into<String>) -> FlowResult<()> {
        if condition {
            Ok(())
        } else {
            Err(FlowError::skipped(reason))
        }
    }
}

/// Final state of one scenario on one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Outcome {
    /// Every step and assertion held
    Passed,
    /// The last attempt failed
    Failed {
        /// Error of the last attempt
        error: String,
        /// Failure screenshot of the last attempt, if one could be taken
        evidence: Option<PathBuf>,
    },
    /// A precondition was missing
    Skipped {
        /// Why
        reason: String,
    },
}

impl Outcome {
    /// Short label for progress output
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
        }
    }

    /// Whether this is a pass
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Whether this is a failure
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Whether this is a skip
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Result of one scenario on one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario id
    pub id: String,
    /// Scenario title
    pub title: String,
    /// Group
    pub group: String,
    /// Device project
    pub project: DeviceProfile,
    /// Final outcome
    pub outcome: Outcome,
    /// Attempts made
    pub attempts: u32,
    /// Wall time across all attempts
    pub duration_ms: u64,
    /// Screenshots taken, every attempt included
    pub evidence: Vec<EvidenceRecord>,
    /// Informational findings of the last attempt
    pub observations: Vec<Observation>,
}
