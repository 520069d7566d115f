//! Lazy element resolution.
//!
//! The resolver turns a [`FieldRef`] into one live node at the moment of
//! interaction. It polls driver snapshots until the field resolves (and, if
//! required, the chosen element is visible) or the wait bound expires.

use crate::dom::{DomSnapshot, NodeId};
use crate::driver::PageDriver;
use crate::locator::FieldRef;
use crate::result::{FlowError, FlowResult};
use crate::wait::DEFAULT_POLL_INTERVAL_MS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// How competing strategies are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionPolicy {
    /// First strategy with any match wins; first element of its matches.
    ///
    /// Unlike a comma-joined CSS selector list, an earlier strategy beats an
    /// element that appears earlier in the document. [`Self::DocumentOrder`]
    /// gives selector-list semantics.
    #[default]
    FirstStrategy,
    /// First element in document order matching any strategy, as
    /// `a, b, c` with `.first()` would pick
    DocumentOrder,
}

impl fmt::Display for ResolutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstStrategy => write!(f, "first-strategy"),
            Self::DocumentOrder => write!(f, "document-order"),
        }
    }
}

/// What a resolution must guarantee before it returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// Present in the document
    Attached,
    /// Present and rendered visibly
    Visible,
}

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Chosen node
    pub node: NodeId,
    /// Index of the strategy that selected it
    pub strategy_index: usize,
    /// Rendered winning strategy
    pub strategy: String,
    /// Size of the candidate set the node was taken from
    pub matched: usize,
    /// Whether the node was visible
    pub visible: bool,
    /// Time spent waiting
    pub elapsed: Duration,
}

/// Field resolver bound to a policy and polling cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolver {
    policy: ResolutionPolicy,
    poll_interval: Duration,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            policy: ResolutionPolicy::default(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl Resolver {
    /// Resolver with the default policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the policy
    #[must_use]
    pub const fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Active policy
    #[must_use]
    pub const fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Choose a node in a snapshot without waiting
    #[must_use]
    pub fn pick(&self, field: &FieldRef, dom: &DomSnapshot) -> Option<Resolution> {
        let (node, strategy_index, matched) = match self.policy {
            ResolutionPolicy::FirstStrategy => {
                field.strategies().iter().enumerate().find_map(|(i, s)| {
                    let found = s.select(dom);
                    found.first().map(|el| (el.node, i, found.len()))
                })?
            }
            ResolutionPolicy::DocumentOrder => {
                let union = field.select_any(dom);
                let first = union.first()?;
                let index = field.first_matching_strategy(dom, first)?;
                (first.node, index, union.len())
            }
        };
        let visible = dom.get(node).is_some_and(|el| el.visible);
        Some(Resolution {
            node,
            strategy_index,
            strategy: field.strategies()[strategy_index].to_string(),
            matched,
            visible,
            elapsed: Duration::ZERO,
        })
    }

    /// Visible elements across the union of all strategies
    #[must_use]
    pub fn count_visible_in(field: &FieldRef, dom: &DomSnapshot) -> usize {
        field
            .select_any(dom)
            .into_iter()
            .filter(|el| el.visible)
            .count()
    }

    /// Single-shot resolution against the current page
    pub async fn probe(&self, driver: &dyn PageDriver, field: &FieldRef) -> FlowResult<Option<Resolution>> {
        let dom = driver.snapshot().await?;
        Ok(self.pick(field, &dom))
    }

    /// Visible elements matching `field` on the current page
    pub async fn count_visible(&self, driver: &dyn PageDriver, field: &FieldRef) -> FlowResult<usize> {
        let dom = driver.snapshot().await?;
        Ok(Self::count_visible_in(field, &dom))
    }

    /// Wait until `field` resolves and satisfies `requirement`
    pub async fn resolve(
        &self,
        driver: &dyn PageDriver,
        field: &FieldRef,
        requirement: Requirement,
        timeout: Duration,
    ) -> FlowResult<Resolution> {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut attempt = 0u32;
        let mut last_seen: Option<Resolution> = None;

        loop {
            attempt += 1;
            let dom = driver.snapshot().await?;
            let picked = self.pick(field, &dom);
            debug!(
                intent = field.intent(),
                policy = %self.policy,
                attempt,
                candidates = dom.len(),
                picked = ?picked.as_ref().map(|r| r.node),
                "resolving"
            );

            if let Some(mut resolution) = picked {
                let satisfied = match requirement {
                    Requirement::Attached => true,
                    Requirement::Visible => resolution.visible,
                };
                if satisfied {
                    resolution.elapsed = started.elapsed();
                    debug!(
                        intent = field.intent(),
                        policy = %self.policy,
                        node = %resolution.node,
                        strategy_index = resolution.strategy_index,
                        strategy = %resolution.strategy,
                        matched = resolution.matched,
                        elapsed_ms = resolution.elapsed.as_millis() as u64,
                        "resolved"
                    );
                    return Ok(resolution);
                }
                last_seen = Some(resolution);
            }

            if Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        let timeout_ms = timeout.as_millis() as u64;
        match last_seen {
            Some(hidden) => {
                warn!(
                    intent = field.intent(),
                    policy = %self.policy,
                    node = %hidden.node,
                    strategy = %hidden.strategy,
                    timeout_ms,
                    "matched element never became visible"
                );
                Err(FlowError::NotVisible {
                    intent: field.intent().to_string(),
                    timeout_ms,
                })
            }
            None => {
                let strategies = field.describe();
                warn!(
                    intent = field.intent(),
                    policy = %self.policy,
                    strategies = %strategies,
                    timeout_ms,
                    "no element matched"
                );
                Err(FlowError::ElementNotFound {
                    intent: field.intent().to_string(),
                    strategies,
                    timeout_ms,
                })
            }
        }
    }
}
