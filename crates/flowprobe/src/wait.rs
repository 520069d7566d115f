//! Wait primitives: load states, bounded polling, URL patterns.

use crate::result::{FlowError, FlowResult};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Default timeout for element waits (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Quiet period treated as network idle
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

/// Page load states (Playwright parity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// `load` event fired (`document.readyState == "complete"`)
    #[default]
    Load,
    /// `DOMContentLoaded` fired (`readyState` is `interactive` or later)
    DomContentLoaded,
    /// Loaded and then quiet for [`NETWORK_IDLE_THRESHOLD_MS`]
    NetworkIdle,
}

impl LoadState {
    /// Get the JavaScript event name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::NetworkIdle => "networkidle",
        }
    }

    /// Whether a `document.readyState` value satisfies this state
    #[must_use]
    pub fn reached_by(&self, ready_state: &str) -> bool {
        match self {
            Self::DomContentLoaded => matches!(ready_state, "interactive" | "complete"),
            Self::Load | Self::NetworkIdle => ready_state == "complete",
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

/// Bound and cadence of a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Poll `probe` until it yields a value or the bound expires.
///
/// The probe runs at least once, even with a zero timeout. Errors from the
/// probe abort the wait immediately.
pub async fn poll_until<T, F, Fut>(what: &str, options: WaitOptions, mut probe: F) -> FlowResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FlowResult<Option<T>>>,
{
    let deadline = Instant::now() + options.timeout();
    loop {
        if let Some(value) = probe().await? {
            return Ok(value);
        }
        if Instant::now() >= deadline {
            return Err(FlowError::Timeout {
                what: what.to_string(),
                ms: options.timeout_ms,
            });
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// URL matcher for page expectations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Prefix match
    Prefix(String),
    /// Suffix match, e.g. `/login`
    Suffix(String),
    /// Contains substring
    Contains(String),
    /// Case-insensitive substring
    ContainsIgnoreCase(String),
    /// Regex match
    Regex(String),
    /// Any of several patterns
    AnyOf(Vec<UrlPattern>),
}

impl UrlPattern {
    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(pattern) => url == pattern,
            Self::Prefix(pattern) => url.starts_with(pattern.as_str()),
            Self::Suffix(pattern) => url.trim_end_matches('/').ends_with(pattern.as_str()),
            Self::Contains(pattern) => url.contains(pattern.as_str()),
            Self::ContainsIgnoreCase(pattern) => {
                url.to_lowercase().contains(&pattern.to_lowercase())
            }
            Self::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(url))
                .unwrap_or(false),
            Self::AnyOf(patterns) => patterns.iter().any(|p| p.matches(url)),
        }
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(p) => write!(f, "URL equal to '{p}'"),
            Self::Prefix(p) => write!(f, "URL starting with '{p}'"),
            Self::Suffix(p) => write!(f, "URL ending with '{p}'"),
            Self::Contains(p) => write!(f, "URL containing '{p}'"),
            Self::ContainsIgnoreCase(p) => write!(f, "URL containing '{p}' (any case)"),
            Self::Regex(p) => write!(f, "URL matching /{p}/"),
            Self::AnyOf(patterns) => {
                let parts: Vec<String> = patterns.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(" or "))
            }
        }
    }
}
