//! Result and error types for Flowprobe.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Flowprobe operations
pub type FlowResult<T> = Result<T, FlowError>;

/// Errors that can occur while driving a journey
#[derive(Debug, Error)]
pub enum FlowError {
    /// No element matched any strategy of a field within the wait bound
    #[error("No element for '{intent}' after {timeout_ms}ms (tried: {strategies})")]
    ElementNotFound {
        /// Semantic name of the field
        intent: String,
        /// Ordered strategy list, rendered for diagnostics
        strategies: String,
        /// Wait bound in milliseconds
        timeout_ms: u64,
    },

    /// An element matched but never became visible
    #[error("Element for '{intent}' matched but was not visible after {timeout_ms}ms")]
    NotVisible {
        /// Semantic name of the field
        intent: String,
        /// Wait bound in milliseconds
        timeout_ms: u64,
    },

    /// Neither dropdown strategy could pick the option
    #[error("Could not select '{label}' in '{intent}' ({attempts})")]
    OptionNotFound {
        /// Semantic name of the dropdown
        intent: String,
        /// Visible label requested
        label: String,
        /// What each strategy reported
        attempts: String,
    },

    /// An expected state did not materialize
    #[error("Assertion failed: expected {expected}, got {actual}")]
    AssertionFailed {
        /// What the scenario expected
        expected: String,
        /// What was observed
        actual: String,
    },

    /// A precondition from the environment is missing; the scenario is skipped
    #[error("Skipped: {reason}")]
    Skipped {
        /// Why the scenario cannot run
        reason: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("{what} timed out after {ms}ms")]
    Timeout {
        /// What was being waited for
        what: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Driver-level failure (CDP call, script evaluation, stale node)
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Evidence for this (scenario, step) pair was already written
    #[error("Evidence already exists at {}", path.display())]
    EvidenceExists {
        /// Existing file
        path: PathBuf,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl FlowError {
    /// Create an assertion failure with expected-vs-actual diagnostics
    #[must_use]
    pub fn assertion(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::AssertionFailed {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a skip
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error means "skip" rather than "fail"
    #[must_use]
    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}
