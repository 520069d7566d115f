//! Suite configuration.
//!
//! One [`SuiteConfig`] value is built at startup and passed to every session
//! and journey. Layers apply in order: built-in defaults, an optional YAML
//! file, a `.env` file plus process environment, then CLI flags (applied by
//! the binary).

use crate::data::{is_placeholder, Credentials};
use crate::resolver::ResolutionPolicy;
use crate::result::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Loan site base URL
pub const DEFAULT_LOAN_BASE_URL: &str = "https://staging.finchoice.mobi/uat1";

/// Storefront base URL
pub const DEFAULT_STORE_BASE_URL: &str = "https://sauce-demo.myshopify.com";

/// Join a base URL and a path with exactly one slash between them
#[must_use]
pub fn join_path(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Loan-application site settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanSiteConfig {
    /// Base URL, e.g. `https://staging.finchoice.mobi/uat1`
    pub base_url: String,
    /// Login page path relative to the base
    pub login_path: String,
    /// Customer landing path (redirects to the account login)
    pub landing_path: String,
    /// Forgot-password path
    pub forgot_password_path: String,
    /// Applicant login
    pub credentials: Credentials,
    /// HTTP basic credentials sent on every request
    pub basic_auth: Option<Credentials>,
    /// Cell number of a registered account for password recovery
    pub registered_cell: String,
    /// ID number of that account
    pub registered_id: String,
}

impl Default for LoanSiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LOAN_BASE_URL.to_string(),
            login_path: "/".to_string(),
            landing_path: "/Reloan/CustomerLanding".to_string(),
            forgot_password_path: "/ForgotPassword".to_string(),
            credentials: Credentials::new("testuser", "testpass"),
            basic_auth: Some(Credentials::new("admin", "finchoice")),
            registered_cell: "PLACEHOLDER_CELL".to_string(),
            registered_id: "PLACEHOLDER_ID".to_string(),
        }
    }
}

impl LoanSiteConfig {
    /// Absolute URL for a path on this site
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        join_path(&self.base_url, path)
    }

    /// Login page
    #[must_use]
    pub fn login_url(&self) -> String {
        self.url(&self.login_path)
    }

    /// Customer landing page
    #[must_use]
    pub fn landing_url(&self) -> String {
        self.url(&self.landing_path)
    }

    /// Forgot-password page
    #[must_use]
    pub fn forgot_password_url(&self) -> String {
        self.url(&self.forgot_password_path)
    }

    /// Host part of the base URL, used for "on the right site" checks
    #[must_use]
    pub fn host(&self) -> &str {
        let rest = self
            .base_url
            .split_once("://")
            .map_or(self.base_url.as_str(), |(_, rest)| rest);
        rest.split('/').next().unwrap_or(rest)
    }

    /// Registered recovery account, when both values are real
    #[must_use]
    pub fn registered_account(&self) -> Option<(&str, &str)> {
        if is_placeholder(&self.registered_cell) || is_placeholder(&self.registered_id) {
            None
        } else {
            Some((&self.registered_cell, &self.registered_id))
        }
    }
}

/// Storefront settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL
    pub base_url: String,
    /// Registration path
    pub register_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_STORE_BASE_URL.to_string(),
            register_path: "/account/register".to_string(),
        }
    }
}

impl StoreConfig {
    /// Registration page
    #[must_use]
    pub fn register_url(&self) -> String {
        join_path(&self.base_url, &self.register_path)
    }
}

/// Emulated device a scenario runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceProfile {
    /// Desktop Chrome, 1280x720
    #[default]
    DesktopChrome,
    /// Pixel 5, 393x851 with a mobile user agent
    #[serde(rename = "pixel-5", alias = "pixel5")]
    Pixel5,
}

impl DeviceProfile {
    /// Every profile
    pub const ALL: [Self; 2] = [Self::DesktopChrome, Self::Pixel5];

    /// Project name used on the command line and in reports
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DesktopChrome => "desktop-chrome",
            Self::Pixel5 => "pixel-5",
        }
    }

    /// Viewport in CSS pixels
    #[must_use]
    pub const fn viewport(&self) -> (u32, u32) {
        match self {
            Self::DesktopChrome => (1280, 720),
            Self::Pixel5 => (393, 851),
        }
    }

    /// Device pixel ratio
    #[must_use]
    pub const fn device_scale_factor(&self) -> f64 {
        match self {
            Self::DesktopChrome => 1.0,
            Self::Pixel5 => 2.75,
        }
    }

    /// Whether touch and mobile layout are emulated
    #[must_use]
    pub const fn is_mobile(&self) -> bool {
        matches!(self, Self::Pixel5)
    }

    /// User agent override
    #[must_use]
    pub const fn user_agent(&self) -> Option<&'static str> {
        match self {
            Self::DesktopChrome => None,
            Self::Pixel5 => Some(
                "Mozilla/5.0 (Linux; Android 11; Pixel 5) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36",
            ),
        }
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceProfile {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop-chrome" | "chromium" | "desktop" => Ok(Self::DesktopChrome),
            "pixel-5" | "pixel5" | "mobile-chrome" | "mobile" => Ok(Self::Pixel5),
            other => Err(FlowError::config(format!(
                "unknown project '{other}' (expected desktop-chrome or pixel-5)"
            ))),
        }
    }
}

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run headless
    pub headless: bool,
    /// Chromium sandbox
    pub sandbox: bool,
    /// Explicit Chromium binary
    pub chromium_path: Option<PathBuf>,
    /// Accept invalid TLS certificates
    pub ignore_https_errors: bool,
    /// Device projects to run every scenario on
    pub projects: Vec<DeviceProfile>,
    /// How competing locator strategies are combined
    pub policy: ResolutionPolicy,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: false,
            chromium_path: None,
            ignore_https_errors: true,
            projects: vec![DeviceProfile::DesktopChrome],
            policy: ResolutionPolicy::FirstStrategy,
        }
    }
}

impl BrowserConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Replace the project list
    #[must_use]
    pub fn with_projects(mut self, projects: Vec<DeviceProfile>) -> Self {
        self.projects = projects;
        self
    }
}

/// Wait bounds, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Waiting for a field before acting on it
    pub action_ms: u64,
    /// Waiting for an expected state
    pub assertion_ms: u64,
    /// Waiting for a success indicator
    pub success_ms: u64,
    /// Waiting for a navigation or load state
    pub navigation_ms: u64,
    /// Polling cadence
    pub poll_interval_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            action_ms: 10_000,
            assertion_ms: 10_000,
            success_ms: 15_000,
            navigation_ms: 30_000,
            poll_interval_ms: 100,
        }
    }
}

impl TimeoutConfig {
    /// Action bound
    #[must_use]
    pub const fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    /// Assertion bound
    #[must_use]
    pub const fn assertion(&self) -> Duration {
        Duration::from_millis(self.assertion_ms)
    }

    /// Success-indicator bound
    #[must_use]
    pub const fn success(&self) -> Duration {
        Duration::from_millis(self.success_ms)
    }

    /// Navigation bound
    #[must_use]
    pub const fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    /// Poll interval
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Everything a run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Loan-application site
    pub loan: LoanSiteConfig,
    /// Storefront
    pub store: StoreConfig,
    /// Browser
    pub browser: BrowserConfig,
    /// Wait bounds
    pub timeouts: TimeoutConfig,
    /// Whole-scenario retries after a failure
    pub retries: u32,
    /// Root of the screenshot tree
    pub evidence_dir: PathBuf,
    /// Where `report.json` is written
    pub output_dir: PathBuf,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            loan: LoanSiteConfig::default(),
            store: StoreConfig::default(),
            browser: BrowserConfig::default(),
            timeouts: TimeoutConfig::default(),
            retries: 1,
            evidence_dir: PathBuf::from("flowprobe-results/evidence"),
            output_dir: PathBuf::from("flowprobe-results"),
        }
    }
}

impl SuiteConfig {
    /// Parse YAML; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> FlowResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Read a YAML file
    pub fn from_yaml_file(path: &Path) -> FlowResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FlowError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> FlowResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Defaults, then `path` if given, then `.env` and the process environment
    pub fn load(path: Option<&Path>) -> FlowResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        match dotenvy::dotenv() {
            Ok(env_file) => debug!(path = %env_file.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(FlowError::config(format!(".env: {e}"))),
        }
        config.apply_env_with(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment values obtained through `lookup`
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("FLOWPROBE_LOAN_BASE_URL") {
            self.loan.base_url = url;
        }
        if let Some(url) = get("FLOWPROBE_STORE_BASE_URL") {
            self.store.base_url = url;
        }
        if let Some(user) = get("LOGIN_USERNAME") {
            self.loan.credentials.username = user;
        }
        if let Some(pass) = get("LOGIN_PASSWORD") {
            self.loan.credentials.password = pass;
        }

        let auth_user = get("BASIC_AUTH_USERNAME");
        let auth_pass = get("BASIC_AUTH_PASSWORD");
        if auth_user.is_some() || auth_pass.is_some() {
            let current = self.loan.basic_auth.clone().unwrap_or_else(|| Credentials::new("", ""));
            self.loan.basic_auth = Some(Credentials::new(
                auth_user.unwrap_or(current.username),
                auth_pass.unwrap_or(current.password),
            ));
        }

        if let Some(cell) = get("FP_VALID_CELL") {
            self.loan.registered_cell = cell;
        }
        if let Some(id) = get("FP_VALID_ID") {
            self.loan.registered_id = id;
        }
        if let Some(headless) = get("FLOWPROBE_HEADLESS") {
            self.browser.headless = !matches!(headless.trim(), "0" | "false" | "no");
        }
        if get("CI").is_some() {
            self.retries = self.retries.max(2);
        }
    }

    /// Reject values no run could succeed with
    pub fn validate(&self) -> FlowResult<()> {
        for (name, url) in [("loan.base_url", &self.loan.base_url), ("store.base_url", &self.store.base_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(FlowError::config(format!("{name} must be an http(s) URL, got '{url}'")));
            }
        }
        if self.browser.projects.is_empty() {
            return Err(FlowError::config("browser.projects must not be empty"));
        }
        if self.retries > 10 {
            return Err(FlowError::config(format!("retries must be at most 10, got {}", self.retries)));
        }
        let t = &self.timeouts;
        if t.action_ms == 0 || t.assertion_ms == 0 || t.success_ms == 0 || t.navigation_ms == 0 {
            return Err(FlowError::config("timeouts must be positive"));
        }
        if t.poll_interval_ms == 0 {
            return Err(FlowError::config("timeouts.poll_interval_ms must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_default_urls() {
            let config = SuiteConfig::default();
            assert_eq!(config.loan.login_url(), "https://staging.finchoice.mobi/uat1/");
            assert_eq!(
                config.loan.forgot_password_url(),
                "https://staging.finchoice.mobi/uat1/ForgotPassword"
            );
            assert_eq!(
                config.loan.landing_url(),
                "https://staging.finchoice.mobi/uat1/Reloan/CustomerLanding"
            );
            assert_eq!(
                config.store.register_url(),
                "https://sauce-demo.myshopify.com/account/register"
            );
            assert_eq!(config.loan.host(), "staging.finchoice.mobi");
        }

        #[test]
        fn test_defaults_validate() {
            assert!(SuiteConfig::default().validate().is_ok());
        }

        #[test]
        fn test_placeholder_account_is_unconfigured() {
            assert!(SuiteConfig::default().loan.registered_account().is_none());
        }

        #[test]
        fn test_device_profiles() {
            assert_eq!(DeviceProfile::Pixel5.viewport(), (393, 851));
            assert!(DeviceProfile::Pixel5.user_agent().is_some());
            assert!(DeviceProfile::DesktopChrome.user_agent().is_none());
            assert_eq!("pixel-5".parse::<DeviceProfile>().unwrap(), DeviceProfile::Pixel5);
            assert_eq!("chromium".parse::<DeviceProfile>().unwrap(), DeviceProfile::DesktopChrome);
            assert!("firefox".parse::<DeviceProfile>().is_err());
        }
    }

    mod layering_tests {
        use super::*;

        #[test]
        fn test_yaml_overrides_only_given_keys() {
            let yaml = "loan:\n  base_url: https://uat2.example\nretries: 3\nbrowser:\n  projects: [pixel-5]\n";
            let config = SuiteConfig::from_yaml_str(yaml).unwrap();
            assert_eq!(config.loan.base_url, "https://uat2.example");
            assert_eq!(config.loan.forgot_password_path, "/ForgotPassword");
            assert_eq!(config.retries, 3);
            assert_eq!(config.browser.projects, vec![DeviceProfile::Pixel5]);
            assert_eq!(config.store.base_url, DEFAULT_STORE_BASE_URL);
        }

        #[test]
        fn test_yaml_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "timeouts:\n  success_ms: 20000").unwrap();
            let config = SuiteConfig::from_yaml_file(file.path()).unwrap();
            assert_eq!(config.timeouts.success_ms, 20_000);
            assert_eq!(config.timeouts.action_ms, 10_000);
        }

        #[test]
        fn test_bad_yaml_is_an_error() {
            assert!(matches!(
                SuiteConfig::from_yaml_str("retries: [oops"),
                Err(FlowError::Yaml(_))
            ));
        }

        #[test]
        fn test_env_overlay() {
            let mut config = SuiteConfig::default();
            config.apply_env_with(env(&[
                ("LOGIN_USERNAME", "jane"),
                ("LOGIN_PASSWORD", "s3cret"),
                ("BASIC_AUTH_PASSWORD", "other"),
                ("FP_VALID_CELL", "0821112222"),
                ("FP_VALID_ID", "8001015009087"),
                ("FLOWPROBE_STORE_BASE_URL", "https://shop.test"),
                ("FLOWPROBE_HEADLESS", "false"),
            ]));
            assert_eq!(config.loan.credentials, Credentials::new("jane", "s3cret"));
            assert_eq!(config.loan.basic_auth, Some(Credentials::new("admin", "other")));
            assert_eq!(config.loan.registered_account(), Some(("0821112222", "8001015009087")));
            assert_eq!(config.store.base_url, "https://shop.test");
            assert!(!config.browser.headless);
        }

        #[test]
        fn test_blank_env_values_are_ignored() {
            let mut config = SuiteConfig::default();
            config.apply_env_with(env(&[("LOGIN_USERNAME", "  ")]));
            assert_eq!(config.loan.credentials.username, "testuser");
        }

        #[test]
        fn test_ci_raises_retries() {
            let mut config = SuiteConfig::default();
            config.apply_env_with(env(&[("CI", "true")]));
            assert_eq!(config.retries, 2);
        }

        #[test]
        fn test_validation_rejects_bad_values() {
            let mut config = SuiteConfig::default();
            config.loan.base_url = "ftp://nope".to_string();
            assert!(config.validate().is_err());

            let mut config = SuiteConfig::default();
            config.browser.projects.clear();
            assert!(config.validate().is_err());

            let mut config = SuiteConfig::default();
            config.timeouts.poll_interval_ms = 0;
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_yaml_round_trip_keeps_projects() {
            let mut config = SuiteConfig::default();
            config.browser.projects = DeviceProfile::ALL.to_vec();
            let yaml = config.to_yaml().unwrap();
            assert!(yaml.contains("pixel-5"));
            assert_eq!(SuiteConfig::from_yaml_str(&yaml).unwrap(), config);
        }
    }
}
