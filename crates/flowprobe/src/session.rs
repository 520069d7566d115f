//! One page under test.
//!
//! A [`Session`] pairs a driver with a resolver and the configured wait
//! bounds. Every element-level action re-resolves its field immediately
//! before acting, so nothing cached can go stale between steps.

use crate::config::{SuiteConfig, TimeoutConfig};
use crate::dom::DomSnapshot;
use crate::driver::PageDriver;
use crate::locator::FieldRef;
use crate::resolver::{Requirement, Resolution, Resolver};
use crate::result::FlowResult;
use crate::wait::{poll_until, LoadState, UrlPattern, WaitOptions};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Driver, resolver and wait bounds for one scenario attempt
#[derive(Clone)]
pub struct Session {
    driver: Arc<dyn PageDriver>,
    resolver: Resolver,
    timeouts: TimeoutConfig,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("driver", &self.driver.name())
            .field("resolver", &self.resolver)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl Session {
    /// Session with default resolver and timeouts
    #[must_use]
    pub fn new(driver: Arc<dyn PageDriver>) -> Self {
        Self {
            driver,
            resolver: Resolver::new(),
            timeouts: TimeoutConfig::default(),
        }
    }

    /// Session using the policy and timeouts from `config`
    #[must_use]
    pub fn configured(driver: Arc<dyn PageDriver>, config: &SuiteConfig) -> Self {
        Self::new(driver)
            .with_resolver(
                Resolver::new()
                    .with_policy(config.browser.policy)
                    .with_poll_interval(config.timeouts.poll_interval()),
            )
            .with_timeouts(config.timeouts)
    }

    /// Replace the resolver
    #[must_use]
    pub const fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the wait bounds
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &dyn PageDriver {
        self.driver.as_ref()
    }

    /// Active resolver
    #[must_use]
    pub const fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Active wait bounds
    #[must_use]
    pub const fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    fn wait_options(&self, timeout: Duration) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(timeout.as_millis() as u64)
            .with_poll_interval(self.timeouts.poll_interval_ms)
    }

    // navigation

    /// Navigate and wait for the `load` event
    pub async fn goto(&self, url: &str) -> FlowResult<()> {
        self.goto_until(url, LoadState::Load).await
    }

    /// Navigate and wait for `state`
    pub async fn goto_until(&self, url: &str, state: LoadState) -> FlowResult<()> {
        info!(url, until = %state, "goto");
        self.driver.goto(url).await?;
        self.driver
            .wait_for_load(state, self.timeouts.navigation())
            .await
    }

    /// Wait for a load state of the current document
    pub async fn wait_for_load(&self, state: LoadState) -> FlowResult<()> {
        self.driver
            .wait_for_load(state, self.timeouts.navigation())
            .await
    }

    /// History back, then wait for `DOMContentLoaded`
    pub async fn go_back(&self) -> FlowResult<()> {
        info!("back");
        self.driver.go_back().await?;
        self.wait_for_load(LoadState::DomContentLoaded).await
    }

    /// Current URL
    pub async fn url(&self) -> FlowResult<String> {
        self.driver.current_url().await
    }

    /// Document title
    pub async fn title(&self) -> FlowResult<String> {
        self.driver.title().await
    }

    /// Wait until the URL matches `pattern`; returns it
    pub async fn wait_for_url(&self, pattern: &UrlPattern, timeout: Duration) -> FlowResult<String> {
        let what = pattern.to_string();
        poll_until(&what, self.wait_options(timeout), || async {
            let url = self.driver.current_url().await?;
            Ok(pattern.matches(&url).then_some(url))
        })
        .await
    }

    /// Wait until the URL stops matching `pattern`; returns it
    pub async fn wait_for_url_not(&self, pattern: &UrlPattern, timeout: Duration) -> FlowResult<String> {
        let what = format!("not {pattern}");
        poll_until(&what, self.wait_options(timeout), || async {
            let url = self.driver.current_url().await?;
            Ok((!pattern.matches(&url)).then_some(url))
        })
        .await
    }

    // resolution

    /// Resolve `field` under `requirement` within `timeout`
    pub async fn resolve(
        &self,
        field: &FieldRef,
        requirement: Requirement,
        timeout: Duration,
    ) -> FlowResult<Resolution> {
        self.resolver
            .resolve(self.driver.as_ref(), field, requirement, timeout)
            .await
    }

    /// Wait for `field` to be visible
    pub async fn wait_visible(&self, field: &FieldRef, timeout: Duration) -> FlowResult<Resolution> {
        self.resolve(field, Requirement::Visible, timeout).await
    }

    /// Whether any element of `field` is visible right now
    pub async fn is_visible(&self, field: &FieldRef) -> FlowResult<bool> {
        Ok(self.count_visible(field).await? > 0)
    }

    /// Visible elements across every strategy of `field`
    pub async fn count_visible(&self, field: &FieldRef) -> FlowResult<usize> {
        self.resolver.count_visible(self.driver.as_ref(), field).await
    }

    /// Current document snapshot
    pub async fn snapshot(&self) -> FlowResult<DomSnapshot> {
        self.driver.snapshot().await
    }

    /// Attribute of the element `field` resolves to
    pub async fn attribute(&self, field: &FieldRef, name: &str) -> FlowResult<Option<String>> {
        let resolution = self
            .resolve(field, Requirement::Attached, self.timeouts.action())
            .await?;
        let dom = self.driver.snapshot().await?;
        Ok(dom
            .get(resolution.node)
            .and_then(|el| el.attr(name))
            .map(str::to_string))
    }

    /// Visible text of the whole page, one element per line
    pub async fn page_text(&self) -> FlowResult<String> {
        let dom = self.driver.snapshot().await?;
        let lines: Vec<&str> = dom
            .elements()
            .iter()
            .filter(|el| el.visible && !el.text.is_empty())
            .map(|el| el.text.as_str())
            .collect();
        Ok(lines.join("\n"))
    }

    // interaction

    /// Replace the value of `field`
    pub async fn fill(&self, field: &FieldRef, text: &str) -> FlowResult<()> {
        let resolution = self
            .resolve(field, Requirement::Visible, self.timeouts.action())
            .await?;
        info!(
            field = field.intent(),
            node = %resolution.node,
            strategy = %resolution.strategy,
            chars = text.chars().count(),
            "fill"
        );
        self.driver.fill(resolution.node, text).await
    }

    /// Click `field`
    pub async fn click(&self, field: &FieldRef) -> FlowResult<()> {
        let resolution = self
            .resolve(field, Requirement::Visible, self.timeouts.action())
            .await?;
        info!(
            field = field.intent(),
            node = %resolution.node,
            strategy = %resolution.strategy,
            "click"
        );
        self.driver.click(resolution.node).await
    }

    /// Submit the form containing `field` without clicking anything
    pub async fn submit_form(&self, field: &FieldRef) -> FlowResult<()> {
        let resolution = self
            .resolve(field, Requirement::Attached, self.timeouts.action())
            .await?;
        info!(field = field.intent(), node = %resolution.node, "submit form");
        self.driver.submit_form(resolution.node).await
    }

    /// Fixed pause
    pub async fn pause(&self, duration: Duration) {
        debug!(ms = duration.as_millis() as u64, "pause");
        tokio::time::sleep(duration).await;
    }

    /// Resize the viewport
    pub async fn set_viewport(&self, width: u32, height: u32) -> FlowResult<()> {
        info!(width, height, "viewport");
        self.driver.set_viewport(width, height).await
    }

    /// Full-page PNG of the current document
    pub async fn screenshot(&self) -> FlowResult<Vec<u8>> {
        self.driver.screenshot_full_page().await
    }

    /// Release the page
    pub async fn close(&self) -> FlowResult<()> {
        self.driver.close().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::driver::{DriverCall, FakeDriver, FakeElement};
    use crate::locator::Strategy;
    use crate::result::FlowError;

    fn site() -> Arc<FakeDriver> {
        Arc::new(
            FakeDriver::new()
                .route("https://s.test/form", |dom| {
                    dom.set_title("Form");
                    let form = dom.add(FakeElement::new("form").key("form").on_submit(|dom| {
                        let name = dom.value("name");
                        dom.navigate(format!("/done?name={name}"));
                    }));
                    dom.add_child(form, FakeElement::new("input").id("name").attr("name", "fullName"));
                    dom.add_child(
                        form,
                        FakeElement::new("input")
                            .id("pw")
                            .attr("type", "password"),
                    );
                    dom.add_child(form, FakeElement::new("button").id("go").text("Go"));
                    dom.add(FakeElement::new("p").id("err").attr("class", "error").hidden());
                })
                .route("https://s.test/done", |dom| {
                    dom.set_title("Done");
                    dom.add(FakeElement::new("h1").text("Thanks"));
                }),
        )
    }

    fn name_field() -> FieldRef {
        FieldRef::new("name")
            .or(Strategy::attr_icontains("name", "name").tagged("input"))
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_goto_and_title() {
            let driver = site();
            let session = Session::new(driver.clone());
            session.goto("https://s.test/form").await.unwrap();
            assert_eq!(session.title().await.unwrap(), "Form");
            assert_eq!(driver.calls()[0], DriverCall::Goto("https://s.test/form".to_string()));
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_for_url_times_out() {
            let session = Session::new(site());
            session.goto("https://s.test/form").await.unwrap();
            let err = session
                .wait_for_url(&UrlPattern::Contains("done".into()), Duration::from_millis(300))
                .await
                .unwrap_err();
            assert!(matches!(err, FlowError::Timeout { ms: 300, .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_for_url_not() {
            let session = Session::new(site());
            session.goto("https://s.test/form").await.unwrap();
            let url = session
                .wait_for_url_not(&UrlPattern::Contains("login".into()), Duration::from_millis(300))
                .await
                .unwrap();
            assert_eq!(url, "https://s.test/form");
        }
    }

    mod interaction_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_fill_then_click_submits_form() {
            let driver = site();
            let session = Session::new(driver.clone());
            session.goto("https://s.test/form").await.unwrap();
            session.fill(&name_field(), "Ann").await.unwrap();
            session
                .click(&FieldRef::new("go").or(Strategy::text("button", "go")))
                .await
                .unwrap();
            assert_eq!(session.url().await.unwrap(), "https://s.test/done?name=Ann");
            assert_eq!(session.page_text().await.unwrap(), "Thanks");
        }

        #[tokio::test(start_paused = true)]
        async fn test_submit_form_bypasses_click() {
            let driver = site();
            let session = Session::new(driver.clone());
            session.goto("https://s.test/form").await.unwrap();
            session.fill(&name_field(), "Bo").await.unwrap();
            session.submit_form(&name_field()).await.unwrap();
            assert!(driver
                .calls()
                .iter()
                .any(|c| matches!(c, DriverCall::Submit(_))));
            assert!(session.url().await.unwrap().ends_with("name=Bo"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_attribute_and_visibility() {
            let session = Session::new(site());
            session.goto("https://s.test/form").await.unwrap();
            let pw = FieldRef::new("password").or(Strategy::input_type("password"));
            assert_eq!(
                session.attribute(&pw, "type").await.unwrap().as_deref(),
                Some("password")
            );
            let err = FieldRef::new("error").or(Strategy::class("error"));
            assert!(!session.is_visible(&err).await.unwrap());
            assert_eq!(session.count_visible(&name_field()).await.unwrap(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_fill_missing_field_fails_with_strategies() {
            let session = Session::new(site());
            session.goto("https://s.test/form").await.unwrap();
            let email = FieldRef::new("email").or(Strategy::input_type("email"));
            let err = session.fill(&email, "x").await.unwrap_err();
            assert!(matches!(err, FlowError::ElementNotFound { timeout_ms: 10_000, .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_configured_session_uses_config_timeouts() {
            let mut config = SuiteConfig::default();
            config.timeouts.action_ms = 250;
            let session = Session::configured(site(), &config);
            session.goto("https://s.test/form").await.unwrap();
            let email = FieldRef::new("email").or(Strategy::input_type("email"));
            let err = session.click(&email).await.unwrap_err();
            assert!(matches!(err, FlowError::ElementNotFound { timeout_ms: 250, .. }));
        }
    }
}
