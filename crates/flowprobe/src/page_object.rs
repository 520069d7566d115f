//! Page Object support.
//!
//! A page object names the fields of one screen and exposes
//! intention-revealing operations over them. [`PageObject`] adds the common
//! "am I on this page" check built from a URL pattern and landmark fields.

use crate::locator::FieldRef;
use crate::result::{FlowError, FlowResult};
use crate::session::Session;
use crate::wait::UrlPattern;
use async_trait::async_trait;
use tracing::info;

/// A screen of the application under test
///
/// # Example
///
/// ```ignore
/// let login = LoginPage::new(&session, &config.loan);
/// login.goto().await?;
/// login.expect_loaded(&session).await?;
/// ```
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Name for logs and diagnostics
    fn page_name(&self) -> &'static str;

    /// URL of this page when it is showing
    fn url_pattern(&self) -> UrlPattern;

    /// Fields whose visibility proves the page rendered
    fn landmarks(&self) -> Vec<&FieldRef>;

    /// Wait for the URL to match, then for every landmark to be visible
    async fn expect_loaded(&self, session: &Session) -> FlowResult<()> {
        let pattern = self.url_pattern();
        let url = session
            .expect_page()
            .within(session.timeouts().navigation())
            .to_have_url(&pattern)
            .await
            .map_err(|e| match e {
                FlowError::AssertionFailed { expected, actual } => FlowError::assertion(
                    format!("{} at {expected}", self.page_name()),
                    actual,
                ),
                other => other,
            })?;
        for landmark in self.landmarks() {
            session.expect(landmark).to_be_visible().await?;
        }
        info!(page = self.page_name(), url = %url, "page loaded");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::TimeoutConfig;
    use crate::driver::{FakeDriver, FakeElement};
    use crate::locator::Strategy;
    use std::sync::Arc;

    struct SearchPage {
        query: FieldRef,
    }

    impl PageObject for SearchPage {
        fn page_name(&self) -> &'static str {
            "search"
        }

        fn url_pattern(&self) -> UrlPattern {
            UrlPattern::Regex("/search$".into())
        }

        fn landmarks(&self) -> Vec<&FieldRef> {
            vec![&self.query]
        }
    }

    fn page() -> SearchPage {
        SearchPage {
            query: FieldRef::new("query").or(Strategy::attr_eq("name", "q")),
        }
    }

    fn session(driver: FakeDriver) -> Session {
        Session::new(Arc::new(driver)).with_timeouts(TimeoutConfig {
            assertion_ms: 300,
            navigation_ms: 300,
            ..TimeoutConfig::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_loaded_page() {
        let s = session(FakeDriver::new().route("https://s.test/search", |dom| {
            dom.add(FakeElement::new("input").attr("name", "q"));
        }));
        s.goto("https://s.test/search").await.unwrap();
        page().expect_loaded(&s).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_url_names_the_page() {
        let s = session(FakeDriver::new());
        s.goto("https://s.test/elsewhere").await.unwrap();
        let err = page().expect_loaded(&s).await.unwrap_err();
        match err {
            FlowError::AssertionFailed { expected, actual } => {
                assert!(expected.starts_with("search at URL matching"));
                assert_eq!(actual, "https://s.test/elsewhere");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_landmark() {
        let s = session(FakeDriver::new().route("https://s.test/search", |dom| {
            dom.add(FakeElement::new("input").attr("name", "q").hidden());
        }));
        s.goto("https://s.test/search").await.unwrap();
        assert!(matches!(
            page().expect_loaded(&s).await,
            Err(FlowError::AssertionFailed { .. })
        ));
    }
}
