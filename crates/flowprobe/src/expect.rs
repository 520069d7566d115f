//! Bounded expectations on fields and pages.
//!
//! Every expectation waits up to its bound for the state to materialize and
//! fails with [`FlowError::AssertionFailed`] carrying expected vs actual.
//!
//! ```ignore
//! session.expect(&page.error_message()).within(Duration::from_secs(10)).to_be_visible().await?;
//! session.expect_page().not_to_have_url(&UrlPattern::Contains("/login".into())).await?;
//! ```

use crate::locator::FieldRef;
use crate::result::{FlowError, FlowResult};
use crate::session::Session;
use crate::wait::{poll_until, UrlPattern, WaitOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Expectation on one field
#[derive(Debug, Clone)]
pub struct Expect<'a> {
    session: &'a Session,
    field: &'a FieldRef,
    timeout: Duration,
}

impl Session {
    /// Expectation on `field`, bounded by the assertion timeout
    #[must_use]
    pub fn expect<'a>(&'a self, field: &'a FieldRef) -> Expect<'a> {
        Expect {
            session: self,
            field,
            timeout: self.timeouts().assertion(),
        }
    }

    /// Expectation on the page itself
    #[must_use]
    pub fn expect_page(&self) -> PageExpect<'_> {
        PageExpect {
            session: self,
            timeout: self.timeouts().assertion(),
        }
    }
}

impl Expect<'_> {
    /// Change the bound
    #[must_use]
    pub const fn within(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn options(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(self.timeout.as_millis() as u64)
            .with_poll_interval(self.session.timeouts().poll_interval_ms)
    }

    async fn wait_count(&self, what: &str, accept: impl Fn(usize) -> bool + Sync) -> FlowResult<Result<usize, usize>> {
        let last = AtomicUsize::new(0);
        let waited = poll_until(what, self.options(), || {
            let last = &last;
            let accept = &accept;
            async move {
                let n = self.session.count_visible(self.field).await?;
                last.store(n, Ordering::Relaxed);
                Ok(accept(n).then_some(n))
            }
        })
        .await;
        match waited {
            Ok(n) => Ok(Ok(n)),
            Err(FlowError::Timeout { .. }) => Ok(Err(last.load(Ordering::Relaxed))),
            Err(e) => Err(e),
        }
    }

    /// At least one element of the field becomes visible
    pub async fn to_be_visible(self) -> FlowResult<()> {
        let what = format!("'{}' visible", self.field.intent());
        match self.wait_count(&what, |n| n > 0).await? {
            Ok(n) => {
                debug!(field = self.field.intent(), visible = n, "expectation met");
                Ok(())
            }
            Err(_) => {
                warn!(field = self.field.intent(), tried = %self.field.describe(), "not visible");
                Err(FlowError::assertion(
                    format!("'{}' to be visible within {}ms", self.field.intent(), self.timeout.as_millis()),
                    format!("nothing visible for {}", self.field.describe()),
                ))
            }
        }
    }

    /// No element of the field is visible
    pub async fn to_be_hidden(self) -> FlowResult<()> {
        let what = format!("'{}' hidden", self.field.intent());
        self.wait_count(&what, |n| n == 0).await?.map(drop).map_err(|n| {
            FlowError::assertion(
                format!("'{}' to be hidden", self.field.intent()),
                format!("{n} visible"),
            )
        })
    }

    /// Exactly `expected` elements of the field are visible
    pub async fn to_have_visible_count(self, expected: usize) -> FlowResult<()> {
        let what = format!("{expected} visible '{}'", self.field.intent());
        self.wait_count(&what, |n| n == expected).await?.map(drop).map_err(|n| {
            FlowError::assertion(
                format!("{expected} visible '{}'", self.field.intent()),
                format!("{n} visible"),
            )
        })
    }

    /// The resolved element carries `name="value"`
    pub async fn to_have_attribute(self, name: &str, value: &str) -> FlowResult<()> {
        let actual = self.session.attribute(self.field, name).await?;
        if actual.as_deref() == Some(value) {
            Ok(())
        } else {
            Err(FlowError::assertion(
                format!("'{}' to have {name}=\"{value}\"", self.field.intent()),
                actual.map_or_else(|| format!("no {name} attribute"), |a| format!("{name}=\"{a}\"")),
            ))
        }
    }
}

/// Expectation on URL and title
#[derive(Debug, Clone)]
pub struct PageExpect<'a> {
    session: &'a Session,
    timeout: Duration,
}

impl PageExpect<'_> {
    /// Change the bound
    #[must_use]
    pub const fn within(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL comes to match `pattern`; returns it
    pub async fn to_have_url(self, pattern: &UrlPattern) -> FlowResult<String> {
        match self.session.wait_for_url(pattern, self.timeout).await {
            Ok(url) => Ok(url),
            Err(FlowError::Timeout { .. }) => Err(FlowError::assertion(
                pattern.to_string(),
                self.session.url().await?,
            )),
            Err(e) => Err(e),
        }
    }

    /// URL comes to not match `pattern`; returns it
    pub async fn not_to_have_url(self, pattern: &UrlPattern) -> FlowResult<String> {
        match self.session.wait_for_url_not(pattern, self.timeout).await {
            Ok(url) => Ok(url),
            Err(FlowError::Timeout { .. }) => Err(FlowError::assertion(
                format!("not {pattern}"),
                self.session.url().await?,
            )),
            Err(e) => Err(e),
        }
    }

    /// Title comes to match the regex `pattern`; returns it
    pub async fn to_have_title(self, pattern: &str) -> FlowResult<String> {
        let re = regex::Regex::new(pattern)
            .map_err(|e| FlowError::config(format!("bad title pattern /{pattern}/: {e}")))?;
        let options = WaitOptions::new()
            .with_timeout(self.timeout.as_millis() as u64)
            .with_poll_interval(self.session.timeouts().poll_interval_ms);
        let waited = poll_until(&format!("title /{pattern}/"), options, || async {
            let title = self.session.title().await?;
            Ok(re.is_match(&title).then_some(title))
        })
        .await;
        match waited {
            Ok(title) => Ok(title),
            Err(FlowError::Timeout { .. }) => Err(FlowError::assertion(
                format!("title matching /{pattern}/"),
                format!("'{}'", self.session.title().await?),
            )),
            Err(e) => Err(e),
        }
    }
}
