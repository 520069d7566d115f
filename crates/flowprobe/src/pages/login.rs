//! Loan site login screen.

use crate::config::LoanSiteConfig;
use crate::data::Credentials;
use crate::locator::{FieldRef, Strategy};
use crate::page_object::PageObject;
use crate::result::FlowResult;
use crate::session::Session;
use crate::wait::UrlPattern;
use tracing::info;

/// Login form of the loan site
#[derive(Debug, Clone)]
pub struct LoginPage {
    session: Session,
    url: String,
    /// Username or e-mail input
    pub username: FieldRef,
    /// Password input
    pub password: FieldRef,
    /// Submit control
    pub login_button: FieldRef,
    /// Any error or alert banner
    pub error_message: FieldRef,
}

impl LoginPage {
    /// Login page of `site` driven through `session`
    #[must_use]
    pub fn new(session: &Session, site: &LoanSiteConfig) -> Self {
        Self {
            session: session.clone(),
            url: site.login_url(),
            username: FieldRef::new("username")
                .or(Strategy::attr_eq("name", "username").tagged("input"))
                .or(Strategy::input_type("text"))
                .or(Strategy::attr_contains("id", "user").tagged("input"))
                .or(Strategy::attr_icontains("placeholder", "username").tagged("input"))
                .or(Strategy::attr_icontains("placeholder", "email").tagged("input")),
            password: FieldRef::new("password").or(Strategy::input_type("password")),
            login_button: FieldRef::new("login button")
                .or(Strategy::button_type("submit"))
                .or(Strategy::input_type("submit"))
                .or(Strategy::text("button", "Login"))
                .or(Strategy::text("button", "Sign in"))
                .or(Strategy::text("button", "Log in")),
            error_message: FieldRef::new("login error")
                .or(Strategy::attr_contains("class", "error"))
                .or(Strategy::attr_contains("class", "alert"))
                .or(Strategy::role("alert")),
        }
    }

    /// Open the login page
    pub async fn goto(&self) -> FlowResult<()> {
        self.session.goto(&self.url).await
    }

    /// Fill both credentials and submit
    pub async fn login(&self, credentials: &Credentials) -> FlowResult<()> {
        info!(username = %credentials.username, "login");
        self.session
            .wait_visible(&self.username, self.session.timeouts().action())
            .await?;
        self.session.fill(&self.username, &credentials.username).await?;
        self.session.fill(&self.password, &credentials.password).await?;
        self.session.click(&self.login_button).await
    }

    /// Wait for the browser to leave any login URL; returns where it landed
    pub async fn expect_logged_in(&self) -> FlowResult<String> {
        self.session
            .expect_page()
            .within(self.session.timeouts().success())
            .not_to_have_url(&UrlPattern::ContainsIgnoreCase("login".into()))
            .await
    }

    /// An error banner becomes visible
    pub async fn expect_login_error(&self) -> FlowResult<()> {
        self.session.expect(&self.error_message).to_be_visible().await
    }

    /// Both credential inputs are visible
    pub async fn expect_form_visible(&self) -> FlowResult<()> {
        self.session.expect(&self.username).to_be_visible().await?;
        self.session.expect(&self.password).to_be_visible().await
    }
}

impl PageObject for LoginPage {
    fn page_name(&self) -> &'static str {
        "login"
    }

    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::Regex(r"(?i)login|/uat1/?$|/$".into())
    }

    fn landmarks(&self) -> Vec<&FieldRef> {
        vec![&self.username, &self.password]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::driver::{DriverCall, FakeDriver, FakeElement};
    use std::sync::Arc;

    fn site() -> LoanSiteConfig {
        LoanSiteConfig {
            base_url: "https://loan.test/uat1".to_string(),
            ..LoanSiteConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_username_found_by_placeholder() {
        let driver = Arc::new(FakeDriver::new().route("https://loan.test/uat1/", |dom| {
            let form = dom.add(FakeElement::new("form"));
            dom.add_child(
                form,
                FakeElement::new("input")
                    .id("login-email")
                    .attr("type", "email")
                    .attr("placeholder", "Your Email"),
            );
            dom.add_child(form, FakeElement::new("input").id("pw").attr("type", "password"));
            dom.add_child(form, FakeElement::new("button").id("go").text("Sign in"));
        }));
        let session = Session::new(driver.clone());
        let page = LoginPage::new(&session, &site());
        page.goto().await.unwrap();
        page.expect_loaded(&session).await.unwrap();
        page.login(&Credentials::new("jane", "pw")).await.unwrap();

        let fills: Vec<String> = driver
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                DriverCall::Fill(_, text) => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(fills, vec!["jane".to_string(), "pw".to_string()]);
        assert_eq!(driver.inspect(|dom| dom.value("login-email")), "jane");
    }
}
