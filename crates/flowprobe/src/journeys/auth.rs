//! Authentication journeys.

use crate::data::Credentials;
use crate::page_object::PageObject;
use crate::pages::LoginPage;
use crate::result::FlowResult;
use crate::scenario::{Scenario, ScenarioContext, Site};
use crate::wait::UrlPattern;
use futures::future::BoxFuture;

const GROUP: &str = "Authentication";

pub(super) const SCENARIOS: [Scenario; 4] = [
    Scenario::new(
        "auth-login-visible",
        "Login page is displayed on first visit",
        GROUP,
        Site::Loan,
        login_page_visible,
    ),
    Scenario::new(
        "auth-invalid-credentials",
        "Invalid credentials show an error",
        GROUP,
        Site::Loan,
        invalid_credentials,
    ),
    Scenario::new(
        "auth-valid-login",
        "Valid credentials leave the login page",
        GROUP,
        Site::Loan,
        valid_login,
    ),
    Scenario::new(
        "auth-round-trip",
        "Navigating back after login shows the login form",
        GROUP,
        Site::Loan,
        back_to_login,
    ),
];

/// Log in with the configured account and wait to leave the login URL
pub(super) async fn login_as_test_user(ctx: &ScenarioContext) -> FlowResult<LoginPage> {
    let login = LoginPage::new(ctx.session(), &ctx.config().loan);
    login.goto().await?;
    login.login(&ctx.config().loan.credentials).await?;
    login.expect_logged_in().await?;
    Ok(login)
}

fn login_page_visible(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let site = &ctx.config().loan;
        let login = LoginPage::new(ctx.session(), site);
        login.goto().await?;
        ctx.session()
            .expect_page()
            .to_have_url(&UrlPattern::ContainsIgnoreCase(site.host().to_string()))
            .await?;
        login.expect_form_visible().await?;
        ctx.session().expect(&login.login_button).to_be_visible().await?;
        ctx.capture("01-login-page").await.map(drop)
    })
}

fn invalid_credentials(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let login = LoginPage::new(ctx.session(), &ctx.config().loan);
        login.goto().await?;
        login.login(&Credentials::invalid()).await?;
        login.expect_login_error().await?;
        ctx.capture("01-login-error").await.map(drop)
    })
}

fn valid_login(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        login_as_test_user(ctx).await?;
        let landed = ctx
            .session()
            .expect_page()
            .not_to_have_url(&UrlPattern::ContainsIgnoreCase("login".into()))
            .await?;
        ctx.observe("landed on", landed);
        ctx.capture("01-logged-in").await.map(drop)
    })
}

fn back_to_login(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let login = login_as_test_user(ctx).await?;
        ctx.capture("01-logged-in").await?;
        ctx.session().go_back().await?;
        login.expect_loaded(ctx.session()).await?;
        ctx.capture("02-back-on-login").await.map(drop)
    })
}
