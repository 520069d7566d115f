//! Password recovery journeys, with a screenshot per step.

use crate::data::{INVALID_ID_NUMBER, UNREGISTERED_CELL};
use crate::page_object::PageObject;
use crate::pages::ForgotPasswordPage;
use crate::result::{FlowError, FlowResult};
use crate::scenario::{Scenario, ScenarioContext, Site};
use crate::wait::LoadState;
use futures::future::BoxFuture;
use std::time::Duration;

const GROUP: &str = "Forgot password";

/// Client-side validation settle time after an empty submit
const VALIDATION_SETTLE: Duration = Duration::from_secs(1);

pub(super) const SCENARIOS: [Scenario; 5] = [
    Scenario::new(
        "TC_FP_002",
        "Forgot Password link opens the recovery page",
        GROUP,
        Site::Loan,
        link_opens_recovery,
    ),
    Scenario::new(
        "TC_FP_003",
        "Registered cell and ID number receive a reset",
        GROUP,
        Site::Loan,
        registered_account_succeeds,
    ),
    Scenario::new(
        "TC_FP_004",
        "Unregistered cell and ID number show an error",
        GROUP,
        Site::Loan,
        unregistered_account_fails,
    ),
    Scenario::new(
        "TC_FP_005",
        "Empty submission shows a validation error",
        GROUP,
        Site::Loan,
        empty_submission_fails,
    ),
    Scenario::new(
        "TC_FP_007",
        "Back link returns to the login page",
        GROUP,
        Site::Loan,
        back_to_login,
    ),
];

fn is_login_url(url: &str) -> bool {
    let url = url.to_lowercase();
    url.contains("/account/login") || url.contains("/uat1/login") || url.ends_with("/login")
}

fn link_opens_recovery(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let page = ForgotPasswordPage::new(ctx.session(), &ctx.config().loan);
        page.goto_login().await?;
        ctx.capture("01-login-page").await?;

        ctx.session()
            .wait_visible(&page.forgot_link, ctx.session().timeouts().success())
            .await?;
        ctx.capture("02-forgot-link-visible").await?;

        page.open_from_login().await?;
        ctx.capture("03-after-click-forgot-link").await?;

        page.expect_form_visible().await?;
        ctx.capture("04-forgot-password-fields-visible").await.map(drop)
    })
}

fn registered_account_succeeds(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let site = &ctx.config().loan;
        let Some((cell, id_number)) = site.registered_account() else {
            return Err(FlowError::skipped(
                "set FP_VALID_CELL and FP_VALID_ID to a registered account",
            ));
        };

        let page = ForgotPasswordPage::new(ctx.session(), site);
        page.goto_forgot_password().await?;
        ctx.capture("01-forgot-password-page").await?;

        page.fill(cell, id_number).await?;
        ctx.capture("02-fields-filled").await?;

        page.submit().await?;
        ctx.session().wait_for_load(LoadState::DomContentLoaded).await?;
        ctx.capture("03-after-submit").await?;

        page.expect_success().await?;
        ctx.capture("04-success-message").await.map(drop)
    })
}

fn unregistered_account_fails(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let page = ForgotPasswordPage::new(ctx.session(), &ctx.config().loan);
        page.goto_forgot_password().await?;
        ctx.capture("01-forgot-password-page").await?;

        page.fill(UNREGISTERED_CELL, INVALID_ID_NUMBER).await?;
        ctx.capture("02-fields-filled-invalid").await?;

        page.submit().await?;
        ctx.session().wait_for_load(LoadState::DomContentLoaded).await?;
        ctx.capture("03-after-submit").await?;

        page.expect_error().await?;
        ctx.capture("04-error-message").await.map(drop)
    })
}

fn empty_submission_fails(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let page = ForgotPasswordPage::new(ctx.session(), &ctx.config().loan);
        page.goto_forgot_password().await?;
        ctx.capture("01-forgot-password-page").await?;

        ctx.session()
            .wait_visible(&page.next_button, ctx.session().timeouts().action())
            .await?;
        ctx.capture("02-fields-empty").await?;

        page.submit().await?;
        ctx.session().pause(VALIDATION_SETTLE).await;
        ctx.capture("03-after-submit").await?;

        page.expect_error().await?;
        ctx.session()
            .expect_page()
            .to_have_url(&page.url_pattern())
            .await?;
        ctx.capture("04-validation-error-shown").await.map(drop)
    })
}

fn back_to_login(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let page = ForgotPasswordPage::new(ctx.session(), &ctx.config().loan);
        page.goto_forgot_password().await?;
        ctx.capture("01-forgot-password-page").await?;

        ctx.session()
            .wait_visible(&page.back_link, ctx.session().timeouts().action())
            .await?;
        ctx.capture("02-back-link-visible").await?;

        page.back_to_login().await?;
        ctx.capture("03-after-back-click").await?;

        let url = ctx.session().url().await?;
        if !is_login_url(&url) {
            return Err(FlowError::assertion("login page URL", url));
        }
        ctx.capture("04-login-page-confirmed").await.map(drop)
    })
}
