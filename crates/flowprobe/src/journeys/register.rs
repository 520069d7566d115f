//! Storefront registration journeys TC001 to TC013.
//!
//! TC002, TC003, TC008 and TC012 document storefront behaviour rather than
//! assert it: what they see is recorded as observations.

use crate::data::{unique_email, Registration, WEAK_PASSWORD};
use crate::pages::{RegisterPage, REGISTER_PATH};
use crate::result::{FlowError, FlowResult};
use crate::scenario::{Scenario, ScenarioContext, Site};
use crate::wait::UrlPattern;
use futures::future::BoxFuture;

const GROUP: &str = "Account registration";

/// Text the storefront shows for a duplicate e-mail
const DUPLICATE_TEXT: &str = "already|taken|registered";
/// Text the storefront shows for a weak password
const WEAK_PASSWORD_TEXT: &str = "short|length|minimum|password";

pub(super) const SCENARIOS: [Scenario; 13] = [
    Scenario::new("TC001", "Registration with valid data", GROUP, Site::Store, valid_registration),
    Scenario::new("TC002", "Registration with blank first name", GROUP, Site::Store, blank_first_name),
    Scenario::new("TC003", "Registration with blank last name", GROUP, Site::Store, blank_last_name),
    Scenario::new("TC004", "Registration with blank email", GROUP, Site::Store, blank_email),
    Scenario::new("TC005", "Registration with invalid email format", GROUP, Site::Store, invalid_email),
    Scenario::new("TC006", "Registration with blank password", GROUP, Site::Store, blank_password),
    Scenario::new("TC007", "Registration with an already registered email", GROUP, Site::Store, duplicate_email),
    Scenario::new("TC008", "Registration with a five character password", GROUP, Site::Store, weak_password),
    Scenario::new("TC009", "All fields blank", GROUP, Site::Store, all_blank),
    Scenario::new("TC010", "Password field masks input", GROUP, Site::Store, password_masked),
    Scenario::new("TC011", "Page title and form fields are present", GROUP, Site::Store, form_present),
    Scenario::new("TC012", "Special characters in first name", GROUP, Site::Store, special_first_name),
    Scenario::new("TC013", "Sign-in link opens the login page", GROUP, Site::Store, sign_in_link),
];

async fn open(ctx: &ScenarioContext) -> FlowResult<RegisterPage> {
    let page = RegisterPage::new(ctx.session(), &ctx.config().store);
    page.goto().await?;
    Ok(page)
}

/// Fill, capture, submit, capture
async fn submit_with_evidence(
    ctx: &ScenarioContext,
    page: &RegisterPage,
    registration: &Registration,
) -> FlowResult<()> {
    page.fill(registration).await?;
    ctx.capture("01-form-filled").await?;
    page.submit_form().await?;
    ctx.capture("02-after-submit").await.map(drop)
}

/// Submit `registration` and require that no customer session exists afterwards
async fn rejected(ctx: &ScenarioContext, registration: Registration) -> FlowResult<()> {
    let page = open(ctx).await?;
    submit_with_evidence(ctx, &page, &registration).await?;
    if page.is_signed_in().await? {
        return Err(FlowError::assertion("no customer session", "signed in"));
    }
    Ok(())
}

/// Submit `registration` and record what the storefront did
async fn documented(ctx: &ScenarioContext, registration: Registration) -> FlowResult<()> {
    let page = open(ctx).await?;
    submit_with_evidence(ctx, &page, &registration).await?;
    ctx.observe("error visible", page.error_visible().await?);
    ctx.observe("on register page", page.on_register_page().await?);
    Ok(())
}

fn valid_registration(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let page = open(ctx).await?;
        submit_with_evidence(ctx, &page, &Registration::valid(unique_email("tuang"))).await?;
        ctx.session()
            .expect_page()
            .not_to_have_url(&UrlPattern::Contains(REGISTER_PATH.into()))
            .await
            .map(drop)
    })
}

fn blank_first_name(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(documented(
        ctx,
        Registration::valid(unique_email("blank-fn")).with_first_name(None),
    ))
}

fn blank_last_name(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(documented(
        ctx,
        Registration::valid(unique_email("blank-ln")).with_last_name(None),
    ))
}

fn blank_email(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(rejected(ctx, Registration::valid("").with_email(None)))
}

fn invalid_email(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(rejected(ctx, Registration::valid("tuang@test")))
}

fn blank_password(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(rejected(
        ctx,
        Registration::valid(unique_email("blank-pw")).with_password(None),
    ))
}

fn duplicate_email(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let registration = Registration::valid(unique_email("duplicate"));
        let page = open(ctx).await?;
        page.register(&registration).await?;
        ctx.capture("01-first-registration").await?;
        ctx.require(
            !page.on_register_page().await?,
            "first registration did not complete, duplicate cannot be attempted",
        )?;

        page.goto().await?;
        page.register(&registration).await?;
        ctx.capture("02-duplicate-attempt").await?;

        let rejected = page.error_visible().await?
            || page.text_visible(DUPLICATE_TEXT).await?
            || ctx.session().url().await?.contains("register");
        if rejected {
            Ok(())
        } else {
            Err(FlowError::assertion(
                "duplicate email rejected",
                ctx.session().url().await?,
            ))
        }
    })
}

fn weak_password(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let page = open(ctx).await?;
        let registration = Registration::valid(unique_email("weak-pw")).with_password(Some(WEAK_PASSWORD));
        submit_with_evidence(ctx, &page, &registration).await?;

        let error = page.error_visible().await? || page.text_visible(WEAK_PASSWORD_TEXT).await?;
        let url = ctx.session().url().await?;
        ctx.observe("error visible", error);
        ctx.observe("registered", !url.contains("register") && !error);
        Ok(())
    })
}

fn all_blank(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let page = open(ctx).await?;
        ctx.capture("01-all-blank").await?;
        page.submit_form().await?;
        ctx.capture("02-after-submit").await?;
        if page.is_signed_in().await? {
            return Err(FlowError::assertion("no customer session", "signed in"));
        }
        Ok(())
    })
}

fn password_masked(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let page = open(ctx).await?;
        ctx.session().fill(&page.password, WEAK_PASSWORD).await?;
        ctx.capture("01-password-typed").await?;
        ctx.session()
            .expect(&page.password)
            .to_have_attribute("type", "password")
            .await
    })
}

fn form_present(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let page = open(ctx).await?;
        ctx.capture("01-page-loaded").await?;
        ctx.session().expect_page().to_have_title(".+").await?;
        page.expect_form_visible().await
    })
}

fn special_first_name(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(documented(
        ctx,
        Registration::valid(unique_email("special-fn")).with_first_name(Some("Tu@ng!")),
    ))
}

fn sign_in_link(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let page = open(ctx).await?;
        ctx.capture("01-register-page").await?;
        ctx.session().expect(&page.sign_in_link).to_be_visible().await?;
        page.sign_in().await?;
        ctx.capture("02-after-click-signin").await?;
        ctx.session()
            .expect_page()
            .to_have_url(&UrlPattern::Regex("(?i)/account/login|/account/sign_in".into()))
            .await
            .map(drop)
    })
}

