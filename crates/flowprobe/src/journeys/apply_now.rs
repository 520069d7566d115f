//! Apply Now journeys. Every one starts from a fresh login.

use super::auth::login_as_test_user;
use crate::data::{ContactDetails, EmploymentDetails};
use crate::page_object::PageObject;
use crate::pages::ApplyNowPage;
use crate::result::{FlowError, FlowResult};
use crate::scenario::{Scenario, ScenarioContext, Site};
use futures::future::BoxFuture;

const ENTRY: &str = "Apply Now: entry point";
const CONTACT: &str = "Apply Now: contact details";
const EMPLOYMENT: &str = "Apply Now: employment and income";
const HAPPY_PATH: &str = "Apply Now: full submission";
const ACCESSIBILITY: &str = "Apply Now: accessibility and UI";

/// Mobile viewport used for the responsive check
const MOBILE_VIEWPORT: (u32, u32) = (375, 812);

pub(super) const SCENARIOS: [Scenario; 19] = [
    Scenario::new("apply-entry-visible", "Apply Now is shown after login", ENTRY, Site::Loan, entry_visible),
    Scenario::new("apply-entry-navigates", "Apply Now opens the application form", ENTRY, Site::Loan, entry_navigates),
    Scenario::new("apply-contact-fields", "Contact fields are shown", CONTACT, Site::Loan, contact_fields),
    Scenario::new("apply-contact-valid", "Valid SA mobile and email advance", CONTACT, Site::Loan, contact_valid),
    Scenario::new("apply-contact-short-mobile", "Short mobile number is rejected", CONTACT, Site::Loan, contact_short_mobile),
    Scenario::new("apply-contact-bad-email", "Malformed email is rejected", CONTACT, Site::Loan, contact_bad_email),
    Scenario::new("apply-contact-empty", "Empty contact fields are rejected", CONTACT, Site::Loan, contact_empty),
    Scenario::new("apply-contact-bad-prefix", "Mobile not starting with 0 or +27 is rejected", CONTACT, Site::Loan, contact_bad_prefix),
    Scenario::new("apply-employment-fields", "Employment and income fields are shown", EMPLOYMENT, Site::Loan, employment_fields),
    Scenario::new("apply-employment-valid", "Permanent employment details advance", EMPLOYMENT, Site::Loan, employment_valid),
    Scenario::new("apply-employment-no-status", "Employment status is required", EMPLOYMENT, Site::Loan, employment_no_status),
    Scenario::new("apply-employment-zero-gross", "Gross income must be above zero", EMPLOYMENT, Site::Loan, employment_zero_gross),
    Scenario::new("apply-employment-net-above-gross", "Net income above gross is rejected", EMPLOYMENT, Site::Loan, employment_net_above_gross),
    Scenario::new("apply-employment-non-numeric", "Non-numeric income is rejected", EMPLOYMENT, Site::Loan, employment_non_numeric),
    Scenario::new("apply-employment-back", "Back returns to contact details", EMPLOYMENT, Site::Loan, employment_back),
    Scenario::new("apply-happy-path", "Valid application is submitted end to end", HAPPY_PATH, Site::Loan, happy_path),
    Scenario::new("apply-a11y-labels", "Every form control has an accessible label", ACCESSIBILITY, Site::Loan, labelled_controls),
    Scenario::new("apply-a11y-title", "Page title is set", ACCESSIBILITY, Site::Loan, title_set),
    Scenario::new("apply-a11y-mobile", "Contact form is visible on a mobile viewport", ACCESSIBILITY, Site::Loan, mobile_viewport),
];

/// Login, then Apply Now
async fn open_application(ctx: &ScenarioContext) -> FlowResult<ApplyNowPage> {
    login_as_test_user(ctx).await?;
    let apply = ApplyNowPage::new(ctx.session());
    apply.click_apply_now().await?;
    Ok(apply)
}

/// Login, Apply Now, valid contact details, Next
async fn open_employment_step(ctx: &ScenarioContext) -> FlowResult<ApplyNowPage> {
    let apply = open_application(ctx).await?;
    apply.fill_contact_details(&ContactDetails::valid()).await?;
    apply.click_next().await?;
    apply.wait_for_employment_step().await?;
    Ok(apply)
}

async fn contact_rejected(ctx: &ScenarioContext, contact: ContactDetails) -> FlowResult<()> {
    let apply = open_application(ctx).await?;
    apply.fill_contact_details(&contact).await?;
    apply.click_next().await?;
    apply.expect_validation_errors().await?;
    apply.expect_contact_step().await?;
    ctx.capture("01-validation-error").await.map(drop)
}

async fn employment_rejected(ctx: &ScenarioContext, employment: EmploymentDetails) -> FlowResult<()> {
    let apply = open_employment_step(ctx).await?;
    apply.fill_employment_details(&employment).await?;
    apply.click_next().await?;
    apply.expect_validation_errors().await?;
    apply.expect_employment_step().await?;
    ctx.capture("01-validation-error").await.map(drop)
}

fn entry_visible(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        login_as_test_user(ctx).await?;
        let apply = ApplyNowPage::new(ctx.session());
        ctx.session().expect(&apply.apply_now_button).to_be_visible().await
    })
}

fn entry_navigates(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let apply = open_application(ctx).await?;
        ctx.session()
            .expect_page()
            .to_have_url(&apply.url_pattern())
            .await?;
        ctx.capture("01-application-form").await.map(drop)
    })
}

fn contact_fields(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let apply = open_application(ctx).await?;
        apply.expect_contact_step().await
    })
}

fn contact_valid(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let apply = open_application(ctx).await?;
        apply.fill_contact_details(&ContactDetails::valid()).await?;
        apply.click_next().await?;
        apply.wait_for_employment_step().await?;
        apply.expect_no_validation_errors().await
    })
}

fn contact_short_mobile(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(contact_rejected(ctx, ContactDetails::valid().with_mobile("123")))
}

fn contact_bad_email(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(contact_rejected(ctx, ContactDetails::valid().with_email("not-an-email")))
}

fn contact_empty(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let apply = open_application(ctx).await?;
        apply.click_next().await?;
        apply.expect_validation_errors().await?;
        apply.expect_contact_step().await
    })
}

fn contact_bad_prefix(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(contact_rejected(ctx, ContactDetails::valid().with_mobile("9999999999")))
}

fn employment_fields(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let apply = open_employment_step(ctx).await?;
        apply.expect_employment_step().await
    })
}

fn employment_valid(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let apply = open_employment_step(ctx).await?;
        if let Some(selected) = apply.fill_employment_details(&EmploymentDetails::valid()).await? {
            ctx.observe("employment status selected via", selected.strategy);
        }
        apply.click_next().await?;
        apply.wait_for_review_step().await?;
        apply.expect_no_validation_errors().await
    })
}

fn employment_no_status(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(employment_rejected(
        ctx,
        EmploymentDetails::valid().without_status().without_salary_day(),
    ))
}

fn employment_zero_gross(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(employment_rejected(ctx, EmploymentDetails::valid().with_gross_income("0")))
}

fn employment_net_above_gross(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(employment_rejected(
        ctx,
        EmploymentDetails::valid()
            .with_gross_income("10000")
            .with_net_income("15000"),
    ))
}

fn employment_non_numeric(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let apply = open_employment_step(ctx).await?;
        apply.fill_gross_income("abcde").await?;
        apply.click_next().await?;
        apply.expect_validation_errors().await?;
        apply.expect_employment_step().await
    })
}

fn employment_back(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let apply = open_employment_step(ctx).await?;
        apply.click_back().await?;
        ctx.session()
            .expect(&apply.mobile_number)
            .within(ctx.session().timeouts().action())
            .to_be_visible()
            .await
    })
}

fn happy_path(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let apply = open_application(ctx).await?;
        ctx.capture("01-application-form").await?;

        apply.fill_contact_details(&ContactDetails::valid()).await?;
        apply.click_next().await?;
        apply.wait_for_employment_step().await?;
        ctx.capture("02-employment-step").await?;

        apply.fill_employment_details(&EmploymentDetails::valid()).await?;
        apply.click_next().await?;
        apply.click_submit().await?;
        apply.expect_success().await?;
        ctx.capture("03-success").await.map(drop)
    })
}

fn labelled_controls(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        open_application(ctx).await?;
        let dom = ctx.session().snapshot().await?;
        let unlabelled = dom.unlabelled_controls();
        if unlabelled.is_empty() {
            return Ok(());
        }
        let names = unlabelled
            .iter()
            .map(|el| match el.id() {
                Some(id) => format!("{}#{id}", el.tag),
                None => format!("{} ({})", el.tag, el.node),
            })
            .collect::<Vec<_>>()
            .join(", ");
        Err(FlowError::assertion(
            "every form control has an accessible label",
            format!("unlabelled: {names}"),
        ))
    })
}

fn title_set(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        open_application(ctx).await?;
        ctx.session().expect_page().to_have_title(".+").await.map(drop)
    })
}

fn mobile_viewport(ctx: &ScenarioContext) -> BoxFuture<'_, FlowResult<()>> {
    Box::pin(async move {
        let apply = open_application(ctx).await?;
        let (width, height) = MOBILE_VIEWPORT;
        ctx.session().set_viewport(width, height).await?;
        apply.expect_contact_step().await?;
        ctx.capture("01-mobile-viewport").await.map(drop)
    })
}
