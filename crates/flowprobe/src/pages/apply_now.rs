//! Loan site "Apply Now" multi-step application.

use crate::data::{ContactDetails, EmploymentDetails};
use crate::dropdown::SelectOutcome;
use crate::locator::{FieldRef, Strategy};
use crate::page_object::PageObject;
use crate::resolver::Requirement;
use crate::result::FlowResult;
use crate::session::Session;
use crate::wait::{LoadState, UrlPattern};
use tracing::{debug, info};

/// Application form: contact step, employment step, submit
#[derive(Debug, Clone)]
pub struct ApplyNowPage {
    session: Session,
    /// Entry point on the home page
    pub apply_now_button: FieldRef,
    /// Mobile number input
    pub mobile_number: FieldRef,
    /// E-mail input
    pub email: FieldRef,
    /// Employment status dropdown
    pub employment_status: FieldRef,
    /// Employer name input
    pub employer_name: FieldRef,
    /// Gross monthly income
    pub gross_income: FieldRef,
    /// Net monthly income
    pub net_income: FieldRef,
    /// Salary day input or dropdown
    pub salary_day: FieldRef,
    /// Next / Continue
    pub next_button: FieldRef,
    /// Back / Previous
    pub back_button: FieldRef,
    /// Final submit
    pub submit_button: FieldRef,
    /// Confirmation after submit
    pub success_message: FieldRef,
    /// Field-level validation messages
    pub validation_errors: FieldRef,
}

impl ApplyNowPage {
    /// Application pages reached through `session`
    #[must_use]
    pub fn new(session: &Session) -> Self {
        Self {
            session: session.clone(),
            apply_now_button: FieldRef::new("apply now")
                .or(Strategy::text("a", "Apply Now"))
                .or(Strategy::text("button", "Apply Now"))
                .or(Strategy::text("a", "Apply"))
                .or(Strategy::text("button", "Apply")),
            mobile_number: FieldRef::new("mobile number")
                .or(Strategy::attr_icontains("name", "mobile").tagged("input"))
                .or(Strategy::attr_icontains("name", "phone").tagged("input"))
                .or(Strategy::attr_icontains("name", "cell").tagged("input"))
                .or(Strategy::attr_icontains("id", "mobile").tagged("input"))
                .or(Strategy::attr_icontains("placeholder", "mobile").tagged("input"))
                .or(Strategy::attr_icontains("placeholder", "cell").tagged("input")),
            email: FieldRef::new("email")
                .or(Strategy::input_type("email"))
                .or(Strategy::attr_icontains("name", "email").tagged("input"))
                .or(Strategy::attr_icontains("id", "email").tagged("input")),
            employment_status: FieldRef::new("employment status")
                .or(Strategy::attr_icontains("name", "employment").tagged("select"))
                .or(Strategy::attr_icontains("id", "employment").tagged("select"))
                .or(Strategy::role("combobox").and(Strategy::attr_icontains("aria-label", "employment"))),
            employer_name: FieldRef::new("employer name")
                .or(Strategy::attr_icontains("name", "employer").tagged("input"))
                .or(Strategy::attr_icontains("id", "employer").tagged("input"))
                .or(Strategy::attr_icontains("placeholder", "employer").tagged("input")),
            gross_income: FieldRef::new("gross income")
                .or(Strategy::attr_icontains("name", "gross").tagged("input"))
                .or(Strategy::attr_icontains("id", "gross").tagged("input"))
                .or(Strategy::attr_icontains("placeholder", "gross").tagged("input")),
            net_income: FieldRef::new("net income")
                .or(Strategy::attr_icontains("name", "net").tagged("input"))
                .or(Strategy::attr_icontains("name", "nett").tagged("input"))
                .or(Strategy::attr_icontains("id", "net").tagged("input"))
                .or(Strategy::attr_icontains("placeholder", "net").tagged("input")),
            salary_day: FieldRef::new("salary day")
                .or(Strategy::attr_icontains("name", "salary").tagged("input"))
                .or(Strategy::attr_icontains("name", "salary").tagged("select"))
                .or(Strategy::attr_icontains("id", "salaryDay").tagged("input")),
            next_button: FieldRef::new("next")
                .or(Strategy::text("button", "Next"))
                .or(Strategy::text("button", "Continue"))
                .or(Strategy::attr_eq("value", "Next").tagged("input")),
            back_button: FieldRef::new("back")
                .or(Strategy::text("button", "Back"))
                .or(Strategy::text("button", "Previous")),
            submit_button: FieldRef::new("submit application")
                .or(Strategy::button_type("submit").and(Strategy::any_text("Submit")))
                .or(Strategy::text("button", "Submit Application"))
                .or(Strategy::text("button", "Apply")),
            success_message: FieldRef::new("application success")
                .or(Strategy::attr_contains("class", "success"))
                .or(Strategy::role("alert").and(Strategy::any_text("success")))
                .or(Strategy::text("h1", "Thank"))
                .or(Strategy::text("h2", "Thank")),
            validation_errors: FieldRef::new("validation errors")
                .or(Strategy::attr_contains("class", "invalid"))
                .or(Strategy::attr_contains("class", "field-error"))
                .or(Strategy::class("error-message"))
                .or(Strategy::attr_contains("class", "error").tagged("span")),
        }
    }

    /// Click Apply Now and wait for the form document
    pub async fn click_apply_now(&self) -> FlowResult<()> {
        self.session.click(&self.apply_now_button).await?;
        self.session.wait_for_load(LoadState::DomContentLoaded).await
    }

    /// Fill mobile then e-mail
    pub async fn fill_contact_details(&self, contact: &ContactDetails) -> FlowResult<()> {
        info!(mobile = %contact.mobile, email = %contact.email, "contact details");
        self.session
            .wait_visible(&self.mobile_number, self.session.timeouts().action())
            .await?;
        self.session.fill(&self.mobile_number, &contact.mobile).await?;
        self.session.fill(&self.email, &contact.email).await
    }

    /// Fill the employment step; absent values leave their field untouched
    pub async fn fill_employment_details(&self, employment: &EmploymentDetails) -> FlowResult<Option<SelectOutcome>> {
        let mut selected = None;
        if let Some(status) = &employment.status {
            selected = Some(self.session.select_option(&self.employment_status, status).await?);
        }
        if let Some(employer) = &employment.employer {
            self.session.fill(&self.employer_name, employer).await?;
        }
        if let Some(gross) = &employment.gross_income {
            self.fill_gross_income(gross).await?;
        }
        if let Some(net) = &employment.net_income {
            self.session.fill(&self.net_income, net).await?;
        }
        if let Some(day) = &employment.salary_day {
            self.fill_salary_day(day).await?;
        }
        Ok(selected)
    }

    async fn fill_salary_day(&self, day: &str) -> FlowResult<()> {
        let resolution = self
            .session
            .resolve(&self.salary_day, Requirement::Visible, self.session.timeouts().action())
            .await?;
        let dom = self.session.snapshot().await?;
        if dom.get(resolution.node).is_some_and(|el| el.tag == "select") {
            debug!("salary day is a dropdown");
            self.session.select_option(&self.salary_day, day).await.map(drop)
        } else {
            self.session.fill(&self.salary_day, day).await
        }
    }

    /// Fill gross income only
    pub async fn fill_gross_income(&self, gross: &str) -> FlowResult<()> {
        self.session.fill(&self.gross_income, gross).await
    }

    /// Next / Continue
    pub async fn click_next(&self) -> FlowResult<()> {
        self.session.click(&self.next_button).await
    }

    /// Back / Previous
    pub async fn click_back(&self) -> FlowResult<()> {
        self.session.click(&self.back_button).await
    }

    /// Final submit
    pub async fn click_submit(&self) -> FlowResult<()> {
        self.session
            .wait_visible(&self.submit_button, self.session.timeouts().action())
            .await?;
        self.session.click(&self.submit_button).await
    }

    /// Success indicator within the success bound
    pub async fn expect_success(&self) -> FlowResult<()> {
        self.session
            .expect(&self.success_message)
            .within(self.session.timeouts().success())
            .to_be_visible()
            .await
    }

    /// At least one validation message becomes visible
    pub async fn expect_validation_errors(&self) -> FlowResult<()> {
        self.session.expect(&self.validation_errors).to_be_visible().await
    }

    /// No validation message is visible
    pub async fn expect_no_validation_errors(&self) -> FlowResult<()> {
        self.session.expect(&self.validation_errors).to_have_visible_count(0).await
    }

    /// Employment status becomes visible after the contact step
    pub async fn wait_for_employment_step(&self) -> FlowResult<()> {
        self.session
            .wait_visible(&self.employment_status, self.session.timeouts().action())
            .await
            .map(drop)
    }

    /// Submit becomes visible after the employment step
    pub async fn wait_for_review_step(&self) -> FlowResult<()> {
        self.session
            .wait_visible(&self.submit_button, self.session.timeouts().action())
            .await
            .map(drop)
    }

    /// Mobile and e-mail inputs are visible
    pub async fn expect_contact_step(&self) -> FlowResult<()> {
        self.session.expect(&self.mobile_number).to_be_visible().await?;
        self.session.expect(&self.email).to_be_visible().await
    }

    /// Status, gross and net income are visible
    pub async fn expect_employment_step(&self) -> FlowResult<()> {
        self.session.expect(&self.employment_status).to_be_visible().await?;
        self.session.expect(&self.gross_income).to_be_visible().await?;
        self.session.expect(&self.net_income).to_be_visible().await
    }
}

impl PageObject for ApplyNowPage {
    fn page_name(&self) -> &'static str {
        "apply now"
    }

    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::Regex("(?i)apply|application|loan".into())
    }

    fn landmarks(&self) -> Vec<&FieldRef> {
        vec![&self.mobile_number, &self.email]
    }
}
