//! Loan site password recovery.

use crate::config::LoanSiteConfig;
use crate::locator::{FieldRef, Strategy};
use crate::page_object::PageObject;
use crate::result::FlowResult;
use crate::session::Session;
use crate::wait::{LoadState, UrlPattern};
use tracing::info;

/// Forgot-password form: cell number and ID number
#[derive(Debug, Clone)]
pub struct ForgotPasswordPage {
    session: Session,
    landing_url: String,
    forgot_url: String,
    /// "Forgot password" link on the login page
    pub forgot_link: FieldRef,
    /// Cell number input
    pub cell_number: FieldRef,
    /// ID number input
    pub id_number: FieldRef,
    /// Next / submit button
    pub next_button: FieldRef,
    /// Link back to the login page
    pub back_link: FieldRef,
    /// Server or client validation message
    pub error_message: FieldRef,
    /// Confirmation that a reset was sent
    pub success_message: FieldRef,
}

impl ForgotPasswordPage {
    /// Recovery pages of `site`
    #[must_use]
    pub fn new(session: &Session, site: &LoanSiteConfig) -> Self {
        Self {
            session: session.clone(),
            landing_url: site.landing_url(),
            forgot_url: site.forgot_password_url(),
            forgot_link: FieldRef::new("forgot password link")
                .or(Strategy::attr_contains("href", "ForgotPassword").tagged("a")),
            cell_number: FieldRef::new("cell number").or(Strategy::id("txtCellNumber")),
            id_number: FieldRef::new("ID number").or(Strategy::id("txtIDNumber")),
            next_button: FieldRef::new("next button")
                .or(Strategy::button_type("submit").and(Strategy::any_text("Next"))),
            back_link: FieldRef::new("back to login")
                .or(Strategy::attr_contains("href", "/uat1/login").tagged("a"))
                .or(Strategy::text("a", "Back")),
            error_message: FieldRef::new("recovery error")
                .or(Strategy::class("validation-summary-errors"))
                .or(Strategy::attr_present("data-valmsg-for"))
                .or(Strategy::class("field-validation-error"))
                .or(Strategy::attr_icontains("class", "error").and(Strategy::not(Strategy::tag("script"))))
                .or(Strategy::role("alert")),
            success_message: FieldRef::new("reset sent")
                .or(Strategy::attr_icontains("class", "success"))
                .or(Strategy::text("p", "sent"))
                .or(Strategy::text("p", "reset"))
                .or(Strategy::text("div", "reset link"))
                .or(Strategy::class("alert-success")),
        }
    }

    /// Customer landing page, which shows the login form
    pub async fn goto_login(&self) -> FlowResult<()> {
        self.session
            .goto_until(&self.landing_url, LoadState::DomContentLoaded)
            .await
    }

    /// Forgot-password page directly
    pub async fn goto_forgot_password(&self) -> FlowResult<()> {
        self.session
            .goto_until(&self.forgot_url, LoadState::DomContentLoaded)
            .await
    }

    /// Follow the forgot-password link from the login page
    pub async fn open_from_login(&self) -> FlowResult<()> {
        self.session
            .wait_visible(&self.forgot_link, self.session.timeouts().success())
            .await?;
        self.session.click(&self.forgot_link).await?;
        self.session.wait_for_load(LoadState::DomContentLoaded).await?;
        self.session
            .expect_page()
            .to_have_url(&self.url_pattern())
            .await
            .map(drop)
    }

    /// Fill cell and ID numbers
    pub async fn fill(&self, cell: &str, id_number: &str) -> FlowResult<()> {
        info!(cell, "recovery details");
        self.session.fill(&self.cell_number, cell).await?;
        self.session.fill(&self.id_number, id_number).await
    }

    /// Click Next
    pub async fn submit(&self) -> FlowResult<()> {
        self.session.click(&self.next_button).await
    }

    /// Follow the back link
    pub async fn back_to_login(&self) -> FlowResult<()> {
        self.session.click(&self.back_link).await?;
        self.session.wait_for_load(LoadState::DomContentLoaded).await
    }

    /// An error becomes visible within the assertion bound
    pub async fn expect_error(&self) -> FlowResult<()> {
        self.session.expect(&self.error_message).to_be_visible().await
    }

    /// A success message becomes visible within the success bound
    pub async fn expect_success(&self) -> FlowResult<()> {
        self.session
            .expect(&self.success_message)
            .within(self.session.timeouts().success())
            .to_be_visible()
            .await
    }

    /// Both inputs become visible
    pub async fn expect_form_visible(&self) -> FlowResult<()> {
        self.session.expect(&self.cell_number).to_be_visible().await?;
        self.session.expect(&self.id_number).to_be_visible().await
    }
}

impl PageObject for ForgotPasswordPage {
    fn page_name(&self) -> &'static str {
        "forgot password"
    }

    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::ContainsIgnoreCase("forgotpassword".into())
    }

    fn landmarks(&self) -> Vec<&FieldRef> {
        vec![&self.cell_number, &self.id_number]
    }
}
