//! Storefront account registration.

use crate::config::StoreConfig;
use crate::data::Registration;
use crate::locator::{FieldRef, Strategy};
use crate::page_object::PageObject;
use crate::result::{FlowError, FlowResult};
use crate::session::Session;
use crate::wait::{LoadState, UrlPattern};
use regex::Regex;
use tracing::info;

/// Path fragment of the registration page
pub const REGISTER_PATH: &str = "/account/register";

fn customer_input(attribute: &str) -> Strategy {
    Strategy::attr_eq("name", format!("customer[{attribute}]")).tagged("input")
}

/// `form#create_customer` and the account links around it
#[derive(Debug, Clone)]
pub struct RegisterPage {
    session: Session,
    url: String,
    /// The registration form
    pub form: FieldRef,
    /// First name
    pub first_name: FieldRef,
    /// Last name
    pub last_name: FieldRef,
    /// E-mail
    pub email: FieldRef,
    /// Password
    pub password: FieldRef,
    /// Submit control inside the form
    pub submit_button: FieldRef,
    /// Theme error container
    pub error_messages: FieldRef,
    /// Link to the login page
    pub sign_in_link: FieldRef,
    /// Link only rendered for a signed-in customer
    pub sign_out_link: FieldRef,
}

impl RegisterPage {
    /// Registration page of `store`
    #[must_use]
    pub fn new(session: &Session, store: &StoreConfig) -> Self {
        let form = Strategy::id("create_customer").tagged("form");
        Self {
            session: session.clone(),
            url: store.register_url(),
            form: FieldRef::new("registration form").or(form.clone()),
            first_name: FieldRef::new("first name").or(customer_input("first_name")),
            last_name: FieldRef::new("last name").or(customer_input("last_name")),
            email: FieldRef::new("email").or(customer_input("email")),
            password: FieldRef::new("password").or(customer_input("password")),
            submit_button: FieldRef::new("create account").or(Strategy::within(form, Strategy::input_type("submit"))),
            error_messages: FieldRef::new("registration errors")
                .or(Strategy::class("errors"))
                .or(Strategy::class("notice--error"))
                .or(Strategy::attr_contains("class", "error_message")),
            sign_in_link: FieldRef::new("sign in link")
                .or(Strategy::attr_contains("href", "login").tagged("a"))
                .or(Strategy::attr_contains("href", "sign_in").tagged("a")),
            sign_out_link: FieldRef::new("sign out link")
                .or(Strategy::attr_contains("href", "logout").tagged("a"))
                .or(Strategy::attr_contains("href", "sign_out").tagged("a")),
        }
    }

    /// Open the registration page and wait for the form
    pub async fn goto(&self) -> FlowResult<()> {
        self.session
            .goto_until(&self.url, LoadState::DomContentLoaded)
            .await?;
        self.session.expect(&self.form).to_be_visible().await
    }

    /// Fill the given fields; `None` fields stay blank
    pub async fn fill(&self, registration: &Registration) -> FlowResult<()> {
        info!(email = ?registration.email, "registration details");
        let pairs = [
            (&self.first_name, &registration.first_name),
            (&self.last_name, &registration.last_name),
            (&self.email, &registration.email),
            (&self.password, &registration.password),
        ];
        for (field, value) in pairs {
            if let Some(value) = value {
                self.session.fill(field, value).await?;
            }
        }
        Ok(())
    }

    /// Submit the form natively, skipping the theme's click interceptor
    pub async fn submit_form(&self) -> FlowResult<()> {
        self.session.submit_form(&self.form).await?;
        self.session.wait_for_load(LoadState::Load).await
    }

    /// Fill then submit
    pub async fn register(&self, registration: &Registration) -> FlowResult<()> {
        self.fill(registration).await?;
        self.submit_form().await
    }

    /// A sign-out link is visible
    pub async fn is_signed_in(&self) -> FlowResult<bool> {
        self.session.is_visible(&self.sign_out_link).await
    }

    /// The theme error container is visible
    pub async fn error_visible(&self) -> FlowResult<bool> {
        self.session.is_visible(&self.error_messages).await
    }

    /// Visible page text matches `pattern` (case-insensitive)
    pub async fn text_visible(&self, pattern: &str) -> FlowResult<bool> {
        let re = Regex::new(&format!("(?i){pattern}"))
            .map_err(|e| FlowError::config(format!("bad text pattern /{pattern}/: {e}")))?;
        Ok(re.is_match(&self.session.page_text().await?))
    }

    /// Still on the registration URL
    pub async fn on_register_page(&self) -> FlowResult<bool> {
        Ok(self.session.url().await?.contains(REGISTER_PATH))
    }

    /// `type` attribute of the password input
    pub async fn password_input_type(&self) -> FlowResult<Option<String>> {
        self.session.attribute(&self.password, "type").await
    }

    /// Follow the sign-in link
    pub async fn sign_in(&self) -> FlowResult<()> {
        self.session.click(&self.sign_in_link).await?;
        self.session.wait_for_load(LoadState::Load).await
    }

    /// Every input and the submit control are visible
    pub async fn expect_form_visible(&self) -> FlowResult<()> {
        for field in [&self.first_name, &self.last_name, &self.email, &self.password, &self.submit_button] {
            self.session.expect(field).to_be_visible().await?;
        }
        Ok(())
    }
}

impl PageObject for RegisterPage {
    fn page_name(&self) -> &'static str {
        "register"
    }

    fn url_pattern(&self) -> UrlPattern {
        UrlPattern::Contains(REGISTER_PATH.into())
    }

    fn landmarks(&self) -> Vec<&FieldRef> {
        vec![&self.form]
    }
}
