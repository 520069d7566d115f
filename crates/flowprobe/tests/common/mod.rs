//! Scripted loan site and storefront shared by the integration tests.

#![allow(dead_code)]

use flowprobe::{
    is_valid_email, is_valid_sa_mobile, DeviceProfile, FakeDom, FakeDriver, FakeElement, FlowResult,
    FnSessionFactory, LoanSiteConfig, NodeId, PageDriver, SessionFactory, Site, StoreConfig, SuiteConfig, TimeoutConfig,
};
use std::path::Path;
use std::sync::Arc;

pub const LOAN_BASE: &str = "https://loan.test/uat1";
pub const STORE_BASE: &str = "https://shop.test";

pub const REGISTERED_CELL: &str = "0821234567";
pub const REGISTERED_ID: &str = "8001015009087";

const SESSION_COOKIE: &str = "session";

/// Handlers behind the loan site's login form, recovery form and Next button
#[derive(Clone, Copy)]
pub struct LoanBehaviour {
    pub login: fn(&mut FakeDom),
    pub recovery: fn(&mut FakeDom),
    pub next: fn(&mut FakeDom),
}

impl Default for LoanBehaviour {
    fn default() -> Self {
        Self {
            login: check_login,
            recovery: check_recovery,
            next: next_step,
        }
    }
}

fn valid_login(dom: &FakeDom) -> bool {
    dom.value("username") == "testuser" && dom.value("password") == "testpass"
}

fn sign_in(dom: &mut FakeDom) {
    dom.set_cookie(SESSION_COOKIE, "testuser");
    dom.navigate("/uat1/Home");
}

fn check_login(dom: &mut FakeDom) {
    if valid_login(dom) {
        sign_in(dom);
    } else {
        dom.show("login-error");
    }
}

/// Signs in valid users and ignores everyone else without a message
pub fn login_never_reports(dom: &mut FakeDom) {
    if valid_login(dom) {
        sign_in(dom);
    }
}

fn login_form(dom: &mut FakeDom, with_forgot_link: bool, submit: fn(&mut FakeDom)) {
    dom.set_title("Login");
    let form = dom.add(FakeElement::new("form").id("login").on_submit(submit));
    dom.add_child(form, FakeElement::new("label").attr("for", "username").text("Username"));
    dom.add_child(
        form,
        FakeElement::new("input")
            .id("username")
            .attr("name", "username")
            .attr("type", "text"),
    );
    dom.add_child(form, FakeElement::new("label").attr("for", "password").text("Password"));
    dom.add_child(
        form,
        FakeElement::new("input")
            .id("password")
            .attr("name", "password")
            .attr("type", "password"),
    );
    dom.add_child(
        form,
        FakeElement::new("div")
            .id("login-error")
            .attr("class", "error")
            .text("Invalid username or password")
            .hidden(),
    );
    dom.add_child(form, FakeElement::new("button").attr("type", "submit").text("Login"));
    if with_forgot_link {
        dom.add(
            FakeElement::new("a")
                .attr("href", "/uat1/ForgotPassword")
                .text("Forgot Password?"),
        );
    }
}

fn recovery_fields_empty(dom: &FakeDom) -> bool {
    dom.value("txtCellNumber").trim().is_empty() || dom.value("txtIDNumber").trim().is_empty()
}

fn check_recovery(dom: &mut FakeDom) {
    let cell = dom.value("txtCellNumber");
    let id_number = dom.value("txtIDNumber");
    if recovery_fields_empty(dom) {
        dom.set_text("fp-error", "The Cell Number field is required.");
        dom.show("fp-error");
    } else if cell == REGISTERED_CELL && id_number == REGISTERED_ID {
        dom.hide("fp-error");
        dom.show("fp-success");
    } else {
        dom.set_text("fp-error", "We could not find an account with those details.");
        dom.show("fp-error");
    }
}

/// Sends an empty recovery form back to the login page instead of flagging it
pub fn recovery_leaves_when_empty(dom: &mut FakeDom) {
    if recovery_fields_empty(dom) {
        dom.navigate("/uat1/login");
    } else {
        check_recovery(dom);
    }
}

fn forgot_password(dom: &mut FakeDom, submit: fn(&mut FakeDom)) {
    dom.set_title("Forgot Password");
    let form = dom.add(FakeElement::new("form").on_submit(submit));
    dom.add_child(form, FakeElement::new("label").attr("for", "txtCellNumber").text("Cell number"));
    dom.add_child(form, FakeElement::new("input").id("txtCellNumber").attr("name", "CellNumber"));
    dom.add_child(form, FakeElement::new("label").attr("for", "txtIDNumber").text("ID number"));
    dom.add_child(form, FakeElement::new("input").id("txtIDNumber").attr("name", "IDNumber"));
    dom.add_child(
        form,
        FakeElement::new("span")
            .id("fp-error")
            .attr("class", "field-validation-error")
            .attr("data-valmsg-for", "CellNumber")
            .hidden(),
    );
    dom.add_child(form, FakeElement::new("button").attr("type", "submit").text("Next"));
    dom.add(
        FakeElement::new("div")
            .id("fp-success")
            .attr("class", "alert alert-success")
            .text("A reset link has been sent to your cell phone.")
            .hidden(),
    );
    dom.add(FakeElement::new("a").attr("href", "/uat1/login").text("Back"));
}

fn contact_problem(mobile: &str, email: &str) -> Option<&'static str> {
    if mobile.trim().is_empty() || email.trim().is_empty() {
        Some("Mobile number and email are required")
    } else if !is_valid_sa_mobile(mobile) {
        Some("Enter a valid South African mobile number")
    } else if !is_valid_email(email) {
        Some("Enter a valid email address")
    } else {
        None
    }
}

fn employment_problem(status: &str, gross: &str, net: &str) -> Option<&'static str> {
    if status.is_empty() {
        return Some("Select your employment status");
    }
    let Ok(gross) = gross.trim().parse::<u64>() else {
        return Some("Gross income must be a number");
    };
    let Ok(net) = net.trim().parse::<u64>() else {
        return Some("Net income must be a number");
    };
    if gross == 0 {
        Some("Gross income must be more than zero")
    } else if net > gross {
        Some("Net income cannot be more than gross income")
    } else {
        None
    }
}

fn reject(dom: &mut FakeDom, message: &str) {
    dom.set_text("form-error", message);
    dom.show("form-error");
}

fn step_problem(dom: &FakeDom) -> Option<&'static str> {
    if dom.is_visible("contact-step") {
        contact_problem(&dom.value("mobile"), &dom.value("email"))
    } else if dom.is_visible("employment-step") {
        employment_problem(&dom.value("status"), &dom.value("gross"), &dom.value("net"))
    } else {
        None
    }
}

fn advance(dom: &mut FakeDom) {
    if dom.is_visible("contact-step") {
        dom.hide("contact-step");
        dom.show("employment-step");
        dom.show("back");
    } else if dom.is_visible("employment-step") {
        dom.hide("employment-step");
        dom.hide("back");
        dom.hide("next");
        dom.show("review");
    }
}

fn next_step(dom: &mut FakeDom) {
    match step_problem(dom) {
        Some(message) => reject(dom, message),
        None => {
            dom.hide("form-error");
            advance(dom);
        }
    }
}

/// Next that neither validates nor moves
pub fn next_does_nothing(_dom: &mut FakeDom) {}

/// Next that moves on whatever was entered
pub fn next_skips_validation(dom: &mut FakeDom) {
    advance(dom);
}

/// Next that shows the validation message and moves on anyway
pub fn next_flags_then_advances(dom: &mut FakeDom) {
    if let Some(message) = step_problem(dom) {
        reject(dom, message);
    }
    advance(dom);
}

/// Next that works on the contact step and stalls on the employment step
pub fn next_stalls_after_contact(dom: &mut FakeDom) {
    if dom.is_visible("contact-step") {
        next_step(dom);
    }
}

fn labelled(dom: &mut FakeDom, parent: NodeId, id: &str, label: &str, control: FakeElement) {
    dom.add_child(parent, FakeElement::new("label").attr("for", id).text(label));
    dom.add_child(parent, control.id(id));
}

fn apply(dom: &mut FakeDom, next: fn(&mut FakeDom)) {
    dom.set_title("Apply for a loan");
    dom.add(FakeElement::new("h1").text("Loan application"));

    let contact = dom.add(FakeElement::new("div").id("contact-step"));
    labelled(dom, contact, "mobile", "Mobile number", FakeElement::new("input").attr("name", "MobileNumber"));
    labelled(
        dom,
        contact,
        "email",
        "Email address",
        FakeElement::new("input").attr("name", "Email").attr("type", "email"),
    );

    let employment = dom.add(FakeElement::new("div").id("employment-step").hidden());
    let status = FakeElement::new("select").attr("name", "EmploymentStatus");
    labelled(dom, employment, "status", "Employment status", status);
    if let Some(select) = dom.find("status") {
        dom.add_child(select, FakeElement::new("option").attr("value", "").text("Select..."));
        for (value, label) in [("permanent", "Permanent"), ("contract", "Contract"), ("self", "Self-employed")] {
            dom.add_child(select, FakeElement::new("option").attr("value", value).text(label));
        }
    }
    labelled(dom, employment, "employer", "Employer", FakeElement::new("input").attr("name", "EmployerName"));
    labelled(
        dom,
        employment,
        "gross",
        "Gross monthly income",
        FakeElement::new("input").attr("name", "GrossIncome"),
    );
    labelled(
        dom,
        employment,
        "net",
        "Net monthly income",
        FakeElement::new("input").attr("name", "NetIncome"),
    );
    labelled(dom, employment, "day", "Salary day", FakeElement::new("select").attr("name", "SalaryDay"));
    if let Some(select) = dom.find("day") {
        for day in ["1", "15", "25", "Last working day"] {
            dom.add_child(select, FakeElement::new("option").text(day));
        }
    }

    dom.add(FakeElement::new("span").id("form-error").attr("class", "field-error").hidden());
    dom.add(
        FakeElement::new("button")
            .id("back")
            .attr("type", "button")
            .text("Back")
            .hidden()
            .on_click(|dom| {
                dom.hide("employment-step");
                dom.hide("back");
                dom.show("contact-step");
            }),
    );
    dom.add(
        FakeElement::new("button")
            .id("next")
            .attr("type", "button")
            .text("Next")
            .on_click(next),
    );

    let review = dom.add(FakeElement::new("div").id("review").hidden());
    dom.add_child(
        review,
        FakeElement::new("button")
            .attr("type", "submit")
            .text("Submit Application")
            .on_click(|dom| {
                dom.hide("review");
                dom.show("success");
            }),
    );
    dom.add(
        FakeElement::new("div")
            .id("success")
            .attr("class", "alert success")
            .text("Thank you, your application was received")
            .hidden(),
    );
}

fn signed_in_only(dom: &mut FakeDom) -> bool {
    if dom.cookie(SESSION_COOKIE).is_none() {
        dom.navigate("/uat1/Account/Login");
        return false;
    }
    true
}

/// The staging loan site behind `https://loan.test/uat1`
pub fn loan_site() -> FakeDriver {
    loan_site_with(LoanBehaviour::default())
}

/// The loan site with its interactive handlers swapped for `behaviour`
pub fn loan_site_with(behaviour: LoanBehaviour) -> FakeDriver {
    let LoanBehaviour { login, recovery, next } = behaviour;
    FakeDriver::new()
        .route(LOAN_BASE, move |dom| login_form(dom, false, login))
        .route(&format!("{LOAN_BASE}/login"), move |dom| login_form(dom, false, login))
        .route(&format!("{LOAN_BASE}/Account/Login"), move |dom| login_form(dom, true, login))
        .route(&format!("{LOAN_BASE}/Reloan/CustomerLanding"), |dom| {
            if signed_in_only(dom) {
                dom.set_title("Welcome back");
            }
        })
        .route(&format!("{LOAN_BASE}/ForgotPassword"), move |dom| forgot_password(dom, recovery))
        .route(&format!("{LOAN_BASE}/Home"), |dom| {
            if signed_in_only(dom) {
                dom.set_title("Home");
                dom.add(FakeElement::new("a").attr("href", "/uat1/apply").text("Apply Now"));
            }
        })
        .route(&format!("{LOAN_BASE}/apply"), move |dom| {
            if signed_in_only(dom) {
                apply(dom, next);
            }
        })
}

fn account_cookie(email: &str) -> String {
    format!("account:{}", email.to_lowercase())
}

fn register_problem(dom: &FakeDom) -> Option<&'static str> {
    let email = dom.value("email");
    let password = dom.value("password");
    if email.trim().is_empty() {
        Some("Email can't be blank.")
    } else if !is_valid_email(&email) {
        Some("Email is invalid.")
    } else if password.is_empty() {
        Some("Password can't be blank.")
    } else if password.len() < 5 {
        Some("Password is too short (minimum is 5 characters).")
    } else if dom.cookie(&account_cookie(&email)).is_some() {
        Some("This email address is already associated with an account.")
    } else {
        None
    }
}

fn register(dom: &mut FakeDom) {
    dom.set_title("Create Account");
    let search = dom.add(FakeElement::new("form").attr("action", "/search"));
    dom.add_child(search, FakeElement::new("input").attr("type", "search").attr("aria-label", "Search"));
    dom.add_child(search, FakeElement::new("input").attr("type", "submit").value("Search"));

    dom.add(FakeElement::new("div").id("errors").attr("class", "errors").hidden());
    let form = dom.add(FakeElement::new("form").id("create_customer").on_submit(|dom| {
        match register_problem(dom) {
            Some(message) => {
                dom.set_text("errors", message);
                dom.show("errors");
            }
            None => {
                let email = dom.value("email");
                dom.set_cookie(account_cookie(&email), "1");
                dom.set_cookie("customer", email);
                dom.navigate("/account");
            }
        }
    }));
    for name in ["first_name", "last_name", "email"] {
        dom.add_child(
            form,
            FakeElement::new("input")
                .key(name)
                .attr("name", format!("customer[{name}]"))
                .attr("aria-label", name.replace('_', " ")),
        );
    }
    dom.add_child(
        form,
        FakeElement::new("input")
            .key("password")
            .attr("name", "customer[password]")
            .attr("type", "password")
            .attr("aria-label", "password"),
    );
    dom.add_child(form, FakeElement::new("input").attr("type", "submit").value("Create"));
    dom.add(FakeElement::new("a").attr("href", "/account/login").text("Log in"));
}

/// The storefront behind `https://shop.test`
pub fn storefront() -> FakeDriver {
    FakeDriver::new()
        .route(&format!("{STORE_BASE}/account/register"), register)
        .route(&format!("{STORE_BASE}/account"), |dom| {
            dom.set_title("Account");
            if dom.cookie("customer").is_some() {
                dom.add(FakeElement::new("a").attr("href", "/account/logout").text("Log out"));
            }
        })
        .route(&format!("{STORE_BASE}/account/login"), |dom| {
            dom.set_title("Login");
            dom.add(FakeElement::new("form").id("customer_login"));
        })
}

/// Suite settings pointed at the scripted sites
pub fn config(evidence: &Path) -> SuiteConfig {
    SuiteConfig {
        loan: LoanSiteConfig {
            base_url: LOAN_BASE.to_string(),
            registered_cell: REGISTERED_CELL.to_string(),
            registered_id: REGISTERED_ID.to_string(),
            ..LoanSiteConfig::default()
        },
        store: StoreConfig {
            base_url: STORE_BASE.to_string(),
            ..StoreConfig::default()
        },
        timeouts: TimeoutConfig {
            action_ms: 2_000,
            assertion_ms: 2_000,
            success_ms: 3_000,
            navigation_ms: 5_000,
            poll_interval_ms: 50,
        },
        retries: 0,
        evidence_dir: evidence.to_path_buf(),
        output_dir: evidence.to_path_buf(),
        ..SuiteConfig::default()
    }
}

/// Factory opening a fresh scripted page per attempt
pub fn factory() -> Arc<dyn SessionFactory> {
    factory_with(LoanBehaviour::default())
}

/// Factory whose loan pages use `behaviour`
pub fn factory_with(behaviour: LoanBehaviour) -> Arc<dyn SessionFactory> {
    Arc::new(FnSessionFactory::new(
        move |_project: DeviceProfile, site: Site| -> FlowResult<Arc<dyn PageDriver>> {
            Ok(match site {
                Site::Loan => Arc::new(loan_site_with(behaviour)),
                Site::Store => Arc::new(storefront()),
            })
        },
    ))
}
