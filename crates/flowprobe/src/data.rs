//! Fixture data for journeys.
//!
//! Values are immutable per scenario. Anything that mutates remote state
//! irrevocably (registrations) uses [`unique_email`] so reruns never collide.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

/// Prefix marking an environment value that was never filled in
pub const PLACEHOLDER_PREFIX: &str = "PLACEHOLDER";

/// Registered-format cell number that belongs to no account
pub const UNREGISTERED_CELL: &str = "0899999999";

/// ID number that is not a valid SA identity number
pub const INVALID_ID_NUMBER: &str = "9999999999999";

/// Password accepted by the storefront
pub const STRONG_PASSWORD: &str = "Password123";

/// Five-character password
pub const WEAK_PASSWORD: &str = "12345";

/// Whether an environment-provided value is unset or still a placeholder
#[must_use]
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.starts_with(PLACEHOLDER_PREFIX)
}

/// SA mobile format: `0` or `+27` followed by nine digits
#[must_use]
pub fn is_valid_sa_mobile(mobile: &str) -> bool {
    let rest = mobile
        .strip_prefix("+27")
        .or_else(|| mobile.strip_prefix('0'));
    rest.is_some_and(|digits| digits.len() == 9 && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Loose e-mail shape check: `local@domain.tld`
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .rsplit_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && tld.len() >= 2)
}

static LAST_EMAIL_MILLIS: AtomicI64 = AtomicI64::new(0);

/// `prefix+<millis>@test.com`, strictly increasing within a process
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_EMAIL_MILLIS.load(Ordering::Relaxed);
    let stamp = loop {
        let next = now.max(last + 1);
        match LAST_EMAIL_MILLIS.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break next,
            Err(observed) => last = observed,
        }
    };
    format!("{prefix}+{stamp}@test.com")
}

/// Username and password
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Credentials no account has
    #[must_use]
    pub fn invalid() -> Self {
        Self::new("invalid@user.com", "wrongpassword")
    }

    /// Both parts set and neither is a placeholder
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !is_placeholder(&self.username) && !is_placeholder(&self.password)
    }
}

/// Contact step input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    /// Mobile number
    pub mobile: String,
    /// E-mail address
    pub email: String,
}

impl ContactDetails {
    /// Create contact details
    #[must_use]
    pub fn new(mobile: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            mobile: mobile.into(),
            email: email.into(),
        }
    }

    /// Known-good applicant
    #[must_use]
    pub fn valid() -> Self {
        Self::new("0821234567", "test.applicant@example.com")
    }

    /// Replace the mobile number
    #[must_use]
    pub fn with_mobile(mut self, mobile: impl Into<String>) -> Self {
        self.mobile = mobile.into();
        self
    }

    /// Replace the e-mail
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }
}

/// Employment step input; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmploymentDetails {
    /// Visible label of the employment status option
    pub status: Option<String>,
    /// Employer name
    pub employer: Option<String>,
    /// Gross monthly income
    pub gross_income: Option<String>,
    /// Net monthly income
    pub net_income: Option<String>,
    /// Day of month salary is paid
    pub salary_day: Option<String>,
}

impl EmploymentDetails {
    /// Known-good permanent employment
    #[must_use]
    pub fn valid() -> Self {
        Self {
            status: Some("Permanent".to_string()),
            employer: Some("Acme Corp".to_string()),
            gross_income: Some("25000".to_string()),
            net_income: Some("18000".to_string()),
            salary_day: Some("25".to_string()),
        }
    }

    /// Drop the status selection
    #[must_use]
    pub fn without_status(mut self) -> Self {
        self.status = None;
        self
    }

    /// Drop the salary day
    #[must_use]
    pub fn without_salary_day(mut self) -> Self {
        self.salary_day = None;
        self
    }

    /// Set gross income
    #[must_use]
    pub fn with_gross_income(mut self, gross: impl Into<String>) -> Self {
        self.gross_income = Some(gross.into());
        self
    }

    /// Set net income
    #[must_use]
    pub fn with_net_income(mut self, net: impl Into<String>) -> Self {
        self.net_income = Some(net.into());
        self
    }
}

/// Storefront registration input; `None` fields are left blank
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// First name
    pub first_name: Option<String>,
    /// Last name
    pub last_name: Option<String>,
    /// E-mail
    pub email: Option<String>,
    /// Password
    pub password: Option<String>,
}

impl Registration {
    /// Complete registration for `email`
    #[must_use]
    pub fn valid(email: impl Into<String>) -> Self {
        Self {
            first_name: Some("Tuang".to_string()),
            last_name: Some("Test".to_string()),
            email: Some(email.into()),
            password: Some(STRONG_PASSWORD.to_string()),
        }
    }

    /// Everything blank
    #[must_use]
    pub fn blank() -> Self {
        Self::default()
    }

    /// Set first name
    #[must_use]
    pub fn with_first_name(mut self, value: Option<&str>) -> Self {
        self.first_name = value.map(str::to_string);
        self
    }

    /// Set last name
    #[must_use]
    pub fn with_last_name(mut self, value: Option<&str>) -> Self {
        self.last_name = value.map(str::to_string);
        self
    }

    /// Set e-mail
    #[must_use]
    pub fn with_email(mut self, value: Option<&str>) -> Self {
        self.email = value.map(str::to_string);
        self
    }

    /// Set password
    #[must_use]
    pub fn with_password(mut self, value: Option<&str>) -> Self {
        self.password = value.map(str::to_string);
        self
    }
}
