//! Page objects for the loan site and the storefront.

mod apply_now;
mod forgot_password;
mod login;
mod register;

pub use apply_now::ApplyNowPage;
pub use forgot_password::ForgotPasswordPage;
pub use login::LoginPage;
pub use register::{RegisterPage, REGISTER_PATH};
