//! Built-in journeys against the loan site and the storefront.
//!
//! Journeys are grouped into named suites. Each suite is a static table of
//! [`Scenario`]s; [`catalogue`] concatenates them in suite order.

mod apply_now;
mod auth;
mod forgot_password;
mod register;

use crate::scenario::Scenario;

/// Suite names in run order
pub const SUITES: [&str; 4] = ["auth", "apply-now", "forgot-password", "register"];

/// Scenarios of one suite, `None` for an unknown name
#[must_use]
pub fn suite(name: &str) -> Option<&'static [Scenario]> {
    match name {
        "auth" => Some(&auth::SCENARIOS),
        "apply-now" => Some(&apply_now::SCENARIOS),
        "forgot-password" => Some(&forgot_password::SCENARIOS),
        "register" => Some(&register::SCENARIOS),
        _ => None,
    }
}

/// Every built-in scenario
#[must_use]
pub fn catalogue() -> Vec<Scenario> {
    SUITES
        .iter()
        .filter_map(|name| suite(name))
        .flat_map(|scenarios| scenarios.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let all = catalogue();
        let ids: HashSet<&str> = all.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), all.len());
    }

    #[test]
    fn test_every_suite_is_reachable() {
        for name in SUITES {
            assert!(suite(name).is_some_and(|s| !s.is_empty()), "{name}");
        }
        assert!(suite("checkout").is_none());
    }

    #[test]
    fn test_catalogue_keeps_suite_order() {
        let all = catalogue();
        assert!(all[0].id.starts_with("auth"));
        assert_eq!(all.last().map(|s| s.id), Some("TC013"));
        assert_eq!(all.iter().filter(|s| s.id.starts_with("TC_FP")).count(), 5);
    }
}
