//! Flowprobe: page objects and resilient element resolution for end-to-end
//! browser journeys.
//!
//! Journeys are linear scripts over page objects. Page objects name their
//! fields by intent and carry an ordered list of locator strategies; the
//! resolver evaluates that list against a DOM snapshot, logs which strategy
//! matched, and fails with every strategy it tried when nothing did.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    FLOWPROBE Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Journey    │    │ Page       │    │ Resolver   │            │
//! │   │ (scenario) │───►│ Object     │───►│ (strategy  │            │
//! │   │            │    │            │    │  list)     │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │         │                                   │                   │
//! │         ▼                                   ▼                   │
//! │   ┌────────────┐                     ┌────────────┐             │
//! │   │ Evidence   │◄────────────────────│ PageDriver │             │
//! │   │ Store      │     screenshots     │ (CDP/fake) │             │
//! │   └────────────┘                     └────────────┘             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

mod config;
mod data;
mod dom;
mod dropdown;
mod evidence;
mod expect;
mod harness;
mod locator;
mod page_object;
mod resolver;
mod result;
mod scenario;
mod session;
mod wait;

#[cfg(feature = "browser")]
mod browser;

/// Page drivers: Chromium over CDP and a scripted in-memory fake
pub mod driver;

/// Built-in journeys grouped into suites
pub mod journeys;

/// Page objects for the loan site and the storefront
pub mod pages;

#[cfg(feature = "browser")]
pub use browser::{Browser, ChromiumSessionFactory};
pub use config::{
    join_path, BrowserConfig, DeviceProfile, LoanSiteConfig, StoreConfig, SuiteConfig,
    TimeoutConfig, DEFAULT_LOAN_BASE_URL, DEFAULT_STORE_BASE_URL,
};
pub use data::{
    is_placeholder, is_valid_email, is_valid_sa_mobile, unique_email, ContactDetails, Credentials,
    EmploymentDetails, Registration, INVALID_ID_NUMBER, PLACEHOLDER_PREFIX, STRONG_PASSWORD,
    UNREGISTERED_CELL, WEAK_PASSWORD,
};
pub use dom::{DomSnapshot, ElementSnapshot, NodeId, NODE_ID_ATTRIBUTE};
pub use driver::{DriverCall, FakeDom, FakeDriver, FakeElement, PageDriver};
pub use dropdown::{custom_option, DropdownStrategy, SelectOutcome};
pub use evidence::{sanitize, EvidenceRecord, EvidenceStore};
pub use expect::{Expect, PageExpect};
pub use harness::{
    FnSessionFactory, Harness, HarnessEvent, SessionFactory, SuiteResults, FAILURE_STEP,
};
pub use locator::{AttrOp, FieldRef, Strategy};
pub use page_object::PageObject;
pub use resolver::{Requirement, Resolution, ResolutionPolicy, Resolver};
pub use result::{FlowError, FlowResult};
pub use scenario::{
    Observation, Outcome, Scenario, ScenarioContext, ScenarioFn, ScenarioReport, Site,
};
pub use session::Session;
pub use wait::{
    poll_until, LoadState, UrlPattern, WaitOptions, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_WAIT_TIMEOUT_MS, NETWORK_IDLE_THRESHOLD_MS,
};

/// Prelude for journeys and page objects
pub mod prelude {
    pub use crate::config::SuiteConfig;
    pub use crate::driver::PageDriver;
    pub use crate::locator::{FieldRef, Strategy};
    pub use crate::page_object::PageObject;
    pub use crate::result::{FlowError, FlowResult};
    pub use crate::scenario::{Scenario, ScenarioContext, Site};
    pub use crate::session::Session;
    pub use crate::wait::{LoadState, UrlPattern};
}
