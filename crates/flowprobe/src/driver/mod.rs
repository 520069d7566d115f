//! Page driver abstraction.
//!
//! [`PageDriver`] is the only seam between journeys and a browser. Everything
//! above it (resolution, waits, page objects) is written against this trait,
//! so the same journeys run on Chromium and on the in-memory [`FakeDriver`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  PageDriver (trait)                                       │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌────────────────────┐     ┌──────────────────────────┐ │
//! │  │  ChromiumDriver    │     │  FakeDriver              │ │
//! │  │  CDP via           │     │  scripted in-memory DOM  │ │
//! │  │  chromiumoxide     │     │  for tests               │ │
//! │  └────────────────────┘     └──────────────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod fake;

#[cfg(feature = "browser")]
mod cdp;

pub use fake::{DriverCall, FakeDom, FakeDriver, FakeElement, FakeHandler};

#[cfg(feature = "browser")]
pub use cdp::{ChromiumDriver, PageSetup};

use crate::dom::{DomSnapshot, NodeId};
use crate::result::FlowResult;
use crate::wait::LoadState;
use async_trait::async_trait;
use std::time::Duration;

/// Browser operations a session needs
///
/// Element-level calls take a [`NodeId`] from the most recent snapshot.
/// A node that no longer exists is a driver error, which makes stale handles
/// fail loudly rather than act on the wrong element.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to a URL
    async fn goto(&self, url: &str) -> FlowResult<()>;

    /// Wait for the document to reach a load state
    async fn wait_for_load(&self, state: LoadState, timeout: Duration) -> FlowResult<()>;

    /// Current URL
    async fn current_url(&self) -> FlowResult<String>;

    /// Document title
    async fn title(&self) -> FlowResult<String>;

    /// Document-ordered element snapshot
    async fn snapshot(&self) -> FlowResult<DomSnapshot>;

    /// Replace the value of an input or textarea
    async fn fill(&self, node: NodeId, text: &str) -> FlowResult<()>;

    /// Click an element
    async fn click(&self, node: NodeId) -> FlowResult<()>;

    /// Pick an `<option>` of a native `<select>` by its visible label.
    /// Returns `false` when no option carries that label.
    async fn select_by_label(&self, node: NodeId, label: &str) -> FlowResult<bool>;

    /// Submit the form containing `node` without going through click handlers
    async fn submit_form(&self, node: NodeId) -> FlowResult<()>;

    /// History back
    async fn go_back(&self) -> FlowResult<()>;

    /// Resize the viewport
    async fn set_viewport(&self, width: u32, height: u32) -> FlowResult<()>;

    /// Full-page PNG
    async fn screenshot_full_page(&self) -> FlowResult<Vec<u8>>;

    /// Release the page
    async fn close(&self) -> FlowResult<()>;

    /// Short driver name for logs
    fn name(&self) -> &'static str;
}
