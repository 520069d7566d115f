//! Chromium page driver over CDP.
//!
//! Matching happens in Rust against a snapshot. The snapshot script stamps
//! every element with a `data-flowprobe-node` attribute the first time it
//! sees it, so element-level calls address nodes with a plain CSS attribute
//! selector and stale ids fail instead of hitting another element.

#![allow(clippy::significant_drop_tightening)]

use super::PageDriver;
use crate::config::DeviceProfile;
use crate::data::Credentials;
use crate::dom::{DomSnapshot, ElementSnapshot, NodeId, NODE_ID_ATTRIBUTE};
use crate::result::{FlowError, FlowResult};
use crate::wait::{poll_until, LoadState, WaitOptions, NETWORK_IDLE_THRESHOLD_MS};
use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::Browser as CdpBrowser;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, Headers, SetExtraHttpHeadersParams,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page as CdpPage, ScreenshotParams};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

const SNAPSHOT_JS: &str = r#"(() => {
  const ATTR = "__ATTR__";
  window.__flowprobeNext = window.__flowprobeNext || 1;
  const all = Array.from(document.querySelectorAll("*"));
  const ids = new Map();
  for (const el of all) {
    let id = el.getAttribute(ATTR);
    if (!id) {
      id = String(window.__flowprobeNext++);
      el.setAttribute(ATTR, id);
    }
    ids.set(el, Number(id));
  }
  return all.map((el) => {
    const attributes = {};
    for (const a of el.attributes) {
      if (a.name !== ATTR) attributes[a.name] = a.value;
    }
    const style = window.getComputedStyle(el);
    const visible = el.getClientRects().length > 0
      && style.visibility !== "hidden"
      && style.display !== "none";
    const raw = typeof el.innerText === "string" ? el.innerText : (el.textContent || "");
    const value = typeof el.value === "string" ? el.value : null;
    return {
      node: ids.get(el),
      tag: el.tagName.toLowerCase(),
      attributes,
      text: raw.trim().slice(0, 4000),
      value,
      visible,
      parent: el.parentElement ? ids.get(el.parentElement) : null,
    };
  });
})()"#;

const FILL_JS: &str = r#"((sel, text) => {
  const el = document.querySelector(sel);
  if (!el) return false;
  el.focus();
  const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
  Object.getOwnPropertyDescriptor(proto, "value").set.call(el, text);
  el.dispatchEvent(new Event("input", { bubbles: true }));
  el.dispatchEvent(new Event("change", { bubbles: true }));
  return true;
})"#;

const SELECT_JS: &str = r#"((sel, label) => {
  const el = document.querySelector(sel);
  if (!el || el.tagName !== "SELECT") return false;
  const wanted = label.trim().toLowerCase();
  const option = Array.from(el.options).find((o) => (o.label || o.text).trim().toLowerCase() === wanted);
  if (!option) return false;
  el.value = option.value;
  el.dispatchEvent(new Event("input", { bubbles: true }));
  el.dispatchEvent(new Event("change", { bubbles: true }));
  return true;
})"#;

const SUBMIT_JS: &str = r#"((sel) => {
  const el = document.querySelector(sel);
  if (!el) return false;
  const form = el.tagName === "FORM" ? el : el.closest("form");
  if (!form) return false;
  HTMLFormElement.prototype.submit.call(form);
  return true;
})"#;

/// Page setup applied once when a driver attaches
#[derive(Debug, Clone, Default)]
pub struct PageSetup {
    /// Device to emulate
    pub profile: DeviceProfile,
    /// Credentials sent as an `Authorization: Basic` header
    pub basic_auth: Option<Credentials>,
}

impl PageSetup {
    /// Header value for the basic-auth credentials
    #[must_use]
    pub fn authorization(&self) -> Option<String> {
        self.basic_auth.as_ref().map(|c| {
            let token = base64::engine::general_purpose::STANDARD
                .encode(format!("{}:{}", c.username, c.password));
            format!("Basic {token}")
        })
    }
}

/// [`PageDriver`] backed by one Chromium tab
pub struct ChromiumDriver {
    page: CdpPage,
    profile: DeviceProfile,
    browser: Option<Arc<Mutex<CdpBrowser>>>,
    context: Option<BrowserContextId>,
}

impl fmt::Debug for ChromiumDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromiumDriver")
            .field("profile", &self.profile)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

fn cdp_error(e: impl fmt::Display) -> FlowError {
    FlowError::driver(e.to_string())
}

fn js_literal(value: &str) -> FlowResult<String> {
    Ok(serde_json::to_string(value)?)
}

impl ChromiumDriver {
    /// Attach to `page` and apply device emulation and headers
    pub async fn attach(page: CdpPage, setup: &PageSetup) -> FlowResult<Self> {
        let driver = Self {
            page,
            profile: setup.profile,
            browser: None,
            context: None,
        };
        let (width, height) = setup.profile.viewport();
        driver.emulate(width, height).await?;
        if let Some(ua) = setup.profile.user_agent() {
            driver
                .page
                .execute(SetUserAgentOverrideParams::new(ua))
                .await
                .map_err(cdp_error)?;
        }
        if let Some(authorization) = setup.authorization() {
            driver.page.execute(EnableParams::default()).await.map_err(cdp_error)?;
            let headers = Headers::new(serde_json::json!({ "Authorization": authorization }));
            driver
                .page
                .execute(SetExtraHttpHeadersParams::new(headers))
                .await
                .map_err(cdp_error)?;
        }
        debug!(profile = %setup.profile, auth = setup.basic_auth.is_some(), "page attached");
        Ok(driver)
    }

    /// Dispose `context` on `browser` when this driver closes
    #[must_use]
    pub fn owning_context(mut self, browser: Arc<Mutex<CdpBrowser>>, context: BrowserContextId) -> Self {
        self.browser = Some(browser);
        self.context = Some(context);
        self
    }

    async fn emulate(&self, width: u32, height: u32) -> FlowResult<()> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(width))
            .height(i64::from(height))
            .device_scale_factor(self.profile.device_scale_factor())
            .mobile(self.profile.is_mobile())
            .build()
            .map_err(cdp_error)?;
        self.page.execute(params).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn eval<T: DeserializeOwned>(&self, script: &str) -> FlowResult<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(cdp_error)?
            .into_value()
            .map_err(cdp_error)
    }

    async fn ready_state(&self) -> FlowResult<String> {
        self.eval("document.readyState").await
    }

    async fn on_node(&self, function: &str, node: NodeId, extra: Option<&str>) -> FlowResult<bool> {
        let selector = js_literal(&node.css())?;
        let script = match extra {
            Some(arg) => format!("{function}({selector}, {})", js_literal(arg)?),
            None => format!("{function}({selector})"),
        };
        self.eval(&script).await
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn goto(&self, url: &str) -> FlowResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| FlowError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn wait_for_load(&self, state: LoadState, timeout: Duration) -> FlowResult<()> {
        let options = WaitOptions::new().with_timeout(timeout.as_millis() as u64);
        poll_until(state.event_name(), options, || async {
            let ready = self.ready_state().await?;
            Ok(state.reached_by(&ready).then_some(()))
        })
        .await?;
        if state == LoadState::NetworkIdle {
            tokio::time::sleep(Duration::from_millis(NETWORK_IDLE_THRESHOLD_MS)).await;
        }
        Ok(())
    }

    async fn current_url(&self) -> FlowResult<String> {
        Ok(self.page.url().await.map_err(cdp_error)?.unwrap_or_default())
    }

    async fn title(&self) -> FlowResult<String> {
        Ok(self.page.get_title().await.map_err(cdp_error)?.unwrap_or_default())
    }

    async fn snapshot(&self) -> FlowResult<DomSnapshot> {
        let script = SNAPSHOT_JS.replace("__ATTR__", NODE_ID_ATTRIBUTE);
        let elements: Vec<ElementSnapshot> = self.eval(&script).await?;
        Ok(DomSnapshot::new(elements))
    }

    async fn fill(&self, node: NodeId, text: &str) -> FlowResult<()> {
        if self.on_node(FILL_JS, node, Some(text)).await? {
            Ok(())
        } else {
            Err(FlowError::driver(format!("{node} is gone, cannot fill")))
        }
    }

    async fn click(&self, node: NodeId) -> FlowResult<()> {
        let element = self.page.find_element(node.css()).await.map_err(cdp_error)?;
        element.click().await.map_err(cdp_error)?;
        Ok(())
    }

    async fn select_by_label(&self, node: NodeId, label: &str) -> FlowResult<bool> {
        self.on_node(SELECT_JS, node, Some(label)).await
    }

    async fn submit_form(&self, node: NodeId) -> FlowResult<()> {
        if self.on_node(SUBMIT_JS, node, None).await? {
            Ok(())
        } else {
            Err(FlowError::driver(format!("{node} is not inside a form")))
        }
    }

    async fn go_back(&self) -> FlowResult<()> {
        let before = self.current_url().await?;
        self.eval::<serde_json::Value>("history.back(), null").await?;
        let options = WaitOptions::new().with_timeout(2_000);
        let moved = poll_until("history back", options, || async {
            let now = self.current_url().await?;
            Ok((now != before).then_some(()))
        })
        .await;
        if let Err(e) = moved {
            debug!(error = %e, "history back left the URL unchanged");
        }
        Ok(())
    }

    async fn set_viewport(&self, width: u32, height: u32) -> FlowResult<()> {
        self.emulate(width, height).await
    }

    async fn screenshot_full_page(&self) -> FlowResult<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page
            .screenshot(params)
            .await
            .map_err(|e| FlowError::Screenshot {
                message: e.to_string(),
            })
    }

    async fn close(&self) -> FlowResult<()> {
        self.page.clone().close().await.map_err(cdp_error)?;
        if let (Some(browser), Some(context)) = (&self.browser, &self.context) {
            browser
                .lock()
                .await
                .dispose_browser_context(context.clone())
                .await
                .map_err(cdp_error)?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}
