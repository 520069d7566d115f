//! In-memory driver for tests.
//!
//! A [`FakeDriver`] serves pages from a route table. Each route builds a
//! [`FakeDom`]; click and submit handlers mutate it (show an error, read a
//! field, navigate) the way page scripts would. Cookies survive navigation
//! so a fake site can model a logged-in session.

use super::PageDriver;
use crate::dom::{DomSnapshot, ElementSnapshot, NodeId};
use crate::result::{FlowError, FlowResult};
use crate::wait::LoadState;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Script attached to a route, a click, or a form submit
pub type FakeHandler = Arc<dyn Fn(&mut FakeDom) + Send + Sync>;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Element description used to build fake pages
#[derive(Clone)]
pub struct FakeElement {
    tag: String,
    key: Option<String>,
    attributes: BTreeMap<String, String>,
    text: String,
    value: Option<String>,
    visible: bool,
    on_click: Option<FakeHandler>,
    on_submit: Option<FakeHandler>,
}

impl fmt::Debug for FakeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeElement")
            .field("tag", &self.tag)
            .field("key", &self.key)
            .field("attributes", &self.attributes)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

impl FakeElement {
    /// Visible element with no attributes
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            key: None,
            attributes: BTreeMap::new(),
            text: String::new(),
            value: None,
            visible: true,
            on_click: None,
            on_submit: None,
        }
    }

    /// Set the `id` attribute; also the lookup key unless one is set
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if self.key.is_none() {
            self.key = Some(id.clone());
        }
        self.attributes.insert("id".to_string(), id);
        self
    }

    /// Lookup key for handlers, not rendered
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the rendered text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the initial value
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Start hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Run `handler` when clicked
    #[must_use]
    pub fn on_click(mut self, handler: impl Fn(&mut FakeDom) + Send + Sync + 'static) -> Self {
        self.on_click = Some(Arc::new(handler));
        self
    }

    /// Run `handler` when this form is submitted
    #[must_use]
    pub fn on_submit(mut self, handler: impl Fn(&mut FakeDom) + Send + Sync + 'static) -> Self {
        self.on_submit = Some(Arc::new(handler));
        self
    }

    fn is_submit_control(&self) -> bool {
        match self.tag.as_str() {
            "button" => self
                .attributes
                .get("type")
                .map_or(true, |t| t.eq_ignore_ascii_case("submit")),
            "input" => self
                .attributes
                .get("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("submit") || t.eq_ignore_ascii_case("image")),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
struct FakeNode {
    id: NodeId,
    parent: Option<NodeId>,
    element: FakeElement,
}

/// Mutable document state of the current fake page
#[derive(Debug, Clone, Default)]
pub struct FakeDom {
    url: String,
    title: String,
    nodes: Vec<FakeNode>,
    next_id: u64,
    cookies: BTreeMap<String, String>,
    pending_navigation: Option<String>,
}

impl FakeDom {
    fn blank(url: &str, next_id: u64, cookies: BTreeMap<String, String>) -> Self {
        Self {
            url: url.to_string(),
            title: String::new(),
            nodes: Vec::new(),
            next_id,
            cookies,
            pending_navigation: None,
        }
    }

    /// URL of this page
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Set the document title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Append a top-level element
    pub fn add(&mut self, element: FakeElement) -> NodeId {
        let id = self.allocate();
        self.nodes.push(FakeNode {
            id,
            parent: None,
            element,
        });
        id
    }

    /// Insert `element` as the last child of `parent`, keeping document order
    pub fn add_child(&mut self, parent: NodeId, element: FakeElement) -> NodeId {
        let id = self.allocate();
        let at = self
            .nodes
            .iter()
            .rposition(|n| self.is_within(n.id, parent))
            .map_or(self.nodes.len(), |pos| pos + 1);
        self.nodes.insert(
            at,
            FakeNode {
                id,
                parent: Some(parent),
                element,
            },
        );
        id
    }

    /// Node carrying `key`
    #[must_use]
    pub fn find(&self, key: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.element.key.as_deref() == Some(key))
            .map(|n| n.id)
    }

    /// Current value of the keyed control, empty when absent
    #[must_use]
    pub fn value(&self, key: &str) -> String {
        self.keyed(key)
            .and_then(|n| n.element.value.clone())
            .unwrap_or_default()
    }

    /// Set the value of the keyed control
    pub fn set_value(&mut self, key: &str, value: impl Into<String>) {
        if let Some(node) = self.keyed_mut(key) {
            node.element.value = Some(value.into());
        }
    }

    /// Make the keyed element visible
    pub fn show(&mut self, key: &str) {
        self.set_visible(key, true);
    }

    /// Hide the keyed element
    pub fn hide(&mut self, key: &str) {
        self.set_visible(key, false);
    }

    /// Set visibility of the keyed element
    pub fn set_visible(&mut self, key: &str, visible: bool) {
        if let Some(node) = self.keyed_mut(key) {
            node.element.visible = visible;
        }
    }

    /// Whether the keyed element and all its ancestors are visible
    #[must_use]
    pub fn is_visible(&self, key: &str) -> bool {
        self.find(key).is_some_and(|id| self.rendered_visible(id))
    }

    /// Replace the text of the keyed element
    pub fn set_text(&mut self, key: &str, text: impl Into<String>) {
        if let Some(node) = self.keyed_mut(key) {
            node.element.text = text.into();
        }
    }

    /// Set an attribute on the keyed element
    pub fn set_attr(&mut self, key: &str, name: impl Into<String>, value: impl Into<String>) {
        if let Some(node) = self.keyed_mut(key) {
            node.element.attributes.insert(name.into(), value.into());
        }
    }

    /// Remove the keyed element and its descendants
    pub fn remove(&mut self, key: &str) {
        if let Some(root) = self.find(key) {
            let doomed: Vec<NodeId> = self
                .nodes
                .iter()
                .filter(|n| self.is_within(n.id, root))
                .map(|n| n.id)
                .collect();
            self.nodes.retain(|n| !doomed.contains(&n.id));
        }
    }

    /// Navigate once the current handler returns
    pub fn navigate(&mut self, url: impl Into<String>) {
        self.pending_navigation = Some(url.into());
    }

    /// Cookie value
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Set a cookie that survives navigation
    pub fn set_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    /// Drop a cookie
    pub fn clear_cookie(&mut self, name: &str) {
        self.cookies.remove(name);
    }

    fn allocate(&mut self) -> NodeId {
        self.next_id += 1;
        NodeId(self.next_id)
    }

    fn keyed(&self, key: &str) -> Option<&FakeNode> {
        self.nodes
            .iter()
            .find(|n| n.element.key.as_deref() == Some(key))
    }

    fn keyed_mut(&mut self, key: &str) -> Option<&mut FakeNode> {
        self.nodes
            .iter_mut()
            .find(|n| n.element.key.as_deref() == Some(key))
    }

    fn node(&self, id: NodeId) -> Option<&FakeNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut FakeNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        let mut budget = self.nodes.len() + 1;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if budget == 0 {
                return false;
            }
            budget -= 1;
            current = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    fn rendered_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        let mut budget = self.nodes.len() + 1;
        while let Some(id) = current {
            let Some(node) = self.node(id) else {
                return false;
            };
            if !node.element.visible || budget == 0 {
                return false;
            }
            budget -= 1;
            current = node.parent;
        }
        true
    }

    fn closest_form(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.node(id)?;
            if node.element.tag == "form" {
                return Some(id);
            }
            current = node.parent;
        }
        None
    }

    fn snapshot(&self) -> DomSnapshot {
        DomSnapshot::new(
            self.nodes
                .iter()
                .map(|n| ElementSnapshot {
                    node: n.id,
                    tag: n.element.tag.clone(),
                    attributes: n.element.attributes.clone(),
                    text: n.element.text.trim().to_string(),
                    value: n.element.value.clone(),
                    visible: self.rendered_visible(n.id),
                    parent: n.parent,
                })
                .collect(),
        )
    }
}

/// One call made against a [`FakeDriver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    /// `goto`
    Goto(String),
    /// `fill`
    Fill(NodeId, String),
    /// `click`
    Click(NodeId),
    /// `select_by_label`
    Select(NodeId, String),
    /// `submit_form`
    Submit(NodeId),
    /// `go_back`
    Back,
    /// `set_viewport`
    Viewport(u32, u32),
    /// `screenshot_full_page`
    Screenshot,
    /// `close`
    Close,
}

#[derive(Debug)]
struct FakeState {
    dom: FakeDom,
    history: Vec<String>,
    calls: Vec<DriverCall>,
    viewport: (u32, u32),
    closed: bool,
}

/// Scripted in-memory [`PageDriver`]
pub struct FakeDriver {
    routes: Vec<(String, FakeHandler)>,
    state: Mutex<FakeState>,
}

impl fmt::Debug for FakeDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes: Vec<&str> = self.routes.iter().map(|(url, _)| url.as_str()).collect();
        f.debug_struct("FakeDriver")
            .field("routes", &routes)
            .finish_non_exhaustive()
    }
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDriver {
    /// Driver on `about:blank` with no routes
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            state: Mutex::new(FakeState {
                dom: FakeDom::blank("about:blank", 0, BTreeMap::new()),
                history: Vec::new(),
                calls: Vec::new(),
                viewport: (1280, 720),
                closed: false,
            }),
        }
    }

    /// Serve `url` (query and fragment ignored) with a page builder
    #[must_use]
    pub fn route(mut self, url: &str, build: impl Fn(&mut FakeDom) + Send + Sync + 'static) -> Self {
        self.routes.push((normalize(url), Arc::new(build)));
        self
    }

    /// Calls made so far
    #[must_use]
    pub fn calls(&self) -> Vec<DriverCall> {
        self.lock().calls.clone()
    }

    /// URLs visited, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Current viewport size
    #[must_use]
    pub fn viewport(&self) -> (u32, u32) {
        self.lock().viewport
    }

    /// Whether `close` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Read the current page
    pub fn inspect<R>(&self, f: impl FnOnce(&FakeDom) -> R) -> R {
        f(&self.lock().dom)
    }

    /// Mutate the current page outside any handler, e.g. to hide an element
    pub fn mutate(&self, f: impl FnOnce(&mut FakeDom)) {
        f(&mut self.lock().dom);
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn render(&self, state: &mut FakeState, url: &str) {
        let cookies = std::mem::take(&mut state.dom.cookies);
        let mut dom = FakeDom::blank(url, state.dom.next_id, cookies);
        let key = normalize(url);
        match self.routes.iter().find(|(route, _)| *route == key) {
            Some((_, build)) => build(&mut dom),
            None => {
                dom.set_title("404 Not Found");
                dom.add(FakeElement::new("h1").text("Not Found"));
            }
        }
        state.dom = dom;
        state.history.push(url.to_string());
        self.follow_navigation(state);
    }

    fn follow_navigation(&self, state: &mut FakeState) {
        // page builders may redirect; bounded to avoid loops between routes
        for _ in 0..8 {
            let Some(target) = state.dom.pending_navigation.take() else {
                return;
            };
            let target = join_url(&state.dom.url, &target);
            let cookies = std::mem::take(&mut state.dom.cookies);
            let mut dom = FakeDom::blank(&target, state.dom.next_id, cookies);
            let key = normalize(&target);
            if let Some((_, build)) = self.routes.iter().find(|(route, _)| *route == key) {
                build(&mut dom);
            } else {
                dom.set_title("404 Not Found");
                dom.add(FakeElement::new("h1").text("Not Found"));
            }
            state.dom = dom;
            state.history.push(target);
        }
    }

    fn ensure_open(state: &FakeState) -> FlowResult<()> {
        if state.closed {
            return Err(FlowError::driver("page is closed"));
        }
        Ok(())
    }

    fn element<'a>(state: &'a FakeState, node: NodeId) -> FlowResult<&'a FakeNode> {
        state
            .dom
            .node(node)
            .ok_or_else(|| FlowError::driver(format!("stale {node}: not in current document")))
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn goto(&self, url: &str) -> FlowResult<()> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        state.calls.push(DriverCall::Goto(url.to_string()));
        self.render(&mut state, url);
        Ok(())
    }

    async fn wait_for_load(&self, _state: LoadState, _timeout: Duration) -> FlowResult<()> {
        Self::ensure_open(&self.lock())
    }

    async fn current_url(&self) -> FlowResult<String> {
        Ok(self.lock().dom.url.clone())
    }

    async fn title(&self) -> FlowResult<String> {
        Ok(self.lock().dom.title.clone())
    }

    async fn snapshot(&self) -> FlowResult<DomSnapshot> {
        let state = self.lock();
        Self::ensure_open(&state)?;
        Ok(state.dom.snapshot())
    }

    async fn fill(&self, node: NodeId, text: &str) -> FlowResult<()> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        let tag = Self::element(&state, node)?.element.tag.clone();
        if tag != "input" && tag != "textarea" {
            return Err(FlowError::driver(format!("cannot fill <{tag}> {node}")));
        }
        state.calls.push(DriverCall::Fill(node, text.to_string()));
        if let Some(n) = state.dom.node_mut(node) {
            n.element.value = Some(text.to_string());
        }
        Ok(())
    }

    async fn click(&self, node: NodeId) -> FlowResult<()> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        let target = Self::element(&state, node)?.element.clone();
        if !state.dom.rendered_visible(node) {
            return Err(FlowError::driver(format!("{node} is not visible")));
        }
        state.calls.push(DriverCall::Click(node));

        let handler = target.on_click.clone().or_else(|| {
            if target.is_submit_control() {
                state
                    .dom
                    .closest_form(node)
                    .and_then(|form| state.dom.node(form))
                    .and_then(|form| form.element.on_submit.clone())
            } else {
                None
            }
        });

        if let Some(handler) = handler {
            handler(&mut state.dom);
        } else if target.tag == "a" {
            if let Some(href) = target.attributes.get("href") {
                state.dom.navigate(href.clone());
            }
        }
        self.follow_navigation(&mut state);
        Ok(())
    }

    async fn select_by_label(&self, node: NodeId, label: &str) -> FlowResult<bool> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        let tag = Self::element(&state, node)?.element.tag.clone();
        if tag != "select" {
            return Err(FlowError::driver(format!("{node} is a <{tag}>, not a <select>")));
        }
        state.calls.push(DriverCall::Select(node, label.to_string()));

        let wanted = label.trim();
        let chosen = state
            .dom
            .nodes
            .iter()
            .filter(|n| n.parent == Some(node) && n.element.tag == "option")
            .find(|n| {
                n.element.text.trim() == wanted
                    || n.element.attributes.get("label").is_some_and(|l| l.trim() == wanted)
            })
            .map(|n| {
                n.element
                    .attributes
                    .get("value")
                    .cloned()
                    .unwrap_or_else(|| n.element.text.trim().to_string())
            });

        match chosen {
            Some(value) => {
                if let Some(select) = state.dom.node_mut(node) {
                    select.element.value = Some(value);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn submit_form(&self, node: NodeId) -> FlowResult<()> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        Self::element(&state, node)?;
        let form = state
            .dom
            .closest_form(node)
            .ok_or_else(|| FlowError::driver(format!("{node} is not inside a <form>")))?;
        state.calls.push(DriverCall::Submit(form));
        let handler = state.dom.node(form).and_then(|f| f.element.on_submit.clone());
        if let Some(handler) = handler {
            handler(&mut state.dom);
        }
        self.follow_navigation(&mut state);
        Ok(())
    }

    async fn go_back(&self) -> FlowResult<()> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        state.calls.push(DriverCall::Back);
        if state.history.len() < 2 {
            return Ok(());
        }
        state.history.pop();
        if let Some(previous) = state.history.pop() {
            self.render(&mut state, &previous);
        }
        Ok(())
    }

    async fn set_viewport(&self, width: u32, height: u32) -> FlowResult<()> {
        let mut state = self.lock();
        state.calls.push(DriverCall::Viewport(width, height));
        state.viewport = (width, height);
        Ok(())
    }

    async fn screenshot_full_page(&self) -> FlowResult<Vec<u8>> {
        let mut state = self.lock();
        Self::ensure_open(&state)?;
        state.calls.push(DriverCall::Screenshot);
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend_from_slice(state.dom.url.as_bytes());
        Ok(png)
    }

    async fn close(&self) -> FlowResult<()> {
        let mut state = self.lock();
        state.calls.push(DriverCall::Close);
        state.closed = true;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn normalize(url: &str) -> String {
    let end = url.find(|c| c == '?' || c == '#').unwrap_or(url.len());
    url[..end].trim_end_matches('/').to_ascii_lowercase()
}

/// Resolve `href` against `base` (absolute, root-relative, or path-relative)
fn join_url(base: &str, href: &str) -> String {
    if href.contains("://") {
        return href.to_string();
    }
    let origin_end = base
        .find("://")
        .and_then(|scheme| base[scheme + 3..].find('/').map(|p| scheme + 3 + p))
        .unwrap_or(base.len());
    if href.starts_with('/') {
        return format!("{}{href}", &base[..origin_end]);
    }
    let dir_end = base.rfind('/').filter(|&p| p >= origin_end).unwrap_or(origin_end);
    format!("{}/{href}", &base[..dir_end])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn login_site() -> FakeDriver {
        FakeDriver::new()
            .route("https://site.test/login", |dom| {
                dom.set_title("Login");
                let form = dom.add(FakeElement::new("form").key("form").on_submit(|dom| {
                    if dom.value("user") == "admin" {
                        dom.set_cookie("auth", "1");
                        dom.navigate("/home");
                    } else {
                        dom.show("error");
                    }
                }));
                dom.add_child(form, FakeElement::new("input").id("user").attr("name", "username"));
                dom.add_child(form, FakeElement::new("button").id("go").text("Login"));
                dom.add(FakeElement::new("div").id("error").attr("role", "alert").text("Invalid").hidden());
            })
            .route("https://site.test/home", |dom| {
                dom.set_title("Home");
                if dom.cookie("auth").is_some() {
                    dom.add(FakeElement::new("a").id("logout").attr("href", "/login").text("Logout"));
                }
            })
    }

    fn node_of(driver: &FakeDriver, key: &str) -> NodeId {
        driver.inspect(|dom| dom.find(key)).unwrap()
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test]
        async fn test_goto_renders_route() {
            let driver = login_site();
            driver.goto("https://site.test/login?x=1").await.unwrap();
            assert_eq!(driver.title().await.unwrap(), "Login");
            let dom = driver.snapshot().await.unwrap();
            assert_eq!(dom.len(), 4);
            assert_eq!(dom.elements()[0].tag, "form");
        }

        #[tokio::test]
        async fn test_unknown_route_is_not_found() {
            let driver = login_site();
            driver.goto("https://site.test/missing").await.unwrap();
            assert_eq!(driver.title().await.unwrap(), "404 Not Found");
        }

        #[tokio::test]
        async fn test_submit_button_runs_form_handler_and_navigates() {
            let driver = login_site();
            driver.goto("https://site.test/login").await.unwrap();
            driver.fill(node_of(&driver, "user"), "admin").await.unwrap();
            driver.click(node_of(&driver, "go")).await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "https://site.test/home");
            assert!(driver.inspect(|dom| dom.find("logout")).is_some());
        }

        #[tokio::test]
        async fn test_link_click_follows_href() {
            let driver = login_site();
            driver.goto("https://site.test/login").await.unwrap();
            driver.fill(node_of(&driver, "user"), "admin").await.unwrap();
            driver.submit_form(node_of(&driver, "user")).await.unwrap();
            driver.click(node_of(&driver, "logout")).await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "https://site.test/login");
        }

        #[tokio::test]
        async fn test_go_back() {
            let driver = login_site();
            driver.goto("https://site.test/login").await.unwrap();
            driver.goto("https://site.test/home").await.unwrap();
            driver.go_back().await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "https://site.test/login");
        }

        #[test]
        fn test_join_url() {
            assert_eq!(join_url("https://a.test/uat1/login", "/home"), "https://a.test/home");
            assert_eq!(join_url("https://a.test/uat1/login", "apply"), "https://a.test/uat1/apply");
            assert_eq!(join_url("https://a.test", "x"), "https://a.test/x");
            assert_eq!(join_url("https://a.test/x", "https://b.test/"), "https://b.test/");
        }
    }

    mod interaction_tests {
        use super::*;

        #[tokio::test]
        async fn test_failed_login_shows_error() {
            let driver = login_site();
            driver.goto("https://site.test/login").await.unwrap();
            driver.fill(node_of(&driver, "user"), "nobody").await.unwrap();
            driver.click(node_of(&driver, "go")).await.unwrap();
            assert!(driver.inspect(|dom| dom.is_visible("error")));
        }

        #[tokio::test]
        async fn test_click_hidden_element_fails() {
            let driver = login_site();
            driver.goto("https://site.test/login").await.unwrap();
            let err = driver.click(node_of(&driver, "error")).await.unwrap_err();
            assert!(err.to_string().contains("not visible"));
        }

        #[tokio::test]
        async fn test_stale_node_fails() {
            let driver = login_site();
            driver.goto("https://site.test/login").await.unwrap();
            let user = node_of(&driver, "user");
            driver.goto("https://site.test/login").await.unwrap();
            assert!(driver.fill(user, "x").await.is_err());
        }

        #[tokio::test]
        async fn test_select_by_label() {
            let driver = FakeDriver::new().route("https://s.test/", |dom| {
                let select = dom.add(FakeElement::new("select").id("status"));
                dom.add_child(select, FakeElement::new("option").attr("value", "P").text("Permanent"));
                dom.add_child(select, FakeElement::new("option").attr("value", "C").text("Contract"));
            });
            driver.goto("https://s.test/").await.unwrap();
            let select = node_of(&driver, "status");
            assert!(driver.select_by_label(select, "Contract").await.unwrap());
            assert_eq!(driver.inspect(|dom| dom.value("status")), "C");
            assert!(!driver.select_by_label(select, "Retired").await.unwrap());
        }

        #[tokio::test]
        async fn test_add_child_keeps_document_order() {
            let driver = FakeDriver::new().route("https://s.test/", |dom| {
                let outer = dom.add(FakeElement::new("div").key("outer"));
                dom.add(FakeElement::new("footer").key("footer"));
                let inner = dom.add_child(outer, FakeElement::new("p").key("p1"));
                dom.add_child(inner, FakeElement::new("span").key("s1"));
                dom.add_child(outer, FakeElement::new("p").key("p2"));
            });
            driver.goto("https://s.test/").await.unwrap();
            let tags: Vec<String> = driver
                .snapshot()
                .await
                .unwrap()
                .elements()
                .iter()
                .map(|e| e.tag.clone())
                .collect();
            assert_eq!(tags, vec!["div", "p", "span", "p", "footer"]);
        }

        #[tokio::test]
        async fn test_screenshot_is_png_and_recorded() {
            let driver = login_site();
            driver.goto("https://site.test/login").await.unwrap();
            let png = driver.screenshot_full_page().await.unwrap();
            assert_eq!(&png[..8], &PNG_SIGNATURE);
            assert!(driver.calls().contains(&DriverCall::Screenshot));
        }

        #[tokio::test]
        async fn test_closed_driver_rejects_navigation() {
            let driver = login_site();
            driver.close().await.unwrap();
            assert!(driver.is_closed());
            assert!(driver.goto("https://site.test/login").await.is_err());
        }
    }
}
