// Common test utilities and fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path as FsPath, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tempfile::TempDir;

use webprompt::identifier::{GENERATE_IDS_SCRIPT, ID_ATTRIBUTE};
use webprompt::page::{SCROLL_POSITION_SCRIPT, SCROLL_TO_SCRIPT};
use webprompt::snapshot::INTERACTIVE_ELEMENTS_SCRIPT;
use webprompt::visibility::{PRUNE_SCRIPT, STYLE_SAMPLES_SCRIPT};
use webprompt::{
    AuthSession, BrowserOptions, BrowserSession, Config, ElementId, Error, Page, PageDriver,
    Resolution, ResolutionService, ResolveRequest, Result, RetryPolicy, StorageState,
};

/// Bytes the fake page hands out as its screenshot
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

const VOID_TAGS: &[&str] = &["input", "img", "br", "meta", "link"];
const INTERACTIVE_TAGS: &[&str] = &["a", "button", "input", "select", "textarea"];
const KEPT_ATTRIBUTES: &[&str] = &["id", "name", "type", "placeholder", "aria-label", "href"];

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    display: String,
    visibility: String,
    opacity: String,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl Node {
    fn new(tag: &str, parent: Option<usize>) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            text: String::new(),
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: "1".to_string(),
            parent,
            children: Vec::new(),
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A small element tree standing in for a browser document
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
}

impl Dom {
    pub const HTML: usize = 0;
    pub const BODY: usize = 1;

    /// `<html><body></body></html>`
    pub fn new() -> Self {
        let mut html = Node::new("html", None);
        html.children.push(Self::BODY);
        Self {
            nodes: vec![html, Node::new("body", Some(Self::HTML))],
        }
    }

    pub fn append(&mut self, parent: usize, tag: &str) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node::new(tag, Some(parent)));
        self.nodes[parent].children.push(index);
        index
    }

    pub fn set_attr(&mut self, node: usize, name: &str, value: &str) {
        let attrs = &mut self.nodes[node].attrs;
        match attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn set_text(&mut self, node: usize, text: &str) {
        self.nodes[node].text = text.to_string();
    }

    pub fn set_display(&mut self, node: usize, display: &str) {
        self.nodes[node].display = display.to_string();
    }

    pub fn set_visibility(&mut self, node: usize, visibility: &str) {
        self.nodes[node].visibility = visibility.to_string();
    }

    pub fn set_opacity(&mut self, node: usize, opacity: &str) {
        self.nodes[node].opacity = opacity.to_string();
    }

    /// Identifier currently on `node`
    pub fn d_id(&self, node: usize) -> Option<&str> {
        self.nodes[node].attr(ID_ATTRIBUTE)
    }

    fn document_order(&self) -> Vec<usize> {
        fn walk(dom: &Dom, node: usize, out: &mut Vec<usize>) {
            out.push(node);
            for &child in &dom.nodes[node].children {
                walk(dom, child, out);
            }
        }
        let mut out = Vec::new();
        walk(self, Self::HTML, &mut out);
        out
    }

    fn first_with_id(&self, id: &str) -> Option<usize> {
        self.document_order()
            .into_iter()
            .find(|&n| self.nodes[n].attr("id") == Some(id))
    }

    fn sibling_index(&self, node: usize) -> usize {
        let tag = &self.nodes[node].tag;
        match self.nodes[node].parent {
            Some(parent) => {
                1 + self.nodes[parent]
                    .children
                    .iter()
                    .take_while(|&&c| c != node)
                    .filter(|&&c| &self.nodes[c].tag == tag)
                    .count()
            }
            None => 1,
        }
    }

    /// Structural path in the same shape the generation script builds
    pub fn path_of(&self, node: usize) -> String {
        let mut segments = Vec::new();
        let mut current = Some(node);
        while let Some(n) = current {
            if let Some(id) = self.nodes[n].attr("id").filter(|id| !id.is_empty()) {
                if self.first_with_id(id) == Some(n) {
                    segments.insert(0, format!("id(\"{}\")", id));
                    return segments.join("/");
                }
            }
            segments.insert(0, format!("{}[{}]", self.nodes[n].tag, self.sibling_index(n)));
            current = self.nodes[n].parent;
        }
        segments.insert(0, String::new());
        segments.join("/")
    }

    /// Tag every node; returns `(tagged, collisions)`
    fn generate_ids(&mut self) -> (usize, usize) {
        let order = self.document_order();
        let ids: Vec<String> = order
            .iter()
            .map(|&n| ElementId::from_path(&self.path_of(n)).to_string())
            .collect();

        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut collisions = 0;
        for id in &ids {
            let count = seen.entry(id.as_str()).or_insert(0);
            *count += 1;
            if *count == 2 {
                collisions += 1;
            }
        }

        for (&node, id) in order.iter().zip(&ids) {
            self.set_attr(node, ID_ATTRIBUTE, id);
        }
        (order.len(), collisions)
    }

    fn identified(&self) -> Vec<usize> {
        self.document_order()
            .into_iter()
            .filter(|&n| self.d_id(n).is_some())
            .collect()
    }

    fn find_by_d_id(&self, id: &str) -> Option<usize> {
        self.identified()
            .into_iter()
            .find(|&n| self.d_id(n) == Some(id))
    }

    /// Serialized document, leaving out nodes whose identifier is in `skip`
    pub fn to_html(&self, skip: &HashSet<String>) -> String {
        fn write(dom: &Dom, node: usize, skip: &HashSet<String>, out: &mut String) {
            let n = &dom.nodes[node];
            if n.attr(ID_ATTRIBUTE).is_some_and(|id| skip.contains(id)) {
                return;
            }
            out.push('<');
            out.push_str(&n.tag);
            for (k, v) in &n.attrs {
                out.push_str(&format!(" {}=\"{}\"", k, v));
            }
            out.push('>');
            if VOID_TAGS.contains(&n.tag.as_str()) {
                return;
            }
            out.push_str(&n.text);
            for &child in &n.children {
                write(dom, child, skip, out);
            }
            out.push_str(&format!("</{}>", n.tag));
        }

        let mut out = String::from("<!DOCTYPE html>");
        write(self, Self::HTML, skip, &mut out);
        out
    }

    fn style_samples(&self) -> Value {
        let samples: Vec<Value> = self
            .identified()
            .into_iter()
            .map(|n| {
                let node = &self.nodes[n];
                json!({
                    "d_id": node.attr(ID_ATTRIBUTE),
                    "tag": node.tag,
                    "display": node.display,
                    "visibility": node.visibility,
                    "opacity": node.opacity,
                })
            })
            .collect();
        Value::Array(samples)
    }

    fn interactive_elements(&self) -> Value {
        let elements: Vec<Value> = self
            .identified()
            .into_iter()
            .filter(|&n| INTERACTIVE_TAGS.contains(&self.nodes[n].tag.as_str()))
            .map(|n| {
                let node = &self.nodes[n];
                let attributes: serde_json::Map<String, Value> = node
                    .attrs
                    .iter()
                    .filter(|(k, _)| KEPT_ATTRIBUTES.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), json!(v)))
                    .collect();
                json!({
                    "d_id": node.attr(ID_ATTRIBUTE),
                    "tag": node.tag,
                    "role": node.attr("role"),
                    "attributes": attributes,
                    "text": node.text.trim(),
                })
            })
            .collect();
        Value::Array(elements)
    }
}

/// Element handle produced by [`FakePage`] lookups
#[derive(Debug, Clone, PartialEq)]
pub struct FakeElement {
    pub d_id: Option<String>,
    pub tag: String,
}

#[derive(Debug)]
pub struct FakeState {
    pub dom: Dom,
    pub url: String,
    pub scroll_y: f64,
    pub page_height: f64,
    /// Number of upcoming `wait_for_load` calls that time out
    pub load_failures: u32,
    /// Names of the operations performed, in order
    pub calls: Vec<&'static str>,
    /// Identifiers of clicked elements
    pub clicked: Vec<Option<String>>,
    /// Identifier and text of every `type_text`
    pub typed: Vec<(Option<String>, String)>,
    /// Paths given to each `set_input_files`
    pub uploaded: Vec<Vec<PathBuf>>,
}

/// In-memory [`PageDriver`] that runs the crate's page scripts against a [`Dom`]
#[derive(Debug, Clone)]
pub struct FakePage {
    state: Arc<Mutex<FakeState>>,
}

impl FakePage {
    pub fn new(dom: Dom) -> Self {
        Self::at(dom, "https://example.test/")
    }

    pub fn at(dom: Dom, url: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                dom,
                url: url.to_string(),
                scroll_y: 0.0,
                page_height: 0.0,
                load_failures: 0,
                calls: Vec::new(),
                clicked: Vec::new(),
                typed: Vec::new(),
                uploaded: Vec::new(),
            })),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// How many times the named operation ran
    pub fn count(&self, name: &str) -> usize {
        self.state().calls.iter().filter(|c| **c == name).count()
    }

    fn element(dom: &Dom, node: usize) -> FakeElement {
        FakeElement {
            d_id: dom.d_id(node).map(str::to_string),
            tag: dom.nodes[node].tag.clone(),
        }
    }
}

#[async_trait]
impl PageDriver for FakePage {
    type Element = FakeElement;

    async fn url(&self) -> Result<String> {
        Ok(self.state().url.clone())
    }

    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<()> {
        let mut state = self.state();
        state.calls.push("navigate");
        state.url = url.to_string();
        Ok(())
    }

    async fn wait_for_load(&self, _timeout: Duration) -> Result<()> {
        let mut state = self.state();
        if state.load_failures > 0 {
            state.load_failures -= 1;
            return Err(Error::Timeout("document never finished loading".to_string()));
        }
        Ok(())
    }

    async fn evaluate(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        let mut state = self.state();

        if script == GENERATE_IDS_SCRIPT {
            state.calls.push("generate_ids");
            let (tagged, collisions) = state.dom.generate_ids();
            Ok(json!({ "tagged": tagged, "collisions": collisions }))
        } else if script == STYLE_SAMPLES_SCRIPT {
            state.calls.push("style_samples");
            Ok(state.dom.style_samples())
        } else if script == PRUNE_SCRIPT {
            state.calls.push("prune");
            let hidden: HashSet<String> = args
                .get(1)
                .cloned()
                .map(serde_json::from_value)
                .transpose()?
                .unwrap_or_default();
            Ok(json!(state.dom.to_html(&hidden)))
        } else if script == INTERACTIVE_ELEMENTS_SCRIPT {
            state.calls.push("interactive_elements");
            Ok(state.dom.interactive_elements())
        } else if script == SCROLL_POSITION_SCRIPT {
            state.calls.push("scroll_position");
            Ok(json!(state.scroll_y))
        } else if script == SCROLL_TO_SCRIPT {
            state.calls.push("scroll_to");
            let target = args.first().and_then(Value::as_f64).unwrap_or(0.0);
            state.scroll_y = target.min(state.page_height);
            Ok(Value::Null)
        } else {
            Err(Error::Script(format!("unexpected script: {}", script.trim())))
        }
    }

    async fn content(&self) -> Result<String> {
        let mut state = self.state();
        state.calls.push("content");
        Ok(state.dom.to_html(&HashSet::new()))
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.state().calls.push("screenshot");
        Ok(FAKE_PNG.to_vec())
    }

    async fn wait_for_xpath(&self, xpath: &str, _timeout: Duration) -> Result<FakeElement> {
        let mut state = self.state();
        state.calls.push("wait_for_xpath");
        let wanted = xpath
            .strip_prefix(&format!("//*[@{}='", ID_ATTRIBUTE))
            .and_then(|rest| rest.strip_suffix("']"))
            .ok_or_else(|| Error::Script(format!("unsupported xpath: {}", xpath)))?;
        state
            .dom
            .find_by_d_id(wanted)
            .map(|n| Self::element(&state.dom, n))
            .ok_or_else(|| Error::Timeout(format!("nothing matched {}", xpath)))
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<Vec<FakeElement>> {
        let mut state = self.state();
        state.calls.push("wait_for_selector");
        let found: Vec<FakeElement> = state
            .dom
            .document_order()
            .into_iter()
            .filter(|&n| state.dom.nodes[n].tag == selector)
            .map(|n| Self::element(&state.dom, n))
            .collect();
        if found.is_empty() {
            return Err(Error::Timeout(format!("nothing matched {}", selector)));
        }
        Ok(found)
    }

    async fn click(&self, element: &FakeElement) -> Result<()> {
        let mut state = self.state();
        state.calls.push("click");
        state.clicked.push(element.d_id.clone());
        Ok(())
    }

    async fn type_text(&self, element: &FakeElement, text: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push("type_text");
        state.typed.push((element.d_id.clone(), text.to_string()));
        Ok(())
    }

    async fn set_input_files(&self, element: &FakeElement, paths: &[PathBuf]) -> Result<()> {
        if element.tag != "input" {
            return Err(Error::Script(format!("<{}> takes no files", element.tag)));
        }
        let mut state = self.state();
        state.calls.push("set_input_files");
        state.uploaded.push(paths.to_vec());
        Ok(())
    }
}

/// What a [`FakeSession`] was asked to do
#[derive(Debug, Default)]
pub struct SessionLog {
    /// Pages opened after the initial one
    pub opened: usize,
    /// URLs of closed pages, in order
    pub closed_pages: Vec<String>,
    pub restored: Vec<StorageState>,
    pub closed: bool,
}

/// In-memory [`BrowserSession`] whose pages are [`FakePage`]s named `page-N`
#[derive(Clone)]
pub struct FakeSession {
    log: Arc<Mutex<SessionLog>>,
    storage: Option<StorageState>,
    downloads: Arc<TempDir>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(SessionLog::default())),
            storage: Some(StorageState::default()),
            downloads: Arc::new(TempDir::new().unwrap()),
        }
    }

    /// Report `state` as the browser's cookies and localStorage
    pub fn with_storage(mut self, state: StorageState) -> Self {
        self.storage = Some(state);
        self
    }

    /// Fail every attempt to read storage state
    pub fn unreadable_storage(mut self) -> Self {
        self.storage = None;
        self
    }

    pub fn log(&self) -> MutexGuard<'_, SessionLog> {
        self.log.lock().unwrap()
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Page = FakePage;

    async fn connect(_options: &BrowserOptions, _user_agent: Option<&str>) -> Result<Self> {
        Ok(Self::new())
    }

    async fn initial_page(&self) -> Result<FakePage> {
        Ok(FakePage::at(Dom::new(), "page-0"))
    }

    async fn open_page(&self) -> Result<FakePage> {
        let mut log = self.log();
        log.opened += 1;
        Ok(FakePage::at(Dom::new(), &format!("page-{}", log.opened)))
    }

    async fn close_page(&self, page: &FakePage) -> Result<()> {
        let url = page.state().url.clone();
        self.log().closed_pages.push(url);
        Ok(())
    }

    async fn restore_storage_state(&self, state: &StorageState) -> Result<()> {
        self.log().restored.push(state.clone());
        Ok(())
    }

    async fn storage_state(&self) -> Result<StorageState> {
        self.storage
            .clone()
            .ok_or_else(|| Error::Script("storage is unreadable".to_string()))
    }

    fn download_dir(&self) -> &FsPath {
        self.downloads.path()
    }

    async fn close(self) -> Result<()> {
        self.log().closed = true;
        Ok(())
    }
}

/// [`ResolutionService`] answering from a queue and recording every request
#[derive(Default)]
pub struct FakeService {
    responses: Mutex<VecDeque<Result<Option<Resolution>>>>,
    requests: Mutex<Vec<ResolveRequest>>,
    uploads: Mutex<Vec<(AuthSession, StorageState)>>,
    uploads_fail: bool,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record uploads but answer each with a 503
    pub fn failing_uploads() -> Self {
        Self {
            uploads_fail: true,
            ..Self::default()
        }
    }

    /// Queue an answer; once the queue is empty every call finds nothing
    pub fn push(&self, response: Result<Option<Resolution>>) -> &Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<ResolveRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn uploads(&self) -> Vec<(AuthSession, StorageState)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResolutionService for FakeService {
    async fn resolve(&self, request: ResolveRequest) -> Result<Option<Resolution>> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }

    async fn authenticate(&self, domains: &[String]) -> Result<AuthSession> {
        Ok(fixtures::auth_session(domains))
    }

    async fn upload_auth_session(
        &self,
        session: &AuthSession,
        state: &StorageState,
    ) -> Result<()> {
        self.uploads
            .lock()
            .unwrap()
            .push((session.clone(), state.clone()));
        if self.uploads_fail {
            return Err(Error::Api {
                status: 503,
                body: "storage backend unavailable".to_string(),
            });
        }
        Ok(())
    }
}

/// Retry policy that keeps tests fast
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        delay: Duration::from_millis(10),
        lookup_timeout: Duration::from_millis(50),
    }
}

/// Config with placeholder keys pointing at `api_url`
pub fn test_config(api_url: &str) -> Config {
    let mut config = Config::new("test-api-key", "sk-openai-test", "sk-anthropic-test").unwrap();
    config.api_url = api_url.to_string();
    config.retry = fast_retry();
    config
}

/// A page over `dom` backed by `service`
pub fn fake_page<S: ResolutionService>(dom: Dom, service: Arc<S>) -> (Page<FakePage, S>, FakePage) {
    let driver = FakePage::new(dom);
    let config = test_config("http://127.0.0.1:9/api/v1");
    let page = Page::new(driver.clone(), service, config.llm, config.retry);
    (page, driver)
}

/// A request the stub server received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub endpoint: String,
    pub authorization: Option<String>,
    pub browser_id: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct StubState {
    responses: Mutex<HashMap<String, (u16, String)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Resolution service stand-in listening on an ephemeral local port
///
/// Endpoints without a configured response answer `204 No Content`.
pub struct StubServer {
    pub base_url: String,
    state: Arc<StubState>,
}

impl StubServer {
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());
        let app = Router::new()
            .route("/api/v1/:endpoint", post(handle_stub))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api/v1", addr),
            state,
        }
    }

    pub fn respond(&self, endpoint: &str, status: u16, body: impl Into<String>) {
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), (status, body.into()));
    }

    pub fn respond_json(&self, endpoint: &str, body: Value) {
        self.respond(endpoint, 200, body.to_string());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

async fn handle_stub(
    State(state): State<Arc<StubState>>,
    Path(endpoint): Path<String>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.requests.lock().unwrap().push(RecordedRequest {
        endpoint: endpoint.clone(),
        authorization: header("authorization"),
        browser_id: header("x-browser-id"),
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });

    let (status, text) = state
        .responses
        .lock()
        .unwrap()
        .get(&endpoint)
        .cloned()
        .unwrap_or((204, String::new()));
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        text,
    )
}

/// Documents and canned backend data
pub mod fixtures {
    use super::Dom;
    use webprompt::{AuthSession, StorageState, StoredCookie};

    /// Identifier of `/html[1]/body[1]/button[1]`
    pub const BUTTON_ID: &str = "-4vfmmv";
    /// Identifier of `/html[1]/body[1]/input[1]`
    pub const FIRST_INPUT_ID: &str = "py9mi1";
    /// Identifier of `/html[1]/body[1]/input[2]`
    pub const SECOND_INPUT_ID: &str = "py9miw";

    /// A visible submit button followed by two inputs hidden by CSS
    pub fn hidden_inputs_page() -> Dom {
        let mut dom = Dom::new();
        let button = dom.append(Dom::BODY, "button");
        dom.set_text(button, "Submit");

        let email = dom.append(Dom::BODY, "input");
        dom.set_attr(email, "name", "email");
        dom.set_display(email, "none");

        let token = dom.append(Dom::BODY, "input");
        dom.set_attr(token, "name", "token");
        dom.set_visibility(token, "hidden");
        dom
    }

    /// A list of three links inside `<nav id="menu">`
    pub fn menu_page() -> Dom {
        let mut dom = Dom::new();
        let nav = dom.append(Dom::BODY, "nav");
        dom.set_attr(nav, "id", "menu");
        for (label, href) in [("Home", "/"), ("Docs", "/docs"), ("Blog", "/blog")] {
            let link = dom.append(nav, "a");
            dom.set_attr(link, "href", href);
            dom.set_text(link, label);
        }
        let faded = dom.append(Dom::BODY, "div");
        dom.set_opacity(faded, "0");
        dom.set_text(faded, "Coming soon");
        dom
    }

    pub fn auth_session(domains: &[String]) -> AuthSession {
        AuthSession {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) webprompt-test".to_string(),
            domains: domains.to_vec(),
            storage_state: StorageState {
                cookies: vec![StoredCookie {
                    name: "sid".to_string(),
                    value: "abc123".to_string(),
                    domain: domains.first().cloned().unwrap_or_default(),
                    path: "/".to_string(),
                    secure: true,
                    http_only: true,
                }],
                origins: Vec::new(),
            },
        }
    }
}
