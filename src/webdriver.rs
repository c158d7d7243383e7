use async_trait::async_trait;
use fantoccini::cookies::Cookie;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::wd::WindowHandle;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::config::BrowserOptions;
use crate::driver::{BrowserSession, PageDriver};
use crate::errors::{Error, Result};
use crate::types::{BrowserType, OriginState, StorageState, StoredCookie};
use crate::webdriver_manager::GLOBAL_WEBDRIVER_MANAGER;

const READY_POLL: Duration = Duration::from_millis(100);
const MAX_SCREENSHOT_HEIGHT: u64 = 16_384;

const PAGE_SIZE_SCRIPT: &str = r#"
const doc = document.documentElement;
const body = document.body || doc;
return [
    Math.max(doc.scrollWidth, body.scrollWidth, window.innerWidth),
    Math.max(doc.scrollHeight, body.scrollHeight, window.innerHeight),
    window.outerWidth - window.innerWidth,
    window.outerHeight - window.innerHeight
];
"#;

const READ_LOCAL_STORAGE_SCRIPT: &str = r#"
const entries = [];
for (let i = 0; i < window.localStorage.length; i++) {
    const name = window.localStorage.key(i);
    entries.push({ name: name, value: window.localStorage.getItem(name) });
}
return { origin: window.location.origin, localStorage: entries };
"#;

const WRITE_LOCAL_STORAGE_SCRIPT: &str = r#"
for (const entry of arguments[0]) {
    window.localStorage.setItem(entry.name, entry.value);
}
"#;

/// Window that currently has WebDriver focus, shared by every page of a session
type Focus = Arc<Mutex<Option<WindowHandle>>>;

/// Content types Firefox saves without asking
const SAVE_WITHOUT_ASKING: &str = "application/octet-stream,application/pdf,application/zip,\
text/csv,text/plain,application/json,application/vnd.ms-excel,\
application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// One WebDriver session: a browser process with its own temporary profile
/// and download directory
pub struct WebDriverSession {
    client: Client,
    browser_type: BrowserType,
    focus: Focus,
    _profile_dir: TempDir,
    download_dir: TempDir,
}

/// Capabilities for a new session
pub fn capabilities(
    options: &BrowserOptions,
    user_agent: Option<&str>,
    profile_dir: &Path,
    download_dir: &Path,
) -> serde_json::Map<String, Value> {
    let mut caps = serde_json::Map::new();

    match options.browser_type {
        BrowserType::Firefox => {
            let mut args = Vec::new();
            if options.headless {
                args.push("--headless".to_string());
            }
            if let Some(vp) = &options.viewport {
                args.push(format!("--width={}", vp.width));
                args.push(format!("--height={}", vp.height));
            }
            args.push("-profile".to_string());
            args.push(profile_dir.display().to_string());

            let mut prefs = serde_json::Map::new();
            prefs.insert(
                "browser.download.dir".to_string(),
                json!(download_dir.display().to_string()),
            );
            prefs.insert("browser.download.folderList".to_string(), json!(2));
            prefs.insert("browser.download.useDownloadDir".to_string(), json!(true));
            prefs.insert(
                "browser.helperApps.neverAsk.saveToDisk".to_string(),
                json!(SAVE_WITHOUT_ASKING),
            );
            prefs.insert("pdfjs.disabled".to_string(), json!(true));
            if let Some(ua) = user_agent {
                prefs.insert("general.useragent.override".to_string(), json!(ua));
            }

            caps.insert(
                "moz:firefoxOptions".to_string(),
                json!({ "args": args, "prefs": prefs }),
            );
        }
        BrowserType::Chrome => {
            let mut args = vec!["--no-sandbox".to_string()];
            if options.headless {
                args.push("--headless=new".to_string());
                args.push("--disable-gpu".to_string());
                args.push("--disable-dev-shm-usage".to_string());
            }
            if let Some(vp) = &options.viewport {
                args.push(format!("--window-size={},{}", vp.width, vp.height));
            }
            if let Some(ua) = user_agent {
                args.push(format!("--user-agent={}", ua));
            }
            args.extend(options.args.iter().cloned());
            args.push(format!("--user-data-dir={}", profile_dir.display()));

            caps.insert(
                "goog:chromeOptions".to_string(),
                json!({
                    "args": args,
                    "excludeSwitches": ["enable-automation"],
                    "prefs": {
                        "download.default_directory": download_dir.display().to_string(),
                        "download.prompt_for_download": false,
                        "download.directory_upgrade": true,
                        "plugins.always_open_pdf_externally": true,
                    },
                }),
            );
        }
    }

    caps
}

impl WebDriverSession {
    pub fn browser_type(&self) -> BrowserType {
        self.browser_type
    }

    fn page_for(&self, handle: WindowHandle) -> WebDriverPage {
        WebDriverPage {
            client: self.client.clone(),
            handle,
            focus: self.focus.clone(),
        }
    }

    async fn restore_into_current_window(&self, state: &StorageState) -> Result<()> {
        for origin in state.restore_origins() {
            debug!("Restoring storage for {}", origin);
            if let Err(e) = self.client.goto(&origin).await {
                warn!("Could not open {} to restore its storage: {}", origin, e);
                continue;
            }

            let host = url::Url::parse(&origin)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_default();

            for cookie in state.cookies.iter().filter(|c| c.matches_host(&host)) {
                if let Err(e) = self.client.add_cookie(to_webdriver_cookie(cookie)).await {
                    warn!("Could not restore cookie {}: {}", cookie.name, e);
                }
            }

            if let Some(entries) = state
                .origins
                .iter()
                .find(|o| o.origin == origin)
                .map(|o| &o.local_storage)
                && !entries.is_empty()
            {
                self.client
                    .execute(WRITE_LOCAL_STORAGE_SCRIPT, vec![serde_json::to_value(entries)?])
                    .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    type Page = WebDriverPage;

    /// Start a browser through WebDriver
    ///
    /// Uses `options.webdriver_url` when given, otherwise a server from the
    /// global manager (started on demand).
    async fn connect(options: &BrowserOptions, user_agent: Option<&str>) -> Result<Self> {
        let browser_type = options.browser_type;
        info!("Launching {:?}", browser_type);

        let managed = options.webdriver_url.is_none();
        let webdriver_url = match &options.webdriver_url {
            Some(url) => url.clone(),
            None => GLOBAL_WEBDRIVER_MANAGER.ensure_driver(&browser_type).await?,
        };

        let prefix = format!("webprompt-{}-", format!("{:?}", browser_type).to_lowercase());
        let profile_dir = tempfile::Builder::new().prefix(&prefix).tempdir()?;
        let download_dir = tempfile::Builder::new()
            .prefix("webprompt-downloads-")
            .tempdir()?;
        let caps = capabilities(options, user_agent, profile_dir.path(), download_dir.path());

        debug!("Connecting to WebDriver at {}", webdriver_url);
        let client = match ClientBuilder::rustls()
            .capabilities(caps.clone())
            .connect(&webdriver_url)
            .await
        {
            Ok(client) => client,
            Err(e) if managed && e.to_string().contains("session not created") => {
                warn!("WebDriver refused the session, restarting it: {}", e);
                GLOBAL_WEBDRIVER_MANAGER.kill_driver(&browser_type);
                tokio::time::sleep(Duration::from_millis(500)).await;
                let url = GLOBAL_WEBDRIVER_MANAGER.ensure_driver(&browser_type).await?;
                ClientBuilder::rustls()
                    .capabilities(caps)
                    .connect(&url)
                    .await?
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(vp) = options.viewport
            && let Err(e) = client.set_window_size(vp.width, vp.height).await
        {
            debug!("Could not set window size: {}", e);
        }

        let handle = client.window().await?;

        Ok(Self {
            client,
            browser_type,
            focus: Arc::new(Mutex::new(Some(handle))),
            _profile_dir: profile_dir,
            download_dir,
        })
    }

    async fn initial_page(&self) -> Result<WebDriverPage> {
        let focus = self.focus.lock().await;
        let handle = match focus.as_ref() {
            Some(handle) => handle.clone(),
            None => self.client.window().await?,
        };
        drop(focus);
        Ok(self.page_for(handle))
    }

    /// Open a new tab and focus it
    async fn open_page(&self) -> Result<WebDriverPage> {
        let mut focus = self.focus.lock().await;
        let window = self.client.new_window(true).await?;
        self.client.switch_to_window(window.handle.clone()).await?;
        *focus = Some(window.handle.clone());
        debug!("Opened new tab");
        Ok(self.page_for(window.handle))
    }

    async fn close_page(&self, page: &WebDriverPage) -> Result<()> {
        page.close().await
    }

    /// WebDriver only accepts cookies for the current document's domain, so
    /// each origin is visited in a scratch tab which is closed afterwards.
    async fn restore_storage_state(&self, state: &StorageState) -> Result<()> {
        if state.is_empty() {
            return Ok(());
        }

        let mut focus = self.focus.lock().await;
        let previous = (*focus).clone();

        let scratch = self.client.new_window(true).await?;
        self.client.switch_to_window(scratch.handle.clone()).await?;
        *focus = Some(scratch.handle.clone());

        let result = self.restore_into_current_window(state).await;

        self.client.close_window().await?;
        if let Some(handle) = previous.clone() {
            self.client.switch_to_window(handle).await?;
        }
        *focus = previous;

        result
    }

    async fn storage_state(&self) -> Result<StorageState> {
        let mut focus = self.focus.lock().await;
        let previous = (*focus).clone();
        let mut state = StorageState::default();

        for handle in self.client.windows().await? {
            self.client.switch_to_window(handle.clone()).await?;
            *focus = Some(handle);

            let cookies = self
                .client
                .get_all_cookies()
                .await?
                .iter()
                .map(from_webdriver_cookie)
                .collect();

            let origins = match self.client.execute(READ_LOCAL_STORAGE_SCRIPT, vec![]).await {
                Ok(value) => serde_json::from_value::<OriginState>(value)
                    .ok()
                    .filter(|o| o.origin.starts_with("http") && !o.local_storage.is_empty())
                    .into_iter()
                    .collect(),
                Err(e) => {
                    debug!("Could not read localStorage: {}", e);
                    Vec::new()
                }
            };

            state.merge(StorageState { cookies, origins });
        }

        if let Some(handle) = previous.clone() {
            self.client.switch_to_window(handle).await?;
            *focus = previous;
        }

        Ok(state)
    }

    fn download_dir(&self) -> &Path {
        self.download_dir.path()
    }

    async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}

fn to_webdriver_cookie(cookie: &StoredCookie) -> Cookie<'static> {
    let mut out = Cookie::new(cookie.name.clone(), cookie.value.clone());
    if !cookie.domain.is_empty() {
        out.set_domain(cookie.domain.clone());
    }
    out.set_path(cookie.path.clone());
    out.set_secure(cookie.secure);
    out.set_http_only(cookie.http_only);
    out
}

fn from_webdriver_cookie(cookie: &Cookie<'static>) -> StoredCookie {
    StoredCookie {
        name: cookie.name().to_string(),
        value: cookie.value().to_string(),
        domain: cookie.domain().unwrap_or_default().to_string(),
        path: cookie.path().unwrap_or("/").to_string(),
        secure: cookie.secure().unwrap_or(false),
        http_only: cookie.http_only().unwrap_or(false),
    }
}

/// One tab of a [`WebDriverSession`]
#[derive(Clone)]
pub struct WebDriverPage {
    client: Client,
    handle: WindowHandle,
    focus: Focus,
}

impl WebDriverPage {
    /// Switch WebDriver to this tab, holding focus until the guard drops
    async fn focused(&self) -> Result<MutexGuard<'_, Option<WindowHandle>>> {
        let mut focus = self.focus.lock().await;
        if focus.as_ref() != Some(&self.handle) {
            self.client.switch_to_window(self.handle.clone()).await?;
            *focus = Some(self.handle.clone());
        }
        Ok(focus)
    }

    /// Close this tab
    pub async fn close(&self) -> Result<()> {
        let mut focus = self.focused().await?;
        self.client.close_window().await?;
        *focus = None;
        Ok(())
    }

    async fn full_page_screenshot(&self) -> Result<Vec<u8>> {
        let dims: Vec<i64> = serde_json::from_value(
            self.client.execute(PAGE_SIZE_SCRIPT, vec![]).await?,
        )?;
        let &[width, height, chrome_w, chrome_h] = dims.as_slice() else {
            return Err(Error::Script(format!("unexpected page size {:?}", dims)));
        };
        let [width, height, chrome_w, chrome_h] =
            [width, height, chrome_w, chrome_h].map(|v| v.max(0) as u64);

        let (orig_w, orig_h) = self.client.get_window_size().await?;
        let target_w = (width + chrome_w) as u32;
        let target_h = (height.min(MAX_SCREENSHOT_HEIGHT) + chrome_h) as u32;

        self.client.set_window_size(target_w, target_h).await?;
        let png = self.client.screenshot().await;
        if let Err(e) = self
            .client
            .set_window_size(orig_w as u32, orig_h as u32)
            .await
        {
            debug!("Could not restore window size: {}", e);
        }
        Ok(png?)
    }
}

fn lookup_error(what: &str, timeout: Duration, e: CmdError) -> Error {
    match e {
        CmdError::WaitTimeout => Error::Timeout(format!("{} not found within {:?}", what, timeout)),
        e if e.is_miss() => Error::ElementNotFound(what.to_string()),
        e => Error::WebDriver(e),
    }
}

#[async_trait]
impl PageDriver for WebDriverPage {
    type Element = Element;

    async fn url(&self) -> Result<String> {
        let _focus = self.focused().await?;
        Ok(self.client.current_url().await?.to_string())
    }

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        let _focus = self.focused().await?;
        debug!("Navigating to {}", url);
        match tokio::time::timeout(timeout, self.client.goto(url)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(Error::Timeout(format!(
                "loading {} took longer than {:?}",
                url, timeout
            ))),
        }
    }

    async fn wait_for_load(&self, timeout: Duration) -> Result<()> {
        let _focus = self.focused().await?;
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let state = self
                .client
                .execute("return document.readyState;", vec![])
                .await?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::Timeout(format!(
                    "page still '{}' after {:?}",
                    state.as_str().unwrap_or("unknown"),
                    timeout
                )));
            }
            tokio::time::sleep(READY_POLL).await;
        }
    }

    async fn evaluate(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        let _focus = self.focused().await?;
        Ok(self.client.execute(script, args).await?)
    }

    async fn content(&self) -> Result<String> {
        let _focus = self.focused().await?;
        Ok(self.client.source().await?)
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let _focus = self.focused().await?;
        match self.full_page_screenshot().await {
            Ok(png) => Ok(png),
            Err(e) => {
                debug!("Full-page screenshot failed, using the viewport: {}", e);
                Ok(self.client.screenshot().await?)
            }
        }
    }

    async fn wait_for_xpath(&self, xpath: &str, timeout: Duration) -> Result<Element> {
        let _focus = self.focused().await?;
        self.client
            .wait()
            .at_most(timeout)
            .for_element(Locator::XPath(xpath))
            .await
            .map_err(|e| lookup_error(xpath, timeout, e))
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<Vec<Element>> {
        let _focus = self.focused().await?;
        self.client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
            .map_err(|e| lookup_error(selector, timeout, e))?;
        Ok(self.client.find_all(Locator::Css(selector)).await?)
    }

    async fn click(&self, element: &Element) -> Result<()> {
        let _focus = self.focused().await?;
        Ok(element.click().await?)
    }

    async fn type_text(&self, element: &Element, text: &str) -> Result<()> {
        let _focus = self.focused().await?;
        element.clear().await?;
        Ok(element.send_keys(text).await?)
    }

    /// Several paths go to a `multiple` input as newline-separated keys
    async fn set_input_files(&self, element: &Element, paths: &[PathBuf]) -> Result<()> {
        let _focus = self.focused().await?;
        let keys = paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(element.send_keys(&keys).await?)
    }
}

#[cfg(test)]
#[path = "webdriver_test.rs"]
mod webdriver_test;
