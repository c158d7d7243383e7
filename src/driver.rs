//! The seams between page-level logic and the browser engine

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::BrowserOptions;
use crate::errors::Result;
use crate::types::StorageState;

/// Operations a page needs from the browser engine
///
/// Scripts follow WebDriver "execute script" conventions: the source is a
/// function body, arguments arrive as `arguments[n]`, and the result is
/// whatever the body `return`s.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Live element handle produced by lookups
    type Element: Clone + Send + Sync;

    /// Current page URL
    async fn url(&self) -> Result<String>;

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Wait until `document.readyState` is `complete`
    async fn wait_for_load(&self, timeout: Duration) -> Result<()>;

    async fn evaluate(&self, script: &str, args: Vec<Value>) -> Result<Value>;

    /// Serialized HTML of the current document
    async fn content(&self) -> Result<String>;

    /// PNG bytes of the whole page
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// First element matching `xpath`, waiting up to `timeout` for one to appear
    async fn wait_for_xpath(&self, xpath: &str, timeout: Duration) -> Result<Self::Element>;

    /// All elements matching a CSS selector, waiting up to `timeout` for at least one
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<Self::Element>>;

    /// Click `element` with this page focused
    async fn click(&self, element: &Self::Element) -> Result<()>;

    /// Replace the value of a text field with `text`
    async fn type_text(&self, element: &Self::Element, text: &str) -> Result<()>;

    /// Select `paths` in a file input; they must be absolute
    async fn set_input_files(&self, element: &Self::Element, paths: &[PathBuf]) -> Result<()>;
}

/// One running browser and the pages it owns
#[async_trait]
pub trait BrowserSession: Send + Sync + Sized + 'static {
    type Page: PageDriver + 'static;

    /// Start a browser, sending `user_agent` instead of its own when given
    async fn connect(options: &BrowserOptions, user_agent: Option<&str>) -> Result<Self>;

    /// The page the browser opened with
    async fn initial_page(&self) -> Result<Self::Page>;

    /// Open a new tab
    async fn open_page(&self) -> Result<Self::Page>;

    async fn close_page(&self, page: &Self::Page) -> Result<()>;

    /// Load cookies and localStorage into the browser
    async fn restore_storage_state(&self, state: &StorageState) -> Result<()>;

    /// Cookies and localStorage of every open page
    async fn storage_state(&self) -> Result<StorageState>;

    /// Directory the browser saves downloads into
    fn download_dir(&self) -> &Path;

    async fn close(self) -> Result<()>;
}
