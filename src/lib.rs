//! # webprompt
//!
//! Browser automation driven by natural-language prompts.
//!
//! A page is tagged with stable per-element identifiers, captured as a
//! snapshot (HTML, interactive elements, full-page screenshot) and sent with
//! a prompt to a remote resolution service. The service answers with the
//! identifiers, selector or data the prompt refers to, and the answer is
//! resolved back to live WebDriver elements.
//!
//! ## CLI Usage
//!
//! ```bash
//! export WEBPROMPT_API_KEY=... OPENAI_API_KEY=... ANTHROPIC_API_KEY=...
//!
//! # Find the element a prompt describes
//! webprompt locate "https://example.com" "the sign in button"
//!
//! # Every matching element, or a CSS selector for them
//! webprompt locate "https://news.ycombinator.com" "story links" --all
//! webprompt locate "https://news.ycombinator.com" "story links" --selector
//!
//! # Extract data, optionally following a JSON schema
//! webprompt scrape "https://example.com" "the page title and first paragraph"
//! webprompt scrape "https://shop.com/item" "price" --schema price.schema.json
//!
//! # Ask a question about the page
//! webprompt ask "https://example.com" "is this a login page?"
//!
//! # Dump what the service would see
//! webprompt snapshot "https://example.com" --visible-only --screenshot page.png
//!
//! # Keep cookies and localStorage between runs
//! webprompt --session work locate "https://app.com" "the dashboard link"
//! webprompt sessions list
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use webprompt::{AgentBrowser, Config, GotoOptions};
//!
//! # async fn example() -> webprompt::Result<()> {
//! let mut browser = AgentBrowser::new(Config::from_env()?)?;
//!
//! let page = browser.goto("https://example.com", GotoOptions::default()).await?;
//! let link = page.get_interactable_element("the more information link").await?;
//! page.click(&link).await?;
//!
//! let title = page.scrape("the page heading", Default::default()).await?;
//! println!("{}", title);
//!
//! browser.close().await?;
//! # Ok(())
//! # }
//! ```

#![allow(clippy::uninlined_format_args)]

/// Client for the remote resolution service
pub mod api_client;

/// Browser lifecycle and pages
pub mod browser;

pub mod config;

/// Waiting for files the browser downloads
pub mod downloads;

/// The traits page and browser logic use to talk to the browser engine
pub mod driver;

pub mod errors;

/// Structural element identifiers
pub mod identifier;

pub mod page;

pub mod page_manager;

/// Bounded retry of resolution attempts
pub mod retry;

/// Named storage states on disk
pub mod session_store;

pub mod snapshot;

pub mod types;

pub mod visibility;

/// WebDriver-backed sessions and pages
pub mod webdriver;

/// Automatic WebDriver process management
pub mod webdriver_manager;

pub use api_client::{AskAnswer, HttpApiClient, QueryKind, ResolutionService, ResolveRequest};
pub use browser::{AgentBrowser, BrowserPage, GotoOptions};
pub use config::{BrowserOptions, Config, Credentials, LlmConfig};
pub use driver::{BrowserSession, PageDriver};
pub use errors::{Error, Result};
pub use page::{Page, ResolvedElement, ScrapeOptions, SelectorMatch};
pub use retry::RetryPolicy;
pub use session_store::SessionStore;
pub use snapshot::HtmlMode;
pub use types::{
    AuthSession, BrowserType, ElementId, InteractiveElement, PageSnapshot, Resolution,
    StorageState, StoredCookie, ViewportSize,
};
