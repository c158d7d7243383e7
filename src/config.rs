//! Configuration for the browser, its credentials and the resolution service

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{Error, Result};
use crate::retry::RetryPolicy;
use crate::types::{BrowserType, ViewportSize};

pub const API_KEY_VAR: &str = "WEBPROMPT_API_KEY";
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const ANTHROPIC_API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const API_URL_VAR: &str = "WEBPROMPT_API_URL";
pub const BROWSER_VAR: &str = "WEBPROMPT_BROWSER";
pub const HEADLESS_VAR: &str = "WEBPROMPT_HEADLESS";
pub const WEBDRIVER_URL_VAR: &str = "WEBPROMPT_WEBDRIVER_URL";

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/v1";

/// Chrome flags that keep pages from noticing automation
pub const STEALTH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--no-first-run",
    "--no-default-browser-check",
];

/// Model-provider keys forwarded with every resolution request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LlmConfig {
    pub openai_api_key: String,
    pub anthropic_api_key: String,
}

/// How the browser engine is started
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub browser_type: BrowserType,
    pub headless: bool,
    pub viewport: Option<ViewportSize>,
    /// Extra command-line arguments for the browser binary
    pub args: Vec<String>,
    /// Connect to this WebDriver server instead of managing one
    pub webdriver_url: Option<String>,
    /// Restore and save storage state under this name in the local session store
    pub session_name: Option<String>,
    /// Session store directory; `~/.webprompt/sessions` when `None`
    pub session_dir: Option<PathBuf>,
    pub navigation_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            browser_type: BrowserType::Chrome,
            headless: false,
            viewport: None,
            args: STEALTH_ARGS.iter().map(|s| s.to_string()).collect(),
            webdriver_url: None,
            session_name: None,
            session_dir: None,
            navigation_timeout: Duration::from_secs(15),
        }
    }
}

/// Credentials given explicitly by the caller; empty strings count as absent
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

/// Everything needed to construct a browser
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend key for the resolution service
    pub api_key: String,
    pub llm: LlmConfig,
    pub api_url: String,
    pub browser: BrowserOptions,
    pub retry: RetryPolicy,
}

impl Config {
    /// Build a config from explicit keys, failing if any is empty
    pub fn new(
        api_key: impl Into<String>,
        openai_api_key: impl Into<String>,
        anthropic_api_key: impl Into<String>,
    ) -> Result<Self> {
        let config = Config {
            api_key: api_key.into(),
            llm: LlmConfig {
                openai_api_key: openai_api_key.into(),
                anthropic_api_key: anthropic_api_key.into(),
            },
            api_url: DEFAULT_API_URL.to_string(),
            browser: BrowserOptions::default(),
            retry: RetryPolicy::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Build a config from the process environment
    pub fn from_env() -> Result<Self> {
        Self::load(Credentials::default(), |key| std::env::var(key).ok())
    }

    /// Build a config from an environment-style lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::load(Credentials::default(), lookup)
    }

    /// Explicit credentials win; missing ones fall back to `lookup`
    pub fn load<F>(explicit: Credentials, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |given: Option<String>, var: &str| -> Option<String> {
            given
                .filter(|v| !v.trim().is_empty())
                .or_else(|| lookup(var).filter(|v| !v.trim().is_empty()))
        };

        let api_key = pick(explicit.api_key, API_KEY_VAR)
            .ok_or_else(|| Error::config("Backend API key is required to use the browser"))?;
        let anthropic_api_key = pick(explicit.anthropic_api_key, ANTHROPIC_API_KEY_VAR)
            .ok_or_else(|| Error::config("Anthropic API key is required to use the browser"))?;
        let openai_api_key = pick(explicit.openai_api_key, OPENAI_API_KEY_VAR)
            .ok_or_else(|| Error::config("OpenAI API key is required to use the browser"))?;

        let mut config = Config::new(api_key, openai_api_key, anthropic_api_key)?;

        if let Some(url) = lookup(API_URL_VAR).filter(|v| !v.is_empty()) {
            config.api_url = url;
        }
        if let Some(browser) = lookup(BROWSER_VAR).filter(|v| !v.is_empty()) {
            config.browser.browser_type = browser.parse()?;
        }
        if let Some(headless) = lookup(HEADLESS_VAR) {
            config.browser.headless = matches!(
                headless.to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(url) = lookup(WEBDRIVER_URL_VAR).filter(|v| !v.is_empty()) {
            config.browser.webdriver_url = Some(url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that every required value is present and well formed
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::config(
                "Backend API key is required to use the browser",
            ));
        }
        if self.llm.anthropic_api_key.trim().is_empty() {
            return Err(Error::config(
                "Anthropic API key is required to use the browser",
            ));
        }
        if self.llm.openai_api_key.trim().is_empty() {
            return Err(Error::config(
                "OpenAI API key is required to use the browser",
            ));
        }

        url::Url::parse(&self.api_url)
            .map_err(|e| Error::config(format!("Invalid API URL '{}': {}", self.api_url, e)))?;

        if self.retry.max_retries == 0 {
            return Err(Error::config("max_retries must be at least 1"));
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
