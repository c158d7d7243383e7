use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{Error, Result};

/// Supported browser types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserType {
    /// Mozilla Firefox
    Firefox,
    /// Google Chrome/Chromium
    #[default]
    Chrome,
}

impl std::str::FromStr for BrowserType {
    type Err = Error;

    /// Parse browser type from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "firefox" => Ok(BrowserType::Firefox),
            "chrome" | "chromium" => Ok(BrowserType::Chrome),
            _ => Err(Error::config(format!("Unsupported browser: {}", s))),
        }
    }
}

impl BrowserType {
    /// Name of the WebDriver server binary for this browser
    pub fn driver_binary(&self) -> &'static str {
        match self {
            BrowserType::Firefox => "geckodriver",
            BrowserType::Chrome => "chromedriver",
        }
    }
}

/// Browser viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
}

impl ViewportSize {
    /// Parse viewport size from "WIDTHxHEIGHT" format (e.g., "1920x1080")
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('x').collect();
        if parts.len() != 2 {
            return Err(Error::config(
                "Invalid viewport format. Use WIDTHxHEIGHT (e.g., 1920x1080)",
            ));
        }

        let width = parts[0]
            .parse::<u32>()
            .map_err(|_| Error::config("Invalid width in viewport size"))?;
        let height = parts[1]
            .parse::<u32>()
            .map_err(|_| Error::config("Invalid height in viewport size"))?;

        Ok(ViewportSize { width, height })
    }
}

/// Identifier written to the `d-id` attribute of every element
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        ElementId(id.into())
    }

    /// Identifier the generation script assigns to an element with this structural path
    pub fn from_path(path: &str) -> Self {
        ElementId(crate::identifier::hash_path(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// XPath selecting the element that carries this identifier
    pub fn xpath(&self) -> String {
        format!(
            "//*[@{}='{}']",
            crate::identifier::ID_ATTRIBUTE,
            self.0
        )
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        ElementId::new(id)
    }
}

/// An interactive element the remote service can choose from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractiveElement {
    pub d_id: ElementId,
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Selected attributes (name, type, placeholder, aria-label, href, ...)
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Trimmed text content, truncated
    #[serde(default)]
    pub text: String,
}

/// Everything the remote service sees of a page at one point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub raw_html: String,
    pub interactable_element_info: Vec<InteractiveElement>,
    pub screenshot_base64: String,
}

/// What the remote service resolved a prompt to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Resolution {
    Element(ElementId),
    Elements(Vec<ElementId>),
    Selector(String),
    Data(serde_json::Value),
}

impl Resolution {
    /// Whether this counts as "no match"
    pub fn is_empty(&self) -> bool {
        match self {
            Resolution::Element(id) => id.is_empty(),
            Resolution::Elements(ids) => ids.is_empty(),
            Resolution::Selector(selector) => selector.trim().is_empty(),
            Resolution::Data(value) => value.is_null(),
        }
    }
}

/// A cookie as stored in a storage state file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

impl StoredCookie {
    /// Whether the cookie is sent to `host`
    pub fn matches_host(&self, host: &str) -> bool {
        let domain = self.domain.trim_start_matches('.');
        !domain.is_empty() && (host == domain || host.ends_with(&format!(".{}", domain)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalStorageEntry {
    pub name: String,
    pub value: String,
}

/// localStorage contents of one origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginState {
    pub origin: String,
    #[serde(default)]
    pub local_storage: Vec<LocalStorageEntry>,
}

/// Serialized session data: cookies plus per-origin localStorage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageState {
    #[serde(default)]
    pub cookies: Vec<StoredCookie>,
    #[serde(default)]
    pub origins: Vec<OriginState>,
}

impl StorageState {
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.origins.is_empty()
    }

    /// Merge `other` into `self`, later values replacing earlier ones
    pub fn merge(&mut self, other: StorageState) {
        for cookie in other.cookies {
            self.cookies.retain(|c| {
                !(c.name == cookie.name && c.domain == cookie.domain && c.path == cookie.path)
            });
            self.cookies.push(cookie);
        }
        for origin in other.origins {
            self.origins.retain(|o| o.origin != origin.origin);
            self.origins.push(origin);
        }
    }

    /// Origins that need a visit to restore this state
    pub fn restore_origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = self.origins.iter().map(|o| o.origin.clone()).collect();
        for cookie in &self.cookies {
            let host = cookie.domain.trim_start_matches('.');
            if host.is_empty() {
                continue;
            }
            let already = origins.iter().any(|origin| {
                url::Url::parse(origin)
                    .ok()
                    .and_then(|u| u.host_str().map(|h| cookie.matches_host(h)))
                    .unwrap_or(false)
            });
            if !already {
                let scheme = if cookie.secure { "https" } else { "http" };
                origins.push(format!("{}://{}", scheme, host));
            }
        }
        origins
    }
}

/// Session issued by the backend for a set of domains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_agent: String,
    pub domains: Vec<String>,
    #[serde(default)]
    pub storage_state: StorageState,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
