//! Page snapshots sent to the resolution service

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use tracing::debug;

use crate::driver::PageDriver;
use crate::errors::Result;
use crate::identifier::{self, ID_ATTRIBUTE};
use crate::types::{InteractiveElement, PageSnapshot};
use crate::visibility;

/// Which HTML goes into a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HtmlMode {
    /// The whole document
    #[default]
    Raw,
    /// The document without invisible elements
    VisibleOnly,
}

/// Describes identified elements a user can interact with
pub const INTERACTIVE_ELEMENTS_SCRIPT: &str = r#"
const attr = arguments[0];
const selector = [
    'a[href]', 'button', 'input', 'select', 'textarea', 'summary', 'label[for]',
    '[role="button"]', '[role="link"]', '[role="checkbox"]', '[role="radio"]',
    '[role="tab"]', '[role="menuitem"]', '[role="option"]', '[role="switch"]',
    '[role="textbox"]', '[role="combobox"]', '[onclick]',
    '[contenteditable=""]', '[contenteditable="true"]',
    '[tabindex]:not([tabindex="-1"])'
].join(',');
const keep = ['id', 'name', 'type', 'placeholder', 'aria-label', 'title', 'href', 'value', 'alt', 'for'];

const elements = [];
for (const element of document.querySelectorAll(selector)) {
    const id = element.getAttribute(attr);
    if (!id) continue;
    const attributes = {};
    for (const name of keep) {
        const value = element.getAttribute(name);
        if (value !== null && value !== '') attributes[name] = value.slice(0, 200);
    }
    const text = (element.innerText || element.textContent || '')
        .replace(/\s+/g, ' ')
        .trim()
        .slice(0, 200);
    elements.push({
        d_id: id,
        tag: element.tagName.toLowerCase(),
        role: element.getAttribute('role'),
        attributes: attributes,
        text: text
    });
}
return elements;
"#;

/// Interactive elements that currently carry an identifier
pub async fn interactive_elements<D: PageDriver>(driver: &D) -> Result<Vec<InteractiveElement>> {
    let value = driver
        .evaluate(INTERACTIVE_ELEMENTS_SCRIPT, vec![json!(ID_ATTRIBUTE)])
        .await?;
    Ok(serde_json::from_value(value)?)
}

/// Full-page screenshot as base64 PNG
pub async fn screenshot_base64<D: PageDriver>(driver: &D) -> Result<String> {
    let png = driver.screenshot().await?;
    Ok(STANDARD.encode(png))
}

/// Capture a fresh snapshot of the page
///
/// Regenerates identifiers first, so the live DOM keeps the new `d-id`
/// attributes afterwards.
pub async fn build<D: PageDriver>(driver: &D, mode: HtmlMode) -> Result<PageSnapshot> {
    identifier::generate_ids(driver).await;

    let raw_html = match mode {
        HtmlMode::Raw => driver.content().await?,
        HtmlMode::VisibleOnly => {
            let hidden = visibility::invisible_ids(driver).await?;
            visibility::prune_invisible(driver, &hidden).await?
        }
    };

    let interactable_element_info = interactive_elements(driver).await?;
    let screenshot_base64 = screenshot_base64(driver).await?;
    let url = driver.url().await?;

    debug!(
        "Snapshot of {}: {} bytes of HTML, {} interactive elements",
        url,
        raw_html.len(),
        interactable_element_info.len()
    );

    Ok(PageSnapshot {
        url,
        raw_html,
        interactable_element_info,
        screenshot_base64,
    })
}
