//! Computed-style visibility of identified elements

use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use tracing::debug;

use crate::driver::PageDriver;
use crate::errors::Result;
use crate::identifier::ID_ATTRIBUTE;
use crate::types::ElementId;

/// Samples `display`, `visibility` and `opacity` of every identified element
pub const STYLE_SAMPLES_SCRIPT: &str = r#"
const attr = arguments[0];
const samples = [];
for (const element of document.querySelectorAll(`[${attr}]`)) {
    const style = window.getComputedStyle(element);
    samples.push({
        d_id: element.getAttribute(attr),
        tag: element.tagName.toLowerCase(),
        display: style.display,
        visibility: style.visibility,
        opacity: style.opacity
    });
}
return samples;
"#;

/// Serializes a detached copy of the document without the given elements
pub const PRUNE_SCRIPT: &str = r#"
const attr = arguments[0];
const hidden = new Set(arguments[1]);
const root = document.documentElement.cloneNode(true);
for (const element of Array.from(root.querySelectorAll(`[${attr}]`))) {
    if (hidden.has(element.getAttribute(attr))) {
        element.remove();
    }
}
const doctype = document.doctype
    ? new XMLSerializer().serializeToString(document.doctype)
    : '';
return doctype + root.outerHTML;
"#;

/// Tags whose visibility is never reported
const ROOT_TAGS: &[&str] = &["html", "body"];

/// Computed style of one element
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StyleSample {
    pub d_id: ElementId,
    pub tag: String,
    pub display: String,
    pub visibility: String,
    pub opacity: String,
}

impl StyleSample {
    /// Hidden by `display:none`, `visibility:hidden` or `opacity:0`
    pub fn is_invisible(&self) -> bool {
        if ROOT_TAGS.contains(&self.tag.as_str()) {
            return false;
        }
        self.display == "none" || self.visibility == "hidden" || is_zero_opacity(&self.opacity)
    }
}

fn is_zero_opacity(opacity: &str) -> bool {
    opacity.trim().parse::<f64>().map(|o| o == 0.0).unwrap_or(false)
}

/// Identifiers of the elements in `samples` that are invisible
pub fn invisible_in(samples: &[StyleSample]) -> HashSet<ElementId> {
    samples
        .iter()
        .filter(|s| s.is_invisible())
        .map(|s| s.d_id.clone())
        .collect()
}

/// Identifiers of every currently invisible element on the page
pub async fn invisible_ids<D: PageDriver>(driver: &D) -> Result<HashSet<ElementId>> {
    let value = driver
        .evaluate(STYLE_SAMPLES_SCRIPT, vec![json!(ID_ATTRIBUTE)])
        .await?;
    let samples: Vec<StyleSample> = serde_json::from_value(value)?;
    let hidden = invisible_in(&samples);
    debug!(
        "{} of {} identified elements are invisible",
        hidden.len(),
        samples.len()
    );
    Ok(hidden)
}

/// Page HTML with the `hidden` elements (and their subtrees) removed
///
/// The live DOM is left untouched.
pub async fn prune_invisible<D: PageDriver>(
    driver: &D,
    hidden: &HashSet<ElementId>,
) -> Result<String> {
    if hidden.is_empty() {
        return driver.content().await;
    }

    let mut ids: Vec<&str> = hidden.iter().map(|id| id.as_str()).collect();
    ids.sort_unstable();

    let value = driver
        .evaluate(PRUNE_SCRIPT, vec![json!(ID_ATTRIBUTE), json!(ids)])
        .await?;
    match value {
        serde_json::Value::String(html) => Ok(html),
        other => Err(crate::Error::Script(format!(
            "expected pruned HTML, got {}",
            other
        ))),
    }
}

#[cfg(test)]
#[path = "visibility_test.rs"]
mod visibility_test;
