//! Structural element identifiers
//!
//! Every element gets a `d-id` attribute whose value is a hash of its
//! structural path from the document root. The path uses `id("...")` for
//! the nearest ancestor-or-self with a document-unique id, and
//! `tag[n]` segments (n = 1-based index among same-tag siblings) otherwise,
//! so `/html[1]/body[1]/div[2]` or `id("main")/ul[1]/li[3]`.

use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::driver::PageDriver;
use crate::errors::Result;

/// Attribute holding the identifier
pub const ID_ATTRIBUTE: &str = "d-id";

const GENERATION_ATTEMPTS: u32 = 3;
const LOAD_TIMEOUT: Duration = Duration::from_secs(3);

/// Tags every element with its identifier. Returns `{tagged, collisions}`.
pub const GENERATE_IDS_SCRIPT: &str = r#"
const attr = arguments[0];

const hashCode = (string) => {
    let hash = 0;
    for (let i = 0; i < string.length; i++) {
        hash = ((hash << 5) - hash) + string.charCodeAt(i);
        hash |= 0;
    }
    return hash;
};

const siblingIndex = (element) => {
    let index = 1;
    for (let sib = element.previousElementSibling; sib; sib = sib.previousElementSibling) {
        if (sib.localName === element.localName) index++;
    }
    return index;
};

const pathOf = (element) => {
    const segments = [];
    for (let node = element; node && node.nodeType === 1; node = node.parentNode) {
        if (node.id && document.getElementById(node.id) === node) {
            segments.unshift(`id("${node.id}")`);
            return segments.join('/');
        }
        segments.unshift(`${node.localName.toLowerCase()}[${siblingIndex(node)}]`);
    }
    segments.unshift('');
    return segments.join('/');
};

const elements = Array.from(document.querySelectorAll('*'));
const ids = elements.map((element) => hashCode(pathOf(element)).toString(36));

const seen = new Map();
let collisions = 0;
elements.forEach((element, i) => {
    element.setAttribute(attr, ids[i]);
    const count = (seen.get(ids[i]) || 0) + 1;
    seen.set(ids[i], count);
    if (count === 2) collisions++;
});

return { tagged: elements.length, collisions: collisions };
"#;

/// Outcome of one successful generation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GenerationReport {
    /// Number of elements that received an identifier
    pub tagged: usize,
    /// Number of identifier values shared by more than one element
    pub collisions: usize,
}

/// Hash a structural path the same way the generation script does
///
/// 32-bit wrapping `h * 31 + c` over UTF-16 code units, rendered in signed
/// base 36.
pub fn hash_path(path: &str) -> String {
    let hash = path
        .encode_utf16()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32));
    to_base36(hash)
}

fn to_base36(value: i32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut n = (value as i64).unsigned_abs();
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    if value < 0 {
        out.push(b'-');
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Tag every element on the page, retrying a few times
///
/// Failures are logged and swallowed: callers must tolerate pages without
/// identifiers.
pub async fn generate_ids<D: PageDriver>(driver: &D) -> Option<GenerationReport> {
    for attempt in 1..=GENERATION_ATTEMPTS {
        match try_generate(driver).await {
            Ok(report) => {
                if report.collisions > 0 {
                    warn!(
                        "{} element id(s) are shared by more than one element",
                        report.collisions
                    );
                }
                debug!("Tagged {} elements with ids", report.tagged);
                return Some(report);
            }
            Err(e) => {
                warn!(
                    "Failed to generate element ids (attempt {}/{}): {}",
                    attempt, GENERATION_ATTEMPTS, e
                );
            }
        }
    }

    warn!("Continuing without element ids");
    None
}

async fn try_generate<D: PageDriver>(driver: &D) -> Result<GenerationReport> {
    driver.wait_for_load(LOAD_TIMEOUT).await?;
    let value = driver
        .evaluate(GENERATE_IDS_SCRIPT, vec![json!(ID_ATTRIBUTE)])
        .await?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
#[path = "identifier_test.rs"]
mod identifier_test;
