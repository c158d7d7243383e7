use fantoccini::elements::Element;
use serde_json::{Value, json};
use tracing::info;

use crate::commands::utils::{self, BrowserArgs, OutputFormat};
use webprompt::{ElementId, Result};

async fn describe(id: &ElementId, handle: &Element) -> Value {
    json!({
        "d_id": id,
        "tag": handle.tag_name().await.ok(),
        "text": handle.text().await.ok(),
    })
}

pub async fn handle_locate(
    args: &BrowserArgs,
    url: String,
    prompt: String,
    all: bool,
    selector: bool,
    format: OutputFormat,
) -> Result<()> {
    info!("Locating '{}' on {}", prompt, url);

    let output = utils::with_page(args, &url, None, |page| async move {
        if selector {
            let matched = page.get_interactions_selector(&prompt).await?;
            Ok(json!({
                "selector": matched.selector,
                "count": matched.elements.len(),
            }))
        } else if all {
            let found = page.get_interactable_elements(&prompt).await?;
            let mut described = Vec::with_capacity(found.len());
            for element in &found {
                described.push(describe(&element.id, &element.handle).await);
            }
            Ok(Value::Array(described))
        } else {
            let element = page.get_interactable_element(&prompt).await?;
            Ok(describe(&element.id, &element.handle).await)
        }
    })
    .await?;

    utils::print_output(&output, format)
}
