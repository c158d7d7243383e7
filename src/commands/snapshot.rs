use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use tracing::info;

use crate::commands::utils::{self, BrowserArgs, OutputFormat};
use webprompt::{Error, HtmlMode, Result};

pub async fn handle_snapshot(
    args: &BrowserArgs,
    url: String,
    visible_only: bool,
    screenshot: Option<String>,
    html: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let mode = if visible_only {
        HtmlMode::VisibleOnly
    } else {
        HtmlMode::Raw
    };

    let snapshot = utils::with_page(args, &url, None, |page| async move {
        page.get_page_information(mode).await
    })
    .await?;

    if let Some(path) = &screenshot {
        let png = STANDARD
            .decode(&snapshot.screenshot_base64)
            .map_err(|e| Error::Script(format!("screenshot is not valid base64: {}", e)))?;
        tokio::fs::write(path, &png).await?;
        info!("Screenshot saved to {} ({} bytes)", path, png.len());
    }
    if let Some(path) = &html {
        tokio::fs::write(path, &snapshot.raw_html).await?;
        info!("HTML saved to {}", path);
    }

    let summary = json!({
        "url": snapshot.url,
        "html_bytes": snapshot.raw_html.len(),
        "interactive_elements": snapshot.interactable_element_info,
    });
    utils::print_output(&summary, format)
}
