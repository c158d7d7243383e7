use tracing::info;

use crate::commands::utils::{self, BrowserArgs, OutputFormat};
use webprompt::{Result, ScrapeOptions};

pub async fn handle_scrape(
    args: &BrowserArgs,
    url: String,
    prompt: String,
    schema: Option<String>,
    expected: Option<String>,
    scroll: bool,
    format: OutputFormat,
) -> Result<()> {
    let return_data_json_schema = match &schema {
        Some(path) => Some(utils::read_json_file(path).await?),
        None => None,
    };
    info!("Scraping '{}' from {}", prompt, url);

    let data = utils::with_page(args, &url, None, |page| async move {
        if scroll {
            page.scroll_to_bottom().await?;
        }
        page.scrape(
            &prompt,
            ScrapeOptions {
                return_data_json_schema,
                expected_return_data: expected,
            },
        )
        .await
    })
    .await?;

    utils::print_output(&data, format)
}
