use tracing::info;

use crate::commands::utils::{self, BrowserArgs, OutputFormat};
use webprompt::Result;

pub async fn handle_ask(
    args: &BrowserArgs,
    url: String,
    question: String,
    schema: Option<String>,
    expected_page: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let schema = match &schema {
        Some(path) => Some(utils::read_json_file(path).await?),
        None => None,
    };
    info!("Asking '{}' about {}", question, url);

    let answer = utils::with_page(args, &url, expected_page, |page| async move {
        page.ask(&question, schema).await
    })
    .await?;

    match format {
        OutputFormat::Json => utils::print_output(&serde_json::to_value(&answer)?, format),
        OutputFormat::Simple => {
            println!("{}", utils::simple_lines(&answer.return_data).join("\n"));
            if !answer.description.is_empty() {
                println!("\n{}", answer.description);
            }
            Ok(())
        }
    }
}
