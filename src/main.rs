#![allow(clippy::uninlined_format_args)]

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use crate::commands::sessions::SessionCommands;
use crate::commands::utils::{BrowserArgs, OutputFormat};
use webprompt::webdriver_manager::GLOBAL_WEBDRIVER_MANAGER;

const EXIT_SUCCESS: i32 = 0;

#[derive(Parser)]
#[command(name = "webprompt")]
#[command(about = "Drive a browser with natural-language prompts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    browser: BrowserArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the element(s) a prompt describes
    Locate {
        /// URL to open
        url: String,

        /// What to look for, in plain words
        prompt: String,

        /// Return every matching element
        #[arg(long, conflicts_with = "selector")]
        all: bool,

        /// Return a CSS selector for the matching elements
        #[arg(long)]
        selector: bool,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Extract structured data from a page
    Scrape {
        /// URL to open
        url: String,

        /// What data to extract
        prompt: String,

        /// JSON schema file the data must follow
        #[arg(long)]
        schema: Option<String>,

        /// Plain description of the expected data
        #[arg(long)]
        expected: Option<String>,

        /// Scroll to the bottom first so lazy content loads
        #[arg(long)]
        scroll: bool,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Ask a question about a page
    Ask {
        /// URL to open
        url: String,

        /// The question
        question: String,

        /// JSON schema file for the answer
        #[arg(long)]
        schema: Option<String>,

        /// Fail unless the page matches this description
        #[arg(long)]
        expected_page: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "simple")]
        format: OutputFormat,
    },

    /// Show what the resolution service sees of a page
    Snapshot {
        /// URL to open
        url: String,

        /// Leave invisible elements out of the HTML
        #[arg(long)]
        visible_only: bool,

        /// Save the full-page screenshot here
        #[arg(long)]
        screenshot: Option<String>,

        /// Save the snapshot HTML here
        #[arg(long)]
        html: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Manage saved sessions
    #[command(subcommand)]
    Sessions(SessionCommands),
}

#[tokio::main]
async fn main() {
    let result = run().await;

    // Drivers started by this process go away with it
    GLOBAL_WEBDRIVER_MANAGER.stop_all();

    match result {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(err) => {
            let mut error_json = json!({
                "error": true,
                "message": err.to_string(),
                "exit_code": err.exit_code()
            });
            if let Some(path) = save_failure_screenshot(&err) {
                error_json["screenshot"] = json!(path);
            }
            println!(
                "{}",
                serde_json::to_string(&error_json).unwrap_or_else(|_| "{}".to_string())
            );

            eprintln!("Error: {}", err);
            std::process::exit(err.exit_code());
        }
    }
}

/// Write the screenshot carried by a resolution failure to a temp file
fn save_failure_screenshot(err: &webprompt::Error) -> Option<String> {
    let encoded = err.screenshot_base64().filter(|s| !s.is_empty())?;
    let png = STANDARD.decode(encoded).ok()?;
    let path = std::env::temp_dir().join(format!("webprompt-failure-{}.png", uuid::Uuid::new_v4()));
    std::fs::write(&path, png).ok()?;
    Some(path.display().to_string())
}

async fn run() -> webprompt::Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webprompt=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Locate {
            url,
            prompt,
            all,
            selector,
            format,
        } => {
            commands::locate::handle_locate(&cli.browser, url, prompt, all, selector, format)
                .await?
        }

        Commands::Scrape {
            url,
            prompt,
            schema,
            expected,
            scroll,
            format,
        } => {
            commands::scrape::handle_scrape(
                &cli.browser,
                url,
                prompt,
                schema,
                expected,
                scroll,
                format,
            )
            .await?
        }

        Commands::Ask {
            url,
            question,
            schema,
            expected_page,
            format,
        } => {
            commands::ask::handle_ask(&cli.browser, url, question, schema, expected_page, format)
                .await?
        }

        Commands::Snapshot {
            url,
            visible_only,
            screenshot,
            html,
            format,
        } => {
            commands::snapshot::handle_snapshot(
                &cli.browser,
                url,
                visible_only,
                screenshot,
                html,
                format,
            )
            .await?
        }

        Commands::Sessions(command) => commands::sessions::handle_sessions(command).await?,
    }

    Ok(())
}
