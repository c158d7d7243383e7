use clap::{Args, ValueEnum};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use webprompt::{AgentBrowser, BrowserPage, Config, Error, GotoOptions, Result, ViewportSize};

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON for programmatic consumption
    Json,
    /// Human-readable lines
    Simple,
}

/// Browser and service options shared by every page command
#[derive(Debug, Clone, Default, Args)]
pub struct BrowserArgs {
    /// Browser to use (chrome or firefox)
    #[arg(short, long, global = true)]
    pub browser: Option<String>,

    /// Run the browser without a window
    #[arg(long, global = true)]
    pub headless: bool,

    /// Viewport size (WIDTHxHEIGHT, e.g., 1920x1080)
    #[arg(long, global = true)]
    pub viewport: Option<String>,

    /// Connect to this WebDriver server instead of starting one
    #[arg(long, global = true)]
    pub webdriver_url: Option<String>,

    /// Restore and save cookies and localStorage under this name
    #[arg(long, global = true)]
    pub session: Option<String>,

    /// Resolution service base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Attempts before giving up on a prompt
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Navigation timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

/// Environment config with command-line overrides applied
pub fn load_config(args: &BrowserArgs) -> Result<Config> {
    let mut config = Config::from_env()?;

    if let Some(browser) = &args.browser {
        config.browser.browser_type = browser.parse()?;
    }
    if args.headless {
        config.browser.headless = true;
    }
    if let Some(viewport) = &args.viewport {
        config.browser.viewport = Some(ViewportSize::parse(viewport)?);
    }
    if let Some(url) = &args.webdriver_url {
        config.browser.webdriver_url = Some(url.clone());
    }
    if let Some(session) = &args.session {
        config.browser.session_name = Some(session.clone());
    }
    if let Some(url) = &args.api_url {
        config.api_url = url.clone();
    }
    if let Some(max_retries) = args.max_retries {
        config.retry.max_retries = max_retries;
    }
    if let Some(secs) = args.timeout {
        config.browser.navigation_timeout = Duration::from_secs(secs);
    }

    config.validate()?;
    Ok(config)
}

/// Open `url` in a fresh browser, run `f` on the page, close the browser
///
/// The browser is closed (saving the session when one is named) even when
/// `f` fails; the first error wins.
pub async fn with_page<T, F, Fut>(
    args: &BrowserArgs,
    url: &str,
    expected_page: Option<String>,
    f: F,
) -> Result<T>
where
    F: FnOnce(BrowserPage) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut browser = AgentBrowser::new(load_config(args)?)?;

    let options = GotoOptions {
        expected_page,
        ..GotoOptions::default()
    };
    let result = match browser.goto(url, options).await {
        Ok(page) => f(page).await,
        Err(e) => Err(e),
    };

    let closed = browser.close().await;
    let value = result?;
    closed?;
    Ok(value)
}

/// Print a result to stdout
pub fn print_output(value: &Value, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Simple => {
            for line in simple_lines(value) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

/// `key: value` lines for objects, one line per item for arrays
pub fn simple_lines(value: &Value) -> Vec<String> {
    fn scalar(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Null => "-".to_string(),
            other => other.to_string(),
        }
    }

    match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, scalar(v)))
            .collect(),
        Value::Array(items) => items.iter().map(scalar).collect(),
        other => vec![scalar(other)],
    }
}

/// Read and parse a JSON file given on the command line
pub async fn read_json_file(path: &str) -> Result<Value> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::config(format!("Cannot read {}: {}", path, e)))?;
    Ok(serde_json::from_str(&text)?)
}
