use thiserror::Error;

/// Result alias used across the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the SDK, each with a process exit code
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration (exit code 2)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote service found nothing after every attempt (exit code 3)
    #[error("{message}")]
    Resolution {
        message: String,
        /// Base64 PNG of the page as it was when the last attempt failed
        screenshot_base64: String,
    },

    /// No element carries the requested identifier (exit code 3)
    #[error("Could not find element with id {0}")]
    ElementNotFound(String),

    /// Landed on a page that does not match the expected description (exit code 3)
    #[error("Incorrect navigation: {0}")]
    Navigation(String),

    /// WebDriver session could not be created (exit code 4)
    #[error("WebDriver connection failed: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    /// A WebDriver command failed (exit code 4)
    #[error("WebDriver command failed: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    /// A page script returned something unexpected (exit code 4)
    #[error("Script error: {0}")]
    Script(String),

    /// Transport failure talking to the resolution service (exit code 5)
    #[error("Request to resolution service failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The resolution service answered with a non-success status (exit code 5)
    #[error("Resolution service returned {status}: {body}")]
    Api { status: u16, body: String },

    /// Operation timed out (exit code 6)
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Operation needs a launched browser (exit code 1)
    #[error("Browser has not been launched")]
    NotLaunched,

    /// No open page at this index (exit code 1)
    #[error("No page at index {0}")]
    NoSuchPage(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error (exit code 1)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) => 2,
            Error::Resolution { .. } | Error::ElementNotFound(_) | Error::Navigation(_) => 3,
            Error::Session(_) | Error::WebDriver(_) | Error::Script(_) => 4,
            Error::Http(_) | Error::Api { .. } => 5,
            Error::Timeout(_) => 6,
            Error::NotLaunched | Error::NoSuchPage(_) | Error::Io(_) | Error::Json(_) | Error::Other(_) => 1,
        }
    }

    /// Screenshot attached to a resolution failure, if any
    pub fn screenshot_base64(&self) -> Option<&str> {
        match self {
            Error::Resolution {
                screenshot_base64, ..
            } => Some(screenshot_base64),
            _ => None,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}

#[cfg(test)]
#[path = "errors_test.rs"]
mod errors_test;
