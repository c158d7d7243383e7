use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::errors::{Error, Result};
use crate::types::BrowserType;

const STARTUP_POLLS: u32 = 30;
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(100);
const STATUS_TIMEOUT: Duration = Duration::from_secs(1);

/// Starts and tracks WebDriver server processes (chromedriver, geckodriver)
#[derive(Default)]
pub struct WebDriverManager {
    processes: Mutex<Vec<DriverProcess>>,
}

struct DriverProcess {
    browser_type: BrowserType,
    child: Child,
    port: u16,
    url: String,
}

impl DriverProcess {
    fn stop(&mut self) {
        debug!("Stopping {} on port {}", self.browser_type.driver_binary(), self.port);
        #[cfg(unix)]
        kill_process_group(self.child.id());
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl WebDriverManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn processes(&self) -> MutexGuard<'_, Vec<DriverProcess>> {
        self.processes.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// URL of a ready WebDriver server for `browser_type`, starting one if needed
    pub async fn ensure_driver(&self, browser_type: &BrowserType) -> Result<String> {
        let managed: Vec<String> = self
            .processes()
            .iter()
            .filter(|p| p.browser_type == *browser_type)
            .map(|p| p.url.clone())
            .collect();

        for url in managed {
            if Self::is_driver_ready(&url).await {
                debug!("Using managed WebDriver at {}", url);
                return Ok(url);
            }
        }

        let standard = Self::standard_url(browser_type);
        if Self::is_driver_ready(&standard).await {
            debug!("Found external WebDriver at {}", standard);
            return Ok(standard);
        }

        info!("No WebDriver detected, starting {}", browser_type.driver_binary());
        self.start_driver(browser_type).await
    }

    /// Where a driver started by hand listens by default
    pub fn standard_url(browser_type: &BrowserType) -> String {
        match browser_type {
            BrowserType::Firefox => "http://localhost:4444".to_string(),
            BrowserType::Chrome => "http://localhost:9515".to_string(),
        }
    }

    /// Command-line arguments that make the driver listen on `port`
    pub fn driver_args(browser_type: &BrowserType, port: u16) -> Vec<String> {
        match browser_type {
            BrowserType::Firefox => vec!["--port".to_string(), port.to_string()],
            BrowserType::Chrome => vec![format!("--port={}", port)],
        }
    }

    async fn start_driver(&self, browser_type: &BrowserType) -> Result<String> {
        let command = browser_type.driver_binary();
        if !Self::command_exists(command) {
            return Err(Error::config(format!(
                "{} not found in PATH. Install it or set WEBPROMPT_WEBDRIVER_URL",
                command
            )));
        }

        let port = Self::find_free_port(browser_type)?;
        info!("Starting {} on port {}", command, port);

        let mut cmd = Command::new(command);
        cmd.args(Self::driver_args(browser_type, port))
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd.spawn()?;
        let url = format!("http://localhost:{}", port);

        self.processes().push(DriverProcess {
            browser_type: *browser_type,
            child,
            port,
            url: url.clone(),
        });

        for attempt in 1..=STARTUP_POLLS {
            if Self::is_driver_running(&url).await {
                info!("WebDriver started on port {}", port);
                return Ok(url);
            }
            if attempt < STARTUP_POLLS {
                sleep(STARTUP_POLL_INTERVAL).await;
            }
        }

        self.stop_port(port);
        Err(Error::Timeout(format!(
            "{} did not become ready on port {}",
            command, port
        )))
    }

    pub fn command_exists(command: &str) -> bool {
        let finder = if cfg!(windows) { "where" } else { "which" };

        Command::new(finder)
            .arg(command)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// The driver's usual ports first, then any port the OS hands out
    pub fn find_free_port(browser_type: &BrowserType) -> Result<u16> {
        let preferred: [u16; 3] = match browser_type {
            BrowserType::Firefox => [4444, 4445, 4446],
            BrowserType::Chrome => [9515, 9516, 9517],
        };

        if let Some(port) = preferred.into_iter().find(|p| !Self::is_port_in_use(*p)) {
            return Ok(port);
        }

        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        Ok(listener.local_addr()?.port())
    }

    pub fn is_port_in_use(port: u16) -> bool {
        std::net::TcpListener::bind(("127.0.0.1", port)).is_err()
    }

    /// Whether anything answers `GET /status` at `url`
    pub async fn is_driver_running(url: &str) -> bool {
        Self::status(url).await.is_some()
    }

    /// Whether the driver at `url` reports `ready: true`
    pub async fn is_driver_ready(url: &str) -> bool {
        Self::status(url)
            .await
            .and_then(|body| body.pointer("/value/ready").and_then(|r| r.as_bool()))
            .unwrap_or(false)
    }

    async fn status(url: &str) -> Option<serde_json::Value> {
        let response = reqwest::Client::new()
            .get(format!("{}/status", url))
            .timeout(STATUS_TIMEOUT)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json().await.ok()
    }

    /// Stop managed drivers for `browser_type`
    pub fn kill_driver(&self, browser_type: &BrowserType) {
        self.processes().retain_mut(|p| {
            if p.browser_type == *browser_type {
                p.stop();
                false
            } else {
                true
            }
        });
    }

    fn stop_port(&self, port: u16) {
        self.processes().retain_mut(|p| {
            if p.port == port {
                p.stop();
                false
            } else {
                true
            }
        });
    }

    pub fn stop_all(&self) {
        let mut processes = self.processes();
        for process in processes.iter_mut() {
            process.stop();
        }
        processes.clear();
    }

    pub fn managed_count(&self) -> usize {
        self.processes().len()
    }
}

impl Drop for WebDriverManager {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// SIGTERM then SIGKILL to the group the driver leads, taking the browser with it
#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    for signal in ["-TERM", "-KILL"] {
        if let Err(e) = Command::new("kill")
            .args([signal, &format!("-{}", pgid)])
            .output()
        {
            debug!("Failed to signal process group {}: {}", pgid, e);
        }
        std::thread::sleep(Duration::from_millis(100));
    }
}

lazy_static::lazy_static! {
    pub static ref GLOBAL_WEBDRIVER_MANAGER: WebDriverManager = WebDriverManager::new();
}

#[cfg(test)]
#[path = "webdriver_manager_test.rs"]
mod webdriver_manager_test;
