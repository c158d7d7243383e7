//! Bounded retry around snapshot-and-resolve attempts

use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::errors::{Error, Result};

/// How hard to try before giving up on a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts before failing
    pub max_retries: u32,
    /// Pause between attempts
    pub delay: Duration,
    /// How long to wait for a resolved element to show up in the DOM
    pub lookup_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(500),
            lookup_timeout: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    /// Longest a full run can spend waiting on lookups and delays
    pub fn worst_case_wait(&self) -> Duration {
        (self.lookup_timeout + self.delay) * self.max_retries
    }
}

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting { attempt: u32 },
    Retry { attempt: u32 },
    Exhausted { attempts: u32 },
}

pub const NOT_FOUND_MESSAGE: &str = "Could not find suitable element on the page.";

/// Run `attempt` until it yields a value or the policy is exhausted
///
/// `attempt` receives the 1-based attempt number and returns `Ok(None)` for
/// "nothing yet". Errors end the run immediately. Once every attempt came
/// back empty, `diagnostic` is asked for a screenshot which is attached to
/// the returned [`Error::Resolution`].
pub async fn run_with_retry<T, A, AFut, D, DFut>(
    policy: &RetryPolicy,
    what: &str,
    mut attempt: A,
    diagnostic: D,
) -> Result<T>
where
    A: FnMut(u32) -> AFut,
    AFut: Future<Output = Result<Option<T>>>,
    D: FnOnce() -> DFut,
    DFut: Future<Output = Result<String>>,
{
    let max = policy.max_retries.max(1);
    let mut state = RetryState::Attempting { attempt: 1 };

    loop {
        state = match state {
            RetryState::Attempting { attempt: n } => {
                debug!("Resolving '{}' (attempt {}/{})", what, n, max);
                match attempt(n).await? {
                    Some(value) => {
                        info!("Resolved '{}' on attempt {}", what, n);
                        return Ok(value);
                    }
                    None if n < max => RetryState::Retry { attempt: n },
                    None => RetryState::Exhausted { attempts: n },
                }
            }
            RetryState::Retry { attempt: n } => {
                debug!("No match for '{}', retrying in {:?}", what, policy.delay);
                tokio::time::sleep(policy.delay).await;
                RetryState::Attempting { attempt: n + 1 }
            }
            RetryState::Exhausted { attempts } => {
                warn!("Giving up on '{}' after {} attempts", what, attempts);
                let screenshot_base64 = match diagnostic().await {
                    Ok(screenshot) => screenshot,
                    Err(e) => {
                        warn!("Could not capture diagnostic screenshot: {}", e);
                        String::new()
                    }
                };
                return Err(Error::Resolution {
                    message: NOT_FOUND_MESSAGE.to_string(),
                    screenshot_base64,
                });
            }
        };
    }
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod retry_test;
