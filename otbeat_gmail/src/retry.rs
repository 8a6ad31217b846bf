use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::error::GmailError;

/// Errors that can tell whether repeating the request may help.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for GmailError {
    fn is_retryable(&self) -> bool {
        Self::is_retryable(self)
    }
}

/// Delays between attempts. An empty list disables retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delays: [1, 2, 4].map(Duration::from_secs).to_vec(),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn none() -> Self {
        Self { delays: Vec::new() }
    }

    #[must_use]
    pub fn max_attempts(&self) -> usize {
        self.delays.len() + 1
    }
}

/// Retry an async operation with backoff while its error is retryable.
///
/// Returns the first success, the first non-retryable error, or the error of
/// the last attempt once the policy's delays are used up.
pub async fn retry_with_backoff<F, Fut, T, E>(mut operation: F, policy: &RetryPolicy) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display + Retryable,
{
    let max_attempts = policy.max_attempts();
    let mut delays = policy.delays.iter();
    let mut attempt = 1;

    loop {
        let err = match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => err,
        };

        match delays.next() {
            Some(delay) if err.is_retryable() => {
                warn!(
                    "Request failed (attempt {attempt}/{max_attempts}): {err}. Retrying after {}ms...",
                    delay.as_millis()
                );
                sleep(*delay).await;
                attempt += 1;
            }
            _ => return Err(err),
        }
    }
}
