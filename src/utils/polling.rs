//! Fixed-interval polling of remote jobs.

use crate::core::error::{AppError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// What one poll observed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Poll<T> {
    Ready(T),
    /// Still running; carries the remote status for logging.
    Pending(String),
}

/// Calls `check` every `interval` until it is ready.
///
/// Errors from `check` end the poll immediately. Fails with
/// [`AppError::PollTimeout`] once more than `timeout` has elapsed.
pub(crate) async fn poll_until<T, F, Fut>(
    label: &str,
    interval: Duration,
    timeout: Duration,
    mut check: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Poll<T>>>,
{
    let start = Instant::now();
    let mut last_status = String::new();

    loop {
        match check().await? {
            Poll::Ready(value) => {
                tracing::debug!(target: "polling", "[{}] ready after {:?}", label, start.elapsed());
                return Ok(value);
            }
            Poll::Pending(status) => {
                if status != last_status {
                    tracing::info!(target: "polling", "[{}] status: {}", label, status);
                    last_status = status;
                }
            }
        }

        let waited = start.elapsed();
        if waited > timeout {
            return Err(AppError::PollTimeout {
                label: label.to_string(),
                waited,
                last_status,
            });
        }
        sleep(interval).await;
    }
}
