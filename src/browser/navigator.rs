//! Bounded-retry navigation policy.
//!
//! Listing and event pages transiently fail to load under automated
//! traffic, and the failures are binary (ready vs not) rather than
//! load-dependent, so the policy is a fixed attempt count with a uniform
//! delay instead of exponential backoff.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::error;

use crate::error::ScrapeError;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Why a single navigation attempt failed.
#[derive(Debug)]
pub enum AttemptError {
    /// The browser-level navigation call failed outright.
    Transport(String),
    /// Navigation completed but the main document came back with a
    /// non-success HTTP status.
    BadStatus(i64),
}

/// Runs `attempt` up to three times, waiting a fixed delay between tries
/// (not before the first). Per-attempt failures are logged with their
/// attempt number; exhaustion yields `ScrapeError::Navigation` carrying
/// the URL.
pub async fn navigate_with_retries<F, Fut>(url: &str, attempt: F) -> Result<(), ScrapeError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<(), AttemptError>>,
{
    for attempt_number in 1..=MAX_ATTEMPTS {
        if attempt_number > 1 {
            sleep(RETRY_DELAY).await;
        }

        match attempt().await {
            Ok(()) => return Ok(()),
            Err(AttemptError::Transport(reason)) => {
                error!("Failed to navigate to {url} (attempt {attempt_number}): {reason}");
            }
            Err(AttemptError::BadStatus(status)) => {
                error!("Failed to navigate to {url} (attempt {attempt_number}): status {status}");
            }
        }
    }

    Err(ScrapeError::Navigation {
        url: url.to_string(),
    })
}
