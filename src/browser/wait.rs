//! Polling wait helpers for browser conditions.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
pub struct WaitConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Polls `condition` until it reports true or `config.timeout` elapses.
/// Returns whether the condition was met within the timeout; errors inside
/// the condition count as "not yet" since they are usually transient
/// (element not attached, page mid-navigation).
pub async fn wait_until<F, Fut, E>(condition: F, config: WaitConfig) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let start = Instant::now();

    loop {
        if let Ok(true) = condition().await {
            return true;
        }

        if start.elapsed() >= config.timeout {
            return false;
        }

        sleep(config.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn reports_immediate_success() {
        let met = wait_until(
            || async { Ok::<_, Infallible>(true) },
            WaitConfig::with_timeout(Duration::from_secs(1)),
        )
        .await;

        assert!(met);
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_polling_until_the_condition_holds() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let met = wait_until(
            move || {
                let counter = counter_clone.clone();
                async move { Ok::<_, Infallible>(counter.fetch_add(1, Ordering::SeqCst) >= 3) }
            },
            WaitConfig::with_timeout(Duration::from_secs(5)),
        )
        .await;

        assert!(met);
        assert!(counter.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn reports_timeout_as_false() {
        let met = wait_until(
            || async { Ok::<_, Infallible>(false) },
            WaitConfig::with_timeout(Duration::from_millis(500)),
        )
        .await;

        assert!(!met);
    }

    #[tokio::test(start_paused = true)]
    async fn treats_condition_errors_as_not_yet() {
        let met = wait_until(
            || async { Err::<bool, &str>("detached") },
            WaitConfig::with_timeout(Duration::from_millis(300)),
        )
        .await;

        assert!(!met);
    }
}
