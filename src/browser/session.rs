//! Browser process lifecycle.
//!
//! One Chrome process serves the whole program: boundary adapters launch it
//! once and hand each scrape request a shared reference. Requests never own
//! or close the browser; they only own their page.

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::model::Config;
use crate::error::ScrapeError;

pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Spawns a Chrome process, headless unless `config.debug` is set.
    pub async fn launch(config: &Config) -> Result<Self, ScrapeError> {
        let mut builder = BrowserConfig::builder();
        if config.debug {
            builder = builder.with_head();
        }

        // A unique user data dir avoids ProcessSingleton clashes between
        // concurrently running browser instances.
        let user_data_dir = std::env::temp_dir().join(format!("eventscout-{}", Uuid::new_v4()));
        builder = builder
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-data-dir={}", user_data_dir.display()));

        let browser_config = builder
            .build()
            .map_err(|reason| ScrapeError::Launch { reason })?;

        let (browser, mut handler) =
            Browser::launch(browser_config)
                .await
                .map_err(|e| ScrapeError::Launch {
                    reason: e.to_string(),
                })?;

        // The handler stream must be driven for the browser's whole
        // lifetime, otherwise no CDP message gets processed.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("Browser handler error: {e}");
                }
            }
        });

        debug!("Browser launched (headless: {})", !config.debug);

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// The underlying chromiumoxide handle, for operations this wrapper
    /// does not cover (e.g. listing open pages).
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Graceful shutdown. Dropping an unclosed session still kills the
    /// Chrome process through chromiumoxide's Drop, but this waits for it.
    pub async fn close(mut self) -> Result<(), ScrapeError> {
        debug!("Closing browser");
        self.browser.close().await?;
        self.handler_task.abort();
        Ok(())
    }
}
