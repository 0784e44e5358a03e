//! Per-request page handling.
//!
//! Each scrape request opens one page against the shared browser, pinned to
//! the UTC timezone and bounded by the configured per-operation timeout.
//! The page must be closed on every exit path; `ScrapePage::close` also
//! flushes the optional diagnostic trace.

use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::emulation::SetTimezoneOverrideParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::{Page, ScreenshotParams};
use serde_json::Value;
use tracing::{info, warn};

use crate::browser::navigator::{navigate_with_retries, AttemptError};
use crate::browser::session::BrowserSession;
use crate::browser::trace::TraceRecorder;
use crate::browser::wait::{wait_until, WaitConfig};
use crate::config::env_loader::config;
use crate::error::ScrapeError;

pub struct ScrapePage {
    page: Page,
    timeout: Duration,
    trace: Option<TraceRecorder>,
    closed: bool,
}

impl ScrapePage {
    /// Opens a fresh page in the shared browser. The page emulates the UTC
    /// timezone so extracted timestamps are stable across deployments, and
    /// starts trace recording when debug mode is on.
    pub async fn open(session: &BrowserSession) -> Result<Self, ScrapeError> {
        let page = session.browser().new_page("about:blank").await?;

        let timezone = SetTimezoneOverrideParams::builder()
            .timezone_id("UTC")
            .build()
            .expect("timezone id is set");
        page.execute(timezone).await?;

        Ok(Self {
            page,
            timeout: Duration::from_millis(config().navigation_timeout_ms),
            trace: config().debug.then(TraceRecorder::new),
            closed: false,
        })
    }

    /// Navigates with the fixed retry policy, then snapshots the rendered
    /// page into the trace when recording.
    pub async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        navigate_with_retries(url, || {
            let page = self.page.clone();
            let url = url.to_string();
            async move {
                page.goto(url.as_str())
                    .await
                    .map_err(|e| AttemptError::Transport(e.to_string()))?;

                match document_status(&page).await {
                    Ok(Some(status)) if !(200..300).contains(&status) => {
                        Err(AttemptError::BadStatus(status))
                    }
                    // status unknown counts as success, like a null
                    // response from the protocol
                    Ok(_) => Ok(()),
                    Err(e) => Err(AttemptError::Transport(e.to_string())),
                }
            }
        })
        .await?;

        self.record_trace("navigated").await;
        Ok(())
    }

    /// Waits for `selector` to become visible within the configured
    /// timeout. Returns false on timeout rather than failing; callers
    /// decide whether absence is an error.
    pub async fn wait_for_visible(&self, selector: &str) -> bool {
        let script = visibility_script(selector);
        wait_until(
            || {
                let page = self.page.clone();
                let script = script.clone();
                async move {
                    let result = page.evaluate(script).await?;
                    Ok::<_, CdpError>(result.value().and_then(Value::as_bool).unwrap_or(false))
                }
            },
            WaitConfig::with_timeout(self.timeout),
        )
        .await
    }

    /// Clicks the first element matching `selector`.
    pub async fn click(&self, selector: &str) -> Result<(), ScrapeError> {
        self.page.find_element(selector).await?.click().await?;
        Ok(())
    }

    /// Clicks the first link whose trimmed text equals `text`. Returns
    /// whether such a link was found.
    pub async fn click_link_by_text(&self, text: &str) -> Result<bool, ScrapeError> {
        let escaped = serde_json::to_string(text).expect("text encodes as JSON");
        let script = format!(
            "(() => {{ const target = Array.from(document.querySelectorAll('a'))\
             .find(a => a.textContent.trim() === {escaped});\
             if (!target) return false; target.click(); return true; }})()"
        );
        let result = self.page.evaluate(script).await?;
        Ok(result.value().and_then(Value::as_bool).unwrap_or(false))
    }

    /// Reads an attribute off the first element matching `selector`.
    pub async fn attribute(
        &self,
        selector: &str,
        name: &str,
    ) -> Result<Option<String>, ScrapeError> {
        let element = self.page.find_element(selector).await?;
        Ok(element.attribute(name).await?)
    }

    /// Full HTML of the rendered page.
    pub async fn content(&self) -> Result<String, ScrapeError> {
        Ok(self.page.content().await?)
    }

    /// Closes the page, saving the diagnostic trace when recording. Trace
    /// failures are logged and swallowed; they never affect the scrape
    /// result.
    pub async fn close(mut self) -> Result<(), ScrapeError> {
        self.record_trace("close").await;
        if let Some(recorder) = self.trace.take() {
            match recorder.save() {
                Ok(path) => info!("Browser trace saved to {}", path.display()),
                Err(e) => warn!("Failed to save browser trace: {e}"),
            }
        }
        self.closed = true;
        self.page.clone().close().await?;
        Ok(())
    }

    async fn record_trace(&mut self, label: &str) {
        let Some(recorder) = self.trace.as_mut() else {
            return;
        };
        match self.page.content().await {
            Ok(html) => recorder.add_snapshot(label, html),
            Err(e) => warn!("Failed to capture trace snapshot: {e}"),
        }
        match self.page.screenshot(ScreenshotParams::default()).await {
            Ok(png) => recorder.add_screenshot(label, png),
            Err(e) => warn!("Failed to capture trace screenshot: {e}"),
        }
    }
}

/// Backstop for the cancellation path: a scrape future dropped mid-await
/// never reaches `close`, and the browser-side target would otherwise
/// outlive the request inside the shared browser. The close runs in the
/// background since `Drop` cannot await; any recorded trace is still
/// flushed synchronously.
impl Drop for ScrapePage {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Some(recorder) = self.trace.take() {
            if let Err(e) = recorder.save() {
                warn!("Failed to save browser trace: {e}");
            }
        }
        let page = self.page.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = page.close().await {
                    warn!("Failed to close dropped page: {e}");
                }
            });
        }
    }
}

/// HTTP status of the main document, read off the Performance API after
/// navigation settles. `None` when the browser does not report one.
async fn document_status(page: &Page) -> Result<Option<i64>, CdpError> {
    let result = page
        .evaluate(
            "(() => { const nav = performance.getEntriesByType('navigation')[0];\
             return nav && nav.responseStatus ? nav.responseStatus : null; })()",
        )
        .await?;
    Ok(result.value().and_then(Value::as_i64))
}

fn visibility_script(selector: &str) -> String {
    // JSON encoding keeps arbitrary selectors safe inside the script
    let escaped = serde_json::to_string(selector).expect("selector encodes as JSON");
    format!(
        "(() => {{ const el = document.querySelector({escaped});\
         return !!el && !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length); }})()"
    )
}
