// src/render/chrome.rs
// =============================================================================
// Headless Chromium as the page-fetch collaborator.
//
// - ChromeSession owns the browser process and the task that pumps its
//   DevTools event stream. Whoever launches it must close() it.
// - ChromeFetcher drives one tab of that browser and implements PageFetcher.
//
// "Settled" means document.readyState is "complete" and the number of DOM
// elements didn't change between two polls in a row.
// =============================================================================

use super::{anchors, PageFetcher};
use crate::error::PageError;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde::Deserialize;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

const SETTLE_POLL_INTERVAL: Duration = Duration::from_millis(250);

const SETTLE_PROBE_SCRIPT: &str = r#"
    (() => ({
        readyState: document.readyState,
        elements: document.getElementsByTagName('*').length
    }))()
"#;

/// How to launch the browser.
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    pub headless: bool,
    /// Chrome/Chromium binary; chromiumoxide searches the usual places if None
    pub executable: Option<PathBuf>,
    /// Budget for a single DevTools request
    pub request_timeout: Duration,
}

impl Default for ChromeOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// A running browser plus its event handler task.
pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    pub async fn launch(options: &ChromeOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(options.request_timeout)
            .window_size(1920, 1080);

        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.executable {
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(|e| anyhow!("Failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch Chromium")?;

        // The handler stream has to be polled for the browser to make progress
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    trace!("browser handler event error: {}", e);
                }
            }
            debug!("browser handler task finished");
        });

        info!(headless = options.headless, "Chromium launched");
        Ok(Self { browser, handler })
    }

    /// Opens a blank tab to crawl with.
    pub async fn new_fetcher(&self, navigation_timeout: Duration) -> Result<ChromeFetcher> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open a browser tab")?;

        Ok(ChromeFetcher {
            page,
            navigation_timeout,
            current_url: None,
        })
    }

    /// Shuts the browser down and waits for the process to exit.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser exit: {}", e);
        }
        self.handler.abort();
        info!("Chromium closed");
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// One browser tab, used as a PageFetcher.
pub struct ChromeFetcher {
    page: Page,
    navigation_timeout: Duration,
    // Last URL handed to navigate(), for error messages and as a base
    // fallback when the tab can't tell us where it ended up
    current_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettleProbe {
    ready_state: String,
    elements: u64,
}

impl ChromeFetcher {
    fn current(&self) -> String {
        self.current_url.clone().unwrap_or_else(|| "about:blank".to_string())
    }

    async fn probe(&self) -> Result<SettleProbe, CdpError> {
        let result = self.page.evaluate(SETTLE_PROBE_SCRIPT).await?;
        result.into_value::<SettleProbe>().map_err(CdpError::from)
    }
}

#[async_trait]
impl PageFetcher for ChromeFetcher {
    async fn navigate(&mut self, url: &str) -> Result<(), PageError> {
        self.current_url = Some(url.to_string());

        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(classify(url, e, Stage::Navigation)),
            Err(_) => Err(PageError::Navigation {
                url: url.to_string(),
                reason: format!("timed out after {:?}", self.navigation_timeout),
            }),
        }
    }

    async fn wait_until_settled(&mut self, timeout: Duration) -> Result<bool, PageError> {
        let this = &*self;
        poll_until_settled(timeout, || this.probe()).await
    }

    async fn extract_anchor_hrefs(&mut self) -> Result<Vec<Option<String>>, PageError> {
        let current = self.current();

        let html = self
            .page
            .content()
            .await
            .map_err(|e| classify(&current, e, Stage::Extraction))?;

        // After redirects the tab's own URL is the right base
        let base = match self.page.url().await {
            Ok(Some(url)) => url,
            _ => current,
        };

        Ok(anchors::extract_anchor_hrefs(&html, &base))
    }
}

// Polls `probe` until two consecutive complete readings agree on the element
// count. Each probe only gets what is left of the budget; a page stuck in a
// long script must not stretch the wait to the DevTools request timeout.
async fn poll_until_settled<P, Fut>(timeout: Duration, mut probe: P) -> Result<bool, PageError>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = Result<SettleProbe, CdpError>>,
{
    let deadline = Instant::now() + timeout;
    let mut last_count: Option<u64> = None;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let Ok(outcome) = tokio::time::timeout(remaining, probe()).await else {
            debug!(timeout = ?timeout, "settle probe ran past the budget");
            return Ok(false);
        };

        match outcome {
            Ok(reading) if reading.ready_state == "complete" => {
                if last_count == Some(reading.elements) {
                    return Ok(true);
                }
                last_count = Some(reading.elements);
            }
            Ok(_) => last_count = None,
            Err(e) if is_session_loss(&e) => {
                return Err(PageError::Session(e.to_string()));
            }
            // Typically the execution context being replaced mid-load
            Err(e) => {
                trace!("settle probe failed, retrying: {}", e);
                last_count = None;
            }
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(false);
        }
        tokio::time::sleep(SETTLE_POLL_INTERVAL.min(remaining)).await;
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Navigation,
    Extraction,
}

// A dead websocket or closed command channel means the browser is gone
fn is_session_loss(error: &CdpError) -> bool {
    matches!(
        error,
        CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse
    )
}

fn classify(url: &str, error: CdpError, stage: Stage) -> PageError {
    if is_session_loss(&error) {
        return PageError::Session(error.to_string());
    }

    let url = url.to_string();
    let reason = error.to_string();
    match stage {
        Stage::Navigation => PageError::Navigation { url, reason },
        Stage::Extraction => PageError::Extraction { url, reason },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_headless() {
        let options = ChromeOptions::default();
        assert!(options.headless);
        assert!(options.executable.is_none());
    }

    #[test]
    fn test_no_response_is_session_loss() {
        let err = classify("https://ex.org/", CdpError::NoResponse, Stage::Navigation);
        assert!(matches!(err, PageError::Session(_)));
    }

    #[test]
    fn test_page_level_errors_keep_their_stage() {
        let err = classify(
            "https://ex.org/",
            CdpError::ChromeMessage("net::ERR_NAME_NOT_RESOLVED".to_string()),
            Stage::Navigation,
        );
        assert!(matches!(err, PageError::Navigation { .. }));

        let err = classify("https://ex.org/", CdpError::Timeout, Stage::Extraction);
        assert!(matches!(err, PageError::Extraction { .. }));
    }

    fn reading(ready_state: &str, elements: u64) -> Result<SettleProbe, CdpError> {
        Ok(SettleProbe {
            ready_state: ready_state.to_string(),
            elements,
        })
    }

    #[tokio::test]
    async fn test_settles_once_element_count_is_stable() {
        let mut counts = vec![40, 42, 42].into_iter();
        let settled = poll_until_settled(Duration::from_secs(5), || {
            let count = counts.next().unwrap_or(42);
            async move { reading("complete", count) }
        })
        .await
        .unwrap();
        assert!(settled);
    }

    #[tokio::test]
    async fn test_loading_page_runs_out_of_budget() {
        let settled = poll_until_settled(Duration::from_millis(600), || async {
            reading("loading", 10)
        })
        .await
        .unwrap();
        assert!(!settled);
    }

    #[tokio::test]
    async fn test_hung_probe_is_cut_off_at_the_budget() {
        let started = Instant::now();
        let settled = poll_until_settled(Duration::from_millis(200), || async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            reading("complete", 1)
        })
        .await
        .unwrap();

        assert!(!settled);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_lost_session_while_settling() {
        let result =
            poll_until_settled(Duration::from_secs(1), || async { Err(CdpError::NoResponse) })
                .await;
        assert!(matches!(result, Err(PageError::Session(_))));
    }

    #[test]
    fn test_settle_probe_shape() {
        let probe: SettleProbe =
            serde_json::from_str(r#"{"readyState":"complete","elements":42}"#).unwrap();
        assert_eq!(probe.ready_state, "complete");
        assert_eq!(probe.elements, 42);
    }
}
