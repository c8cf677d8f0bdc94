// Shared chromiumoxide session plumbing
//
// One session per extraction, torn down unconditionally when the extractor
// is done. The response listener must be attached before navigation starts
// or the earliest media responses are lost.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::debug;

use crate::downloader::errors::{DownloadError, Result};

/// Ceiling on navigation and on the network-idle wait.
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// A quiet gap this long counts as "network idle".
const IDLE_QUIET: Duration = Duration::from_millis(500);
const IDLE_POLL: Duration = Duration::from_millis(100);

impl From<CdpError> for DownloadError {
    fn from(e: CdpError) -> Self {
        DownloadError::Extraction(e.to_string())
    }
}

#[derive(Default)]
struct ResponseLog {
    urls: Vec<String>,
    last_activity: Option<Instant>,
}

/// A launched headless browser plus the task driving its CDP event loop.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Launches headless Chromium, optionally from an explicit executable.
    /// Launch failures are recoverable from the caller's point of view, so
    /// they come back as `BrowserUnavailable` rather than tearing anything
    /// down.
    pub async fn launch(executable: Option<&Path>) -> Result<Self> {
        let mut builder = BrowserConfig::builder();
        if let Some(path) = executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(DownloadError::BrowserUnavailable)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DownloadError::BrowserUnavailable(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Opens `url` in a fresh page with the response listener already
    /// attached, so nothing the page fetches during load is missed.
    /// Navigation is bounded by `NAVIGATION_TIMEOUT`.
    pub async fn open(&self, url: &str) -> Result<SniffedPage> {
        let page = self.browser.new_page("about:blank").await?;
        page.execute(network::EnableParams::default()).await?;

        let log = Arc::new(Mutex::new(ResponseLog::default()));
        let mut events = page
            .event_listener::<network::EventResponseReceived>()
            .await?;
        let listener_log = Arc::clone(&log);
        let listener_task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Ok(mut log) = listener_log.lock() {
                    log.urls.push(event.response.url.clone());
                    log.last_activity = Some(Instant::now());
                }
            }
        });

        let opened_at = Instant::now();
        match timeout(NAVIGATION_TIMEOUT, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                listener_task.abort();
                return Err(e.into());
            }
            Err(_) => {
                listener_task.abort();
                return Err(DownloadError::PageTimeout);
            }
        }

        Ok(SniffedPage {
            page,
            log,
            listener_task,
            opened_at,
        })
    }

    /// Best-effort teardown. The extraction result is already decided by the
    /// time this runs, so failures only get logged.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!("browser close: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("browser wait: {}", e);
        }
        self.handler_task.abort();
    }
}

/// A navigated page whose network responses are being recorded.
pub struct SniffedPage {
    page: Page,
    log: Arc<Mutex<ResponseLog>>,
    listener_task: JoinHandle<()>,
    opened_at: Instant,
}

impl SniffedPage {
    /// Waits until no response has arrived for the quiet window, bounded by
    /// `deadline`. Running past the deadline is a failure, matching the
    /// navigation timeout semantics.
    pub async fn wait_for_network_idle(&self, deadline: Duration) -> Result<()> {
        let started = Instant::now();
        loop {
            let last = match self.log.lock() {
                Ok(log) => log.last_activity,
                Err(_) => None,
            };
            let quiet_since = last.unwrap_or(self.opened_at);
            if quiet_since.elapsed() >= IDLE_QUIET {
                return Ok(());
            }
            if started.elapsed() >= deadline {
                return Err(DownloadError::PageTimeout);
            }
            tokio::time::sleep(IDLE_POLL).await;
        }
    }

    /// Snapshot of every response URL seen so far, in arrival order.
    pub fn responses(&self) -> Vec<String> {
        match self.log.lock() {
            Ok(log) => log.urls.clone(),
            Err(_) => Vec::new(),
        }
    }

    /// Trimmed inner text of the first element matching `selector`, if the
    /// page has one and it is non-empty.
    pub async fn element_text(&self, selector: &str) -> Option<String> {
        let element = self.page.find_element(selector).await.ok()?;
        let text = element.inner_text().await.ok()??;
        let text = text.trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// The document title, if the page has a non-empty one.
    pub async fn document_title(&self) -> Option<String> {
        let value = self
            .page
            .evaluate("document.title")
            .await
            .ok()?
            .into_value::<String>()
            .ok()?;
        let value = value.trim().to_string();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

impl Drop for SniffedPage {
    fn drop(&mut self) {
        self.listener_task.abort();
    }
}
