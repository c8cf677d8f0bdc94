// Threads extraction
//
// The post's video is served off the Instagram CDN and requested shortly
// after DOM load. The settle delay is short on purpose: the related-content
// rail starts pulling its own videos right after the main post, and waiting
// longer would let those pollute the capture.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::downloader::errors::Result;
use crate::downloader::models::ExtractedMedia;
use crate::downloader::utils::sanitize_title;

use super::browser::BrowserSession;
use super::MediaExtractor;

const DEFAULT_TITLE: &str = "threads_video";
const SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Sniffs Threads post pages for the main post's video.
pub struct ThreadsExtractor {
    browser: Option<PathBuf>,
}

impl ThreadsExtractor {
    pub fn new(browser: Option<PathBuf>) -> Self {
        Self { browser }
    }

    async fn sniff(&self, session: &BrowserSession, url: &str) -> Result<Option<ExtractedMedia>> {
        let page = session.open(url).await?;
        tokio::time::sleep(SETTLE_DELAY).await;

        // First qualifying response is the main post; recommendations load
        // after it.
        let media_url = page
            .responses()
            .into_iter()
            .find(|u| is_post_video_response(u));
        let media_url = match media_url {
            Some(url) => url,
            None => {
                debug!("no post video response observed on {}", url);
                return Ok(None);
            }
        };

        let title = sanitize_title(&title_from_post_url(url), &['@']);

        info!("threads media found: {}", title);
        Ok(Some(ExtractedMedia { media_url, title }))
    }
}

#[async_trait]
impl MediaExtractor for ThreadsExtractor {
    async fn extract(&self, url: &str) -> Result<Option<ExtractedMedia>> {
        let url = normalize_threads_url(url);
        let session = BrowserSession::launch(self.browser.as_deref()).await?;
        let result = self.sniff(&session, &url).await;
        session.shutdown().await;
        result
    }
}

/// Threads serves the same posts on both domains; the `.net` one is the
/// stable host for automation.
fn normalize_threads_url(url: &str) -> String {
    url.replace("threads.com", "threads.net")
}

/// Post videos come off the Instagram CDN hosts; everything else on the page
/// (avatars, tracking, scripts) is noise.
fn is_post_video_response(url: &str) -> bool {
    (url.contains(".mp4") || url.contains("video"))
        && (url.contains("cdninstagram") || url.contains("fbcdn"))
}

/// Threads posts have no usable title element, so the post id from the URL
/// path stands in.
fn title_from_post_url(url: &str) -> String {
    match url.split_once("/post/") {
        Some((_, rest)) => {
            let post_id = rest.split('?').next().unwrap_or_default();
            format!("threads_{}", post_id)
        }
        None => DEFAULT_TITLE.to_string(),
    }
}
