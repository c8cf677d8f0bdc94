// Aikive extraction
//
// Aikive pages load their video as an HLS playlist after the player boots,
// so the playlist URL only ever appears in network traffic. Navigation waits
// for network idle because the player fetches lazily; the title comes from
// the page markup with the document title as fallback.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::downloader::errors::Result;
use crate::downloader::models::ExtractedMedia;
use crate::downloader::utils::sanitize_title;

use super::browser::{BrowserSession, NAVIGATION_TIMEOUT};
use super::MediaExtractor;

const DEFAULT_TITLE: &str = "aikive_video";

// Grouped selector, so the first match in document order wins.
const TITLE_SELECTOR: &str = r#"h1, .title, [class*="title"]"#;

/// Sniffs Aikive list-video pages for their HLS playlist.
pub struct AikiveExtractor {
    browser: Option<PathBuf>,
}

impl AikiveExtractor {
    pub fn new(browser: Option<PathBuf>) -> Self {
        Self { browser }
    }

    async fn sniff(&self, session: &BrowserSession, url: &str) -> Result<Option<ExtractedMedia>> {
        let page = session.open(url).await?;
        page.wait_for_network_idle(NAVIGATION_TIMEOUT).await?;

        let playlists: Vec<String> = page
            .responses()
            .into_iter()
            .filter(|u| u.contains(".m3u8"))
            .collect();
        let media_url = match pick_playlist(&playlists) {
            Some(url) => url.to_string(),
            None => {
                debug!("no m3u8 response observed on {}", url);
                return Ok(None);
            }
        };

        let title = match page.element_text(TITLE_SELECTOR).await {
            Some(text) => text,
            None => derive_title(page.document_title().await),
        };
        let title = sanitize_title(&title, &[]);

        info!("aikive media found: {}", title);
        Ok(Some(ExtractedMedia { media_url, title }))
    }
}

#[async_trait]
impl MediaExtractor for AikiveExtractor {
    async fn extract(&self, url: &str) -> Result<Option<ExtractedMedia>> {
        let session = BrowserSession::launch(self.browser.as_deref()).await?;
        let result = self.sniff(&session, url).await;
        session.shutdown().await;
        result
    }
}

/// A master playlist describes every rendition, so prefer one when present;
/// otherwise settle for the first playlist seen.
fn pick_playlist(urls: &[String]) -> Option<&str> {
    urls.iter()
        .find(|u| u.contains("master.m3u8"))
        .or_else(|| urls.first())
        .map(String::as_str)
}

/// Aikive document titles look like "Some Show - Aikive"; keep the head.
fn derive_title(page_title: Option<String>) -> String {
    if let Some(title) = page_title {
        if let Some(head) = title.split(" - ").next() {
            let head = head.trim();
            if !head.is_empty() {
                return head.to_string();
            }
        }
    }
    DEFAULT_TITLE.to_string()
}
