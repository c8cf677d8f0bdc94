// Media extraction module - headless-browser URL sniffing
//
// Aikive and Threads never expose a direct media URL in their markup; the
// player fetches it over the network after load. Each extractor here drives
// one headless Chromium page, records the responses the page triggers, and
// picks the media URL out of that traffic.
//
// The `MediaExtractor` trait is the seam the providers test against; the
// chromiumoxide plumbing stays behind it.

mod browser;

mod aikive;
mod threads;

pub use aikive::AikiveExtractor;
pub use browser::{BrowserSession, SniffedPage};
pub use threads::ThreadsExtractor;

use async_trait::async_trait;

use crate::downloader::errors::Result;
use crate::downloader::models::ExtractedMedia;

/// Resolves a page URL to a directly downloadable media URL plus a title
/// usable as a file name.
///
/// `Ok(None)` means the page loaded but no qualifying media response was
/// observed; `Err` means the extraction itself could not run (no browser,
/// navigation timeout and the like).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<Option<ExtractedMedia>>;
}
