// URL classification for the supported providers
//
// Precedence is fixed: Aikive, then Threads, then the YouTube family; first
// match wins. The Threads substring fallback is deliberately broad (a URL
// merely containing the domain validates) and is kept as shipped behavior.

use lazy_static::lazy_static;
use regex::Regex;

use super::models::ProviderKind;

lazy_static! {
    // Eleven-character video id after any of the accepted path forms.
    static ref YOUTUBE_RE: Regex = Regex::new(
        r"^(?:https?://)?(?:www\.)?(?:youtube|youtu|youtube-nocookie)\.(?:com|be)/(?:watch\?v=|embed/|v/|.+\?v=|shorts/)?[^&=%?]{11}"
    ).unwrap();
    static ref INSTAGRAM_RE: Regex = Regex::new(
        r"^(?:https?://)?(?:www\.)?instagram\.com/(?:p|reel|reels|tv)/[\w-]+"
    ).unwrap();
    static ref AIKIVE_RE: Regex = Regex::new(
        r"^https?://aikive\.com/list-video/(?:shorts/)?\d+"
    ).unwrap();
    static ref THREADS_RE: Regex = Regex::new(
        r"^https?://(?:www\.)?threads\.net/@[\w.]+/post/\w+"
    ).unwrap();
}

/// Map a URL to the provider that handles it, or `None` when nothing claims
/// it. A kind is chosen once per URL and never changes mid-download.
pub fn classify(url: &str) -> Option<ProviderKind> {
    if AIKIVE_RE.is_match(url) {
        return Some(ProviderKind::Aikive);
    }
    if THREADS_RE.is_match(url) || url.contains("threads.com") || url.contains("threads.net") {
        return Some(ProviderKind::Threads);
    }
    if YOUTUBE_RE.is_match(url) || INSTAGRAM_RE.is_match(url) {
        return Some(ProviderKind::YouTubeFamily);
    }
    None
}

/// True iff some provider claims the URL.
pub fn validate(url: &str) -> bool {
    classify(url).is_some()
}
