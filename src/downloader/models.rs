// Common data models for the download pipeline

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which download strategy handles a URL.
///
/// Classification precedence is fixed in `classifier::classify`; once a kind
/// is chosen for a URL it never changes mid-download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    /// YouTube, youtu.be, youtube-nocookie and Instagram post/reel forms,
    /// all handled by yt-dlp.
    YouTubeFamily,
    /// aikive.com list-video pages (HLS behind a player page).
    Aikive,
    /// threads.net posts (CDN-hosted MP4 behind the page).
    Threads,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::YouTubeFamily => "youtube-family",
            ProviderKind::Aikive => "aikive",
            ProviderKind::Threads => "threads",
        }
    }
}

/// Requested output flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Best available video+audio, saved as MP4.
    Video,
    /// Best available audio, transcoded to MP3 at 320 kbps.
    Audio,
}

impl MediaKind {
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Audio => "mp3",
        }
    }
}

/// One download invocation. Immutable once built; the output directory must
/// already exist and be writable (the caller checks, not the core).
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub output_dir: PathBuf,
    pub media_kind: MediaKind,
}

/// Direct media URL plus sanitized title, produced by the browser-driven
/// extractors. Lives for a single download attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMedia {
    pub media_url: String,
    pub title: String,
}

/// Download progress information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub percent: f32,
    pub status: String,
}

impl ProgressEvent {
    pub fn new(percent: f32, status: impl Into<String>) -> Self {
        Self {
            percent,
            status: status.into(),
        }
    }
}
