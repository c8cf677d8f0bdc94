// Dispatcher - URL to provider routing
//
// One provider per kind, built once from the resolved tool paths. The
// boolean contract holds here too: an unresolvable URL is `false`, never an
// error, because callers are expected to validate first.

use std::path::Path;

use tracing::{info, warn};

use super::classifier;
use super::errors::DownloadError;
use super::models::{DownloadRequest, MediaKind, ProviderKind};
use super::progress::ProgressSink;
use super::providers::{AikiveProvider, ThreadsProvider, YouTubeProvider};
use super::tools::ToolConfig;

pub struct Dispatcher {
    youtube: YouTubeProvider,
    aikive: AikiveProvider,
    threads: ThreadsProvider,
}

impl Dispatcher {
    pub fn new(tools: ToolConfig) -> Self {
        Self {
            aikive: AikiveProvider::new(&tools),
            threads: ThreadsProvider::new(&tools),
            youtube: YouTubeProvider::new(tools),
        }
    }

    /// True when some provider will accept the URL.
    pub fn validate(&self, url: &str) -> bool {
        classifier::validate(url)
    }

    /// Which provider the URL would go to, if any.
    pub fn resolve(&self, url: &str) -> Option<ProviderKind> {
        classifier::classify(url)
    }

    pub async fn download_video(
        &self,
        url: &str,
        output_dir: &Path,
        progress: &ProgressSink,
    ) -> bool {
        self.download(url, output_dir, MediaKind::Video, progress)
            .await
    }

    pub async fn download_audio(
        &self,
        url: &str,
        output_dir: &Path,
        progress: &ProgressSink,
    ) -> bool {
        self.download(url, output_dir, MediaKind::Audio, progress)
            .await
    }

    async fn download(
        &self,
        url: &str,
        output_dir: &Path,
        kind: MediaKind,
        progress: &ProgressSink,
    ) -> bool {
        let provider = match self.resolve(url) {
            Some(provider) => provider,
            None => {
                warn!("{}", DownloadError::UnsupportedUrl(url.to_string()));
                return false;
            }
        };
        info!("dispatching {} to {}", url, provider.as_str());

        let request = DownloadRequest {
            url: url.to_string(),
            output_dir: output_dir.to_path_buf(),
            media_kind: kind,
        };
        match provider {
            ProviderKind::YouTubeFamily => self.youtube.download(&request, progress).await,
            ProviderKind::Aikive => self.aikive.download(&request, progress).await,
            ProviderKind::Threads => self.threads.download(&request, progress).await,
        }
    }
}
