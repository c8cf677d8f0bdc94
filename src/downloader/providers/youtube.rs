// YouTube-family provider
//
// Thin boundary over the yt-dlp driver: progress streams straight through
// while it runs, and any failure collapses into a single error event plus
// `false` so nothing typed escapes to the caller.

use tracing::warn;

use crate::downloader::models::DownloadRequest;
use crate::downloader::progress::ProgressSink;
use crate::downloader::tools::ToolConfig;
use crate::ytdlp;

pub struct YouTubeProvider {
    tools: ToolConfig,
}

impl YouTubeProvider {
    pub fn new(tools: ToolConfig) -> Self {
        Self { tools }
    }

    pub async fn download(&self, request: &DownloadRequest, progress: &ProgressSink) -> bool {
        let result = ytdlp::run_download(
            &self.tools,
            &request.url,
            &request.output_dir,
            request.media_kind,
            progress,
        )
        .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("yt-dlp download failed for {}: {}", request.url, e);
                progress.emit(0.0, format!("Error: {}", e));
                false
            }
        }
    }
}
