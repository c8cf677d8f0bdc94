// Threads provider
//
// Extracts the post's CDN-hosted MP4 with the browser, then copies it into
// a clean container. Unlike Aikive there is no HLS involved, so the video
// path is a plain stream copy.

use crate::downloader::extractors::{MediaExtractor, ThreadsExtractor};
use crate::downloader::ffmpeg::{FfmpegTranscoder, TranscodeMode, Transcoder};
use crate::downloader::models::DownloadRequest;
use crate::downloader::progress::ProgressSink;
use crate::downloader::tools::ToolConfig;

use super::download_via_extraction;

pub struct ThreadsProvider {
    extractor: Box<dyn MediaExtractor>,
    transcoder: Box<dyn Transcoder>,
}

impl ThreadsProvider {
    pub fn new(tools: &ToolConfig) -> Self {
        Self::with_parts(
            Box::new(ThreadsExtractor::new(tools.browser.clone())),
            Box::new(FfmpegTranscoder::new(tools.ffmpeg.clone())),
        )
    }

    pub fn with_parts(extractor: Box<dyn MediaExtractor>, transcoder: Box<dyn Transcoder>) -> Self {
        Self {
            extractor,
            transcoder,
        }
    }

    pub async fn download(&self, request: &DownloadRequest, progress: &ProgressSink) -> bool {
        download_via_extraction(
            self.extractor.as_ref(),
            self.transcoder.as_ref(),
            &request.url,
            &request.output_dir,
            request.media_kind,
            TranscodeMode::RemuxMp4 { adts_to_asc: false },
            progress,
        )
        .await
    }
}
