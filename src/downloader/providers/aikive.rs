// Aikive provider
//
// Extracts the HLS playlist with the browser, then remuxes it to MP4. The
// playlist audio arrives as raw ADTS, so the video path always applies the
// aac_adtstoasc bitstream filter.

use crate::downloader::extractors::{AikiveExtractor, MediaExtractor};
use crate::downloader::ffmpeg::{FfmpegTranscoder, TranscodeMode, Transcoder};
use crate::downloader::models::DownloadRequest;
use crate::downloader::progress::ProgressSink;
use crate::downloader::tools::ToolConfig;

use super::download_via_extraction;

pub struct AikiveProvider {
    extractor: Box<dyn MediaExtractor>,
    transcoder: Box<dyn Transcoder>,
}

impl AikiveProvider {
    pub fn new(tools: &ToolConfig) -> Self {
        Self::with_parts(
            Box::new(AikiveExtractor::new(tools.browser.clone())),
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
            TranscodeMode::RemuxMp4 { adts_to_asc: true },
            progress,
        )
        .await
    }
}
