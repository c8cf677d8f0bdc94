// Provider download flows
//
// One provider per ProviderKind. The YouTube family delegates wholesale to
// yt-dlp; Aikive and Threads share the extract-then-transcode flow below.
// Every error is absorbed here: callers get a boolean and the progress
// channel carries the human-readable failure text.

mod aikive;
mod threads;
mod youtube;

pub use aikive::AikiveProvider;
pub use threads::ThreadsProvider;
pub use youtube::YouTubeProvider;

use std::path::Path;

use tracing::{info, warn};

use crate::downloader::extractors::MediaExtractor;
use crate::downloader::ffmpeg::{TranscodeMode, Transcoder};
use crate::downloader::models::MediaKind;
use crate::downloader::progress::ProgressSink;

// User-facing checkpoint texts. The extract-then-transcode flow has no real
// progress signal from ffmpeg, so these fixed steps are all the user sees.
struct Checkpoints {
    extracting: &'static str,
    extract_error_prefix: &'static str,
    none_extracted: &'static str,
    starting_prefix: &'static str,
    downloading: &'static str,
}

const VIDEO_CHECKPOINTS: Checkpoints = Checkpoints {
    extracting: "Extracting video URL...",
    extract_error_prefix: "Error extracting video URL",
    none_extracted: "Error: Could not extract video URL",
    starting_prefix: "Starting download",
    downloading: "Downloading video...",
};

const AUDIO_CHECKPOINTS: Checkpoints = Checkpoints {
    extracting: "Extracting audio URL...",
    extract_error_prefix: "Error extracting audio URL",
    none_extracted: "Error: Could not extract audio URL",
    starting_prefix: "Starting audio download",
    downloading: "Downloading audio...",
};

fn checkpoints(kind: MediaKind) -> &'static Checkpoints {
    match kind {
        MediaKind::Video => &VIDEO_CHECKPOINTS,
        MediaKind::Audio => &AUDIO_CHECKPOINTS,
    }
}

/// Extract a direct media URL, then hand it to ffmpeg. `video_mode` is the
/// per-site video treatment; audio always re-encodes to MP3. Emits the
/// checkpoint sequence 0, 10, 30, 100 on success and a single 0% failure
/// event otherwise.
async fn download_via_extraction(
    extractor: &dyn MediaExtractor,
    transcoder: &dyn Transcoder,
    url: &str,
    output_dir: &Path,
    kind: MediaKind,
    video_mode: TranscodeMode,
    progress: &ProgressSink,
) -> bool {
    let texts = checkpoints(kind);
    progress.emit(0.0, texts.extracting);

    let media = match extractor.extract(url).await {
        Ok(Some(media)) => media,
        Ok(None) => {
            warn!("no media found for {}", url);
            progress.emit(0.0, texts.none_extracted);
            return false;
        }
        Err(e) => {
            warn!("extraction failed for {}: {}", url, e);
            progress.emit(0.0, format!("{}: {}", texts.extract_error_prefix, e));
            return false;
        }
    };

    progress.emit(10.0, format!("{}: {}", texts.starting_prefix, media.title));

    let output = output_dir.join(format!("{}.{}", media.title, kind.extension()));
    let mode = match kind {
        MediaKind::Video => video_mode,
        MediaKind::Audio => TranscodeMode::ExtractMp3,
    };

    progress.emit(30.0, texts.downloading);
    match transcoder.run(&media.media_url, &output, mode).await {
        Ok(()) => {
            info!("saved {}", output.display());
            progress.emit(100.0, "Download complete!");
            true
        }
        Err(e) => {
            warn!("transcode failed for {}: {}", url, e);
            progress.emit(0.0, format!("Error: {}", e));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::downloader::errors::DownloadError;
    use crate::downloader::extractors::MockMediaExtractor;
    use crate::downloader::ffmpeg::MockTranscoder;
    use crate::downloader::models::{ExtractedMedia, ProgressEvent};

    use super::*;

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn extraction_error_surfaces_on_the_channel() {
        let mut extractor = MockMediaExtractor::new();
        extractor
            .expect_extract()
            .returning(|_| Err(DownloadError::PageTimeout));
        let mut transcoder = MockTranscoder::new();
        transcoder.expect_run().times(0);

        let (sink, mut rx) = ProgressSink::channel();
        let ok = download_via_extraction(
            &extractor,
            &transcoder,
            "https://aikive.com/list-video/123",
            Path::new("/dl"),
            MediaKind::Video,
            TranscodeMode::RemuxMp4 { adts_to_asc: true },
            &sink,
        )
        .await;

        assert!(!ok);
        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].percent, 0.0);
        assert_eq!(
            events[1].status,
            "Error extracting video URL: timed out waiting for the page to load"
        );
    }

    #[tokio::test]
    async fn output_lands_in_the_callers_directory() {
        let dir = tempfile::tempdir().unwrap();
        let expected = dir.path().join("Clip.mp3");

        let mut extractor = MockMediaExtractor::new();
        extractor.expect_extract().returning(|_| {
            Ok(Some(ExtractedMedia {
                media_url: "https://cdn.example/v.m3u8".to_string(),
                title: "Clip".to_string(),
            }))
        });
        let mut transcoder = MockTranscoder::new();
        transcoder
            .expect_run()
            .withf(move |_, output, mode| {
                output == expected && *mode == TranscodeMode::ExtractMp3
            })
            .returning(|_, _, _| Ok(()));

        let (sink, _rx) = ProgressSink::channel();
        let ok = download_via_extraction(
            &extractor,
            &transcoder,
            "https://aikive.com/list-video/123",
            dir.path(),
            MediaKind::Audio,
            TranscodeMode::RemuxMp4 { adts_to_asc: true },
            &sink,
        )
        .await;
        assert!(ok);
    }

    #[tokio::test]
    async fn transcode_failure_reports_the_tool_error() {
        let mut extractor = MockMediaExtractor::new();
        extractor.expect_extract().returning(|_| {
            Ok(Some(ExtractedMedia {
                media_url: "https://cdn.example/v.m3u8".to_string(),
                title: "Clip".to_string(),
            }))
        });
        let mut transcoder = MockTranscoder::new();
        transcoder.expect_run().returning(|_, _, _| {
            Err(DownloadError::ToolFailed {
                tool: "ffmpeg",
                code: Some(1),
                stderr: "Invalid data found".to_string(),
            })
        });

        let (sink, mut rx) = ProgressSink::channel();
        let ok = download_via_extraction(
            &extractor,
            &transcoder,
            "https://aikive.com/list-video/123",
            Path::new("/dl"),
            MediaKind::Video,
            TranscodeMode::RemuxMp4 { adts_to_asc: true },
            &sink,
        )
        .await;

        assert!(!ok);
        let events = drain(&mut rx);
        let last = events.last().unwrap();
        assert_eq!(last.percent, 0.0);
        assert!(last.status.starts_with("Error: "));
        assert!(last.status.contains("ffmpeg"));
        assert!(last.status.contains("Invalid data found"));
    }
}
