// Ffmpeg remux and transcode step
//
// Extraction providers hand over a stream URL (usually HLS or a bare MP4)
// and this module turns it into the final file. Video is stream-copied;
// AAC audio coming out of an HLS playlist is in ADTS framing and needs the
// bitstream filter before it is legal inside an MP4 container.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::errors::{DownloadError, Result};

/// How ffmpeg should treat the extracted stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscodeMode {
    /// Copy both streams into an MP4 container, optionally rewriting the
    /// audio framing from ADTS to the MP4-native form.
    RemuxMp4 { adts_to_asc: bool },
    /// Drop the video track and re-encode the audio as 320k MP3.
    ExtractMp3,
}

/// Argument list for a single ffmpeg invocation. Split out so tests can pin
/// the exact command line without spawning anything.
pub fn build_ffmpeg_args(input: &str, output: &Path, mode: TranscodeMode) -> Vec<String> {
    let mut args = vec!["-y".to_string(), "-i".to_string(), input.to_string()];
    match mode {
        TranscodeMode::RemuxMp4 { adts_to_asc } => {
            args.push("-c".to_string());
            args.push("copy".to_string());
            if adts_to_asc {
                args.push("-bsf:a".to_string());
                args.push("aac_adtstoasc".to_string());
            }
        }
        TranscodeMode::ExtractMp3 => {
            for arg in ["-vn", "-acodec", "libmp3lame", "-ab", "320k"] {
                args.push(arg.to_string());
            }
        }
    }
    args.push(output.to_string_lossy().into_owned());
    args
}

/// Runs ffmpeg against an extracted stream URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn run(&self, input: &str, output: &Path, mode: TranscodeMode) -> Result<()>;
}

/// Real transcoder backed by the resolved ffmpeg binary.
pub struct FfmpegTranscoder {
    ffmpeg: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg: PathBuf) -> Self {
        Self { ffmpeg }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn run(&self, input: &str, output: &Path, mode: TranscodeMode) -> Result<()> {
        let args = build_ffmpeg_args(input, output, mode);
        debug!(ffmpeg = %self.ffmpeg.display(), ?args, "running ffmpeg");

        let out = Command::new(&self.ffmpeg)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    DownloadError::ToolMissing { tool: "ffmpeg" }
                } else {
                    DownloadError::Io(e)
                }
            })?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            warn!(code = ?out.status.code(), "ffmpeg failed: {}", stderr.trim());
            // Ffmpeg prints its actual complaint last, after pages of
            // configuration and stream banners.
            let line = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("")
                .trim()
                .to_string();
            return Err(DownloadError::ToolFailed {
                tool: "ffmpeg",
                code: out.status.code(),
                stderr: line,
            });
        }

        debug!(output = %output.display(), "ffmpeg finished");
        Ok(())
    }
}
