// Yt-dlp child-process driver for the YouTube family (YouTube, youtu.be,
// youtube-nocookie, Instagram)
//
// yt-dlp handles format selection, merging and MP3 extraction itself; this
// module builds the argument list, streams its `--newline` progress output
// into user-facing events, and turns a non-zero exit into a typed error with
// the most useful stderr line attached.

use std::io;
use std::path::Path;
use std::process::Stdio;

use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::downloader::errors::{DownloadError, Result};
use crate::downloader::models::{MediaKind, ProgressEvent};
use crate::downloader::progress::ProgressSink;
use crate::downloader::tools::ToolConfig;

const VIDEO_FORMAT: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";
const AUDIO_FORMAT: &str = "bestaudio/best";

/// Argument list for one yt-dlp invocation. `--newline` keeps the progress
/// output line-oriented; certificate checking stays off so self-contained
/// installs without a system trust store keep working.
pub fn build_download_args(
    url: &str,
    output_dir: &Path,
    kind: MediaKind,
    ffmpeg_location: Option<&Path>,
) -> Vec<String> {
    let template = output_dir.join("%(title)s.%(ext)s");

    let mut args = vec!["-f".to_string()];
    match kind {
        MediaKind::Video => {
            args.push(VIDEO_FORMAT.to_string());
            args.push("--merge-output-format".to_string());
            args.push("mp4".to_string());
        }
        MediaKind::Audio => {
            args.push(AUDIO_FORMAT.to_string());
            args.push("-x".to_string());
            args.push("--audio-format".to_string());
            args.push("mp3".to_string());
            args.push("--audio-quality".to_string());
            args.push("320K".to_string());
        }
    }
    for arg in ["--newline", "--no-warnings", "--no-check-certificates"] {
        args.push(arg.to_string());
    }
    args.push("-o".to_string());
    args.push(template.to_string_lossy().into_owned());
    if let Some(location) = ffmpeg_location {
        args.push("--ffmpeg-location".to_string());
        args.push(location.to_string_lossy().into_owned());
    }
    args.push(url.to_string());
    args
}

/// Parse one yt-dlp stdout line like:
/// `[download]  42.3% of 10.55MiB at  1.20MiB/s ETA 00:05`
/// into the event the user sees, if the line carries progress at all.
fn parse_progress_line(line: &str, kind: MediaKind) -> Option<ProgressEvent> {
    lazy_static::lazy_static! {
        static ref PROGRESS_RE: Regex = Regex::new(
            r"\[download\]\s+(\d+(?:\.\d+)?)%(?:\s+of\s+~?\s*(\S+))?(?:\s+at\s+(\S+))?"
        ).unwrap();
        static ref DEST_RE: Regex = Regex::new(r"\[download\]\s+Destination:\s+(.+)").unwrap();
        static ref POSTPROCESS_RE: Regex = Regex::new(r"^\[(?:Merger|ExtractAudio)\]").unwrap();
        static ref ALREADY_RE: Regex = Regex::new(r"has already been downloaded").unwrap();
    }

    if let Some(caps) = PROGRESS_RE.captures(line) {
        let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
        // The download phase is done; post-processing takes over from here.
        if percent >= 100.0 {
            return Some(finishing_event(kind));
        }
        let speed_str = match caps.get(3).and_then(|m| parse_speed_mbs(m.as_str())) {
            Some(mbs) => format!("{:.1} MB/s", mbs),
            None => "calculating...".to_string(),
        };
        return Some(ProgressEvent::new(
            percent,
            format!("Downloading... {:.1}% ({})", percent, speed_str),
        ));
    }

    if let Some(caps) = DEST_RE.captures(line) {
        let filename = caps.get(1).map(|m| m.as_str()).unwrap_or("file");
        let name = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());
        let short: String = name.chars().take(50).collect();
        return Some(ProgressEvent::new(0.0, format!("Starting: {}", short)));
    }

    if POSTPROCESS_RE.is_match(line) {
        return Some(finishing_event(kind));
    }

    if ALREADY_RE.is_match(line) {
        return Some(ProgressEvent::new(100.0, "File already downloaded"));
    }

    None
}

fn finishing_event(kind: MediaKind) -> ProgressEvent {
    let status = match kind {
        MediaKind::Video => "Download complete! Processing...",
        MediaKind::Audio => "Converting to MP3...",
    };
    ProgressEvent::new(100.0, status)
}

// yt-dlp prints speeds like "1.20MiB/s" or "524.29KiB/s"; "Unknown" shows
// up before the first measurement.
fn parse_speed_mbs(raw: &str) -> Option<f64> {
    lazy_static::lazy_static! {
        static ref SPEED_RE: Regex = Regex::new(r"^(\d+(?:\.\d+)?)([KMG])?i?B/s$").unwrap();
    }
    let caps = SPEED_RE.captures(raw)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let scale = match caps.get(2).map(|m| m.as_str()) {
        Some("K") => 1.0 / 1024.0,
        Some("M") => 1.0,
        Some("G") => 1024.0,
        _ => 1.0 / (1024.0 * 1024.0),
    };
    Some(value * scale)
}

/// Run one yt-dlp download to completion, streaming progress events as its
/// stdout arrives. The CA bundle, when configured, goes into the child's
/// environment only; the parent process environment is never touched.
fn build_command(tools: &ToolConfig, args: &[String]) -> Command {
    let mut cmd = Command::new(&tools.ytdlp);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(bundle) = &tools.ca_bundle {
        cmd.env("SSL_CERT_FILE", bundle)
            .env("REQUESTS_CA_BUNDLE", bundle);
    }
    cmd
}

pub async fn run_download(
    tools: &ToolConfig,
    url: &str,
    output_dir: &Path,
    kind: MediaKind,
    progress: &ProgressSink,
) -> Result<()> {
    let args = build_download_args(url, output_dir, kind, tools.ffmpeg_location.as_deref());
    info!("starting yt-dlp for {}", url);
    debug!(?args, "yt-dlp arguments");

    let mut child = build_command(tools, &args).spawn().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            DownloadError::ToolMissing { tool: "yt-dlp" }
        } else {
            DownloadError::Io(e)
        }
    })?;

    let stdout = child.stdout.take().ok_or_else(|| {
        DownloadError::Io(io::Error::new(
            io::ErrorKind::Other,
            "yt-dlp stdout not captured",
        ))
    })?;
    let stderr = child.stderr.take().ok_or_else(|| {
        DownloadError::Io(io::Error::new(
            io::ErrorKind::Other,
            "yt-dlp stderr not captured",
        ))
    })?;

    // Collect stderr on the side; it only matters if the exit is non-zero.
    let stderr_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        let mut collected = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            collected.push(line);
        }
        collected.join("\n")
    });

    let mut lines = BufReader::new(stdout).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(event) = parse_progress_line(&line, kind) {
            progress.emit(event.percent, event.status);
        }
        if line.contains("[download]") || line.contains("[Merger]") || line.contains("[ExtractAudio]")
        {
            debug!("yt-dlp: {}", line);
        }
    }

    let status = child.wait().await?;
    let stderr_output = stderr_task.await.unwrap_or_default();

    if status.success() {
        info!("yt-dlp finished for {}", url);
        return Ok(());
    }

    warn!("yt-dlp failed: {}", stderr_output.trim());
    let line = stderr_output
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| {
            stderr_output
                .lines()
                .map(str::trim)
                .rev()
                .find(|l| !l.is_empty())
        })
        .unwrap_or("unknown error");
    let preview: String = line.chars().take(100).collect();
    Err(DownloadError::ToolFailed {
        tool: "yt-dlp",
        code: status.code(),
        stderr: preview,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::{OsStr, OsString};
    use std::path::PathBuf;

    fn tools(ca_bundle: Option<PathBuf>) -> ToolConfig {
        ToolConfig {
            ytdlp: PathBuf::from("yt-dlp"),
            ffmpeg: PathBuf::from("ffmpeg"),
            ffmpeg_location: None,
            browser: None,
            ca_bundle,
        }
    }

    #[test]
    fn ca_bundle_reaches_the_child_env_only() {
        let parent_before = (
            std::env::var_os("SSL_CERT_FILE"),
            std::env::var_os("REQUESTS_CA_BUNDLE"),
        );

        let config = tools(Some(PathBuf::from("/opt/bundle/cacert.pem")));
        let cmd = build_command(&config, &[]);
        let envs: Vec<(OsString, Option<OsString>)> = cmd
            .as_std()
            .get_envs()
            .map(|(k, v)| (k.to_os_string(), v.map(OsStr::to_os_string)))
            .collect();

        for key in ["SSL_CERT_FILE", "REQUESTS_CA_BUNDLE"] {
            let value = envs
                .iter()
                .find(|(k, _)| k == key)
                .and_then(|(_, v)| v.clone());
            assert_eq!(value, Some(OsString::from("/opt/bundle/cacert.pem")));
        }

        let parent_after = (
            std::env::var_os("SSL_CERT_FILE"),
            std::env::var_os("REQUESTS_CA_BUNDLE"),
        );
        assert_eq!(parent_after, parent_before);
    }

    #[test]
    fn no_ca_bundle_leaves_the_child_env_alone() {
        let cmd = build_command(&tools(None), &[]);
        assert_eq!(cmd.as_std().get_envs().count(), 0);
    }

    #[test]
    fn video_args_select_mp4_merge() {
        let args = build_download_args(
            "https://youtu.be/dQw4w9WgXcQ",
            Path::new("/dl"),
            MediaKind::Video,
            None,
        );
        let got: Vec<&str> = args.iter().map(String::as_str).collect();
        assert_eq!(
            got,
            vec![
                "-f",
                VIDEO_FORMAT,
                "--merge-output-format",
                "mp4",
                "--newline",
                "--no-warnings",
                "--no-check-certificates",
                "-o",
                "/dl/%(title)s.%(ext)s",
                "https://youtu.be/dQw4w9WgXcQ",
            ]
        );
    }

    #[test]
    fn audio_args_extract_mp3_at_320k() {
        let args = build_download_args(
            "https://youtu.be/dQw4w9WgXcQ",
            Path::new("/dl"),
            MediaKind::Audio,
            None,
        );
        let got: Vec<&str> = args.iter().map(String::as_str).collect();
        assert_eq!(
            got,
            vec![
                "-f",
                AUDIO_FORMAT,
                "-x",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "320K",
                "--newline",
                "--no-warnings",
                "--no-check-certificates",
                "-o",
                "/dl/%(title)s.%(ext)s",
                "https://youtu.be/dQw4w9WgXcQ",
            ]
        );
    }

    #[test]
    fn ffmpeg_location_is_forwarded() {
        let args = build_download_args(
            "https://youtu.be/dQw4w9WgXcQ",
            Path::new("/dl"),
            MediaKind::Video,
            Some(&PathBuf::from("/opt/bundle")),
        );
        let pos = args.iter().position(|a| a == "--ffmpeg-location");
        assert!(pos.is_some());
        assert_eq!(args[pos.unwrap() + 1], "/opt/bundle");
    }

    #[test]
    fn progress_line_reports_speed_in_mbs() {
        let event = parse_progress_line(
            "[download]  42.3% of 10.55MiB at    1.20MiB/s ETA 00:05",
            MediaKind::Video,
        )
        .unwrap();
        assert_eq!(event.percent, 42.3);
        assert_eq!(event.status, "Downloading... 42.3% (1.2 MB/s)");
    }

    #[test]
    fn unknown_speed_reads_calculating() {
        let event = parse_progress_line(
            "[download]   0.0% of ~  10.55MiB at  Unknown B/s ETA Unknown",
            MediaKind::Video,
        )
        .unwrap();
        assert_eq!(event.percent, 0.0);
        assert!(event.status.contains("calculating"));
    }

    #[test]
    fn kib_speeds_convert_to_mbs() {
        let event = parse_progress_line(
            "[download]  10.0% of 31.99MiB at  524.29KiB/s ETA 01:02",
            MediaKind::Video,
        )
        .unwrap();
        assert_eq!(event.status, "Downloading... 10.0% (0.5 MB/s)");
    }

    #[test]
    fn complete_download_line_switches_to_processing() {
        let event = parse_progress_line(
            "[download] 100% of 10.55MiB in 00:08",
            MediaKind::Video,
        )
        .unwrap();
        assert_eq!(event.percent, 100.0);
        assert_eq!(event.status, "Download complete! Processing...");
    }

    #[test]
    fn merger_line_reports_processing() {
        let event = parse_progress_line(
            "[Merger] Merging formats into \"/dl/My Title.mp4\"",
            MediaKind::Video,
        )
        .unwrap();
        assert_eq!(event.percent, 100.0);
        assert_eq!(event.status, "Download complete! Processing...");
    }

    #[test]
    fn extract_audio_line_reports_conversion() {
        let event = parse_progress_line(
            "[ExtractAudio] Destination: /dl/My Title.mp3",
            MediaKind::Audio,
        )
        .unwrap();
        assert_eq!(event.percent, 100.0);
        assert_eq!(event.status, "Converting to MP3...");
    }

    #[test]
    fn destination_line_announces_the_file() {
        let event = parse_progress_line(
            "[download] Destination: /dl/My Title.f137.mp4",
            MediaKind::Video,
        )
        .unwrap();
        assert_eq!(event.percent, 0.0);
        assert_eq!(event.status, "Starting: My Title.f137.mp4");
    }

    #[test]
    fn already_downloaded_counts_as_success() {
        let event = parse_progress_line(
            "[download] /dl/My Title.mp4 has already been downloaded",
            MediaKind::Video,
        )
        .unwrap();
        assert_eq!(event.percent, 100.0);
        assert_eq!(event.status, "File already downloaded");
    }

    #[test]
    fn chatter_lines_emit_nothing() {
        assert!(parse_progress_line("[youtube] dQw4w9WgXcQ: Downloading webpage", MediaKind::Video)
            .is_none());
        assert!(parse_progress_line("", MediaKind::Video).is_none());
    }
}
