// External tool discovery
//
// Every path is resolved once at startup and injected into the dispatcher.
// Nothing here mutates the process environment; the CA bundle is forwarded
// to child processes only.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::utils::run_output_with_timeout;

#[cfg(windows)]
const FFMPEG_BIN: &str = "ffmpeg.exe";
#[cfg(not(windows))]
const FFMPEG_BIN: &str = "ffmpeg";

#[cfg(windows)]
const YTDLP_BIN: &str = "yt-dlp.exe";
#[cfg(not(windows))]
const YTDLP_BIN: &str = "yt-dlp";

/// Resolved locations of everything the providers shell out to.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// yt-dlp executable.
    pub ytdlp: PathBuf,
    /// ffmpeg executable, used directly for the Aikive/Threads transcode.
    pub ffmpeg: PathBuf,
    /// Forwarded to yt-dlp via --ffmpeg-location (a directory for bundled
    /// installs, a binary path for explicit overrides). None lets yt-dlp
    /// resolve ffmpeg from PATH itself.
    pub ffmpeg_location: Option<PathBuf>,
    /// Chromium/Chrome executable for the extractors. None leaves discovery
    /// to the browser layer.
    pub browser: Option<PathBuf>,
    /// CA bundle handed to yt-dlp children via SSL_CERT_FILE and
    /// REQUESTS_CA_BUNDLE. Set when running from a self-contained install
    /// that ships its own trust store.
    pub ca_bundle: Option<PathBuf>,
}

impl ToolConfig {
    /// Resolve every tool once. Copies sitting next to our own executable
    /// win over system installs; system installs win over a bare name.
    pub fn resolve() -> Self {
        let exe_dir = exe_dir();

        let bundled_ffmpeg = exe_dir
            .as_deref()
            .map(|d| d.join(FFMPEG_BIN))
            .filter(|p| p.is_file());
        let (ffmpeg, ffmpeg_location) = match bundled_ffmpeg {
            Some(path) => {
                let location = path.parent().map(Path::to_path_buf);
                (path, location)
            }
            None => (find_tool("ffmpeg"), None),
        };

        let ytdlp = exe_dir
            .as_deref()
            .map(|d| d.join(YTDLP_BIN))
            .filter(|p| p.is_file())
            .unwrap_or_else(|| find_tool("yt-dlp"));

        let ca_bundle = exe_dir
            .as_deref()
            .map(|d| d.join("cacert.pem"))
            .filter(|p| p.is_file());

        let config = Self {
            ytdlp,
            ffmpeg,
            ffmpeg_location,
            browser: None,
            ca_bundle,
        };
        info!(
            ytdlp = %config.ytdlp.display(),
            ffmpeg = %config.ffmpeg.display(),
            bundled_ca = config.ca_bundle.is_some(),
            "resolved external tools"
        );
        config
    }

    pub fn with_ytdlp(mut self, path: PathBuf) -> Self {
        self.ytdlp = path;
        self
    }

    /// Point both the direct transcode and yt-dlp at the same binary.
    pub fn with_ffmpeg(mut self, path: PathBuf) -> Self {
        self.ffmpeg_location = Some(path.clone());
        self.ffmpeg = path;
        self
    }

    pub fn with_browser(mut self, path: PathBuf) -> Self {
        self.browser = Some(path);
        self
    }

    pub fn with_ca_bundle(mut self, path: PathBuf) -> Self {
        self.ca_bundle = Some(path);
        self
    }
}

/// Ask a tool for its version, for the startup report. None means the tool
/// is missing, broken, or hung past the probe timeout.
pub async fn probe_version(path: &Path, version_arg: &str) -> Option<String> {
    let output = run_output_with_timeout(path, &[version_arg], 5).await.ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
}

// A self-contained install drops ffmpeg/yt-dlp/cacert.pem next to our
// own executable.
fn exe_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    exe.parent().map(Path::to_path_buf)
}

// Check common install locations first, then PATH via `which`, then fall
// back to the bare name and let the OS search PATH at spawn time.
fn find_tool(name: &str) -> PathBuf {
    let common_paths = [
        format!("/opt/homebrew/bin/{}", name),
        format!("/usr/local/bin/{}", name),
        format!("/usr/bin/{}", name),
    ];

    for candidate in common_paths {
        let path = Path::new(&candidate);
        if path.exists() {
            debug!(tool = name, path = %path.display(), "found in a common install path");
            return path.to_path_buf();
        }
    }

    if let Ok(output) = std::process::Command::new("which").arg(name).output() {
        if output.status.success() {
            if let Ok(found) = String::from_utf8(output.stdout) {
                let trimmed = found.trim();
                if !trimmed.is_empty() {
                    debug!(tool = name, path = trimmed, "found via which");
                    return PathBuf::from(trimmed);
                }
            }
        }
    }

    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ffmpeg_override_also_retargets_ytdlp() {
        let config = ToolConfig {
            ytdlp: PathBuf::from("yt-dlp"),
            ffmpeg: PathBuf::from("ffmpeg"),
            ffmpeg_location: None,
            browser: None,
            ca_bundle: None,
        };
        let config = config.with_ffmpeg(PathBuf::from("/custom/ffmpeg"));
        assert_eq!(config.ffmpeg, PathBuf::from("/custom/ffmpeg"));
        assert_eq!(config.ffmpeg_location, Some(PathBuf::from("/custom/ffmpeg")));
    }
}
