// Error types for the download pipeline
//
// These never cross the dispatcher boundary: providers absorb them into a
// failure progress event plus a `false` return. The typed forms exist so the
// boundary conversion and the logs have one shape to work with.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DownloadError>;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// No provider pattern matched the URL.
    #[error("unsupported URL: {0}")]
    UnsupportedUrl(String),

    /// Required external tool is not installed or not on PATH.
    #[error("external tool is missing: {tool}")]
    ToolMissing { tool: &'static str },

    /// External tool ran but exited non-zero. `stderr` carries the most
    /// useful diagnostic line; the full output goes to the log.
    #[error("external tool failed: {tool} (code={code:?}) {stderr}")]
    ToolFailed {
        tool: &'static str,
        code: Option<i32>,
        stderr: String,
    },

    /// Headless browser could not be launched (not installed is the common
    /// case; recoverable, reported to the user rather than fatal).
    #[error("browser automation unavailable: {0}")]
    BrowserUnavailable(String),

    /// Navigation or the network-idle wait ran past its deadline.
    #[error("timed out waiting for the page to load")]
    PageTimeout,

    /// Anything else the browser session reports mid-extraction.
    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failed_display_names_the_tool() {
        let err = DownloadError::ToolFailed {
            tool: "ffmpeg",
            code: Some(1),
            stderr: "muxer said no".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ffmpeg"));
        assert!(msg.contains("code=Some(1)"));
        assert!(msg.contains("muxer said no"));
    }

    #[test]
    fn unsupported_url_display_carries_the_url() {
        let err = DownloadError::UnsupportedUrl("ftp://nope".to_string());
        assert_eq!(err.to_string(), "unsupported URL: ftp://nope");
    }
}
