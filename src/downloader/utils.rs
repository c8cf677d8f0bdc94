// Helper functions shared across the download pipeline

use std::io;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration as TokioDuration};

// Characters no extracted title may carry into a filename.
const FORBIDDEN_TITLE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Strip filesystem-hostile characters from an extracted title. `extra`
/// holds per-site additions (Threads also drops `@` from handles).
pub fn sanitize_title(title: &str, extra: &[char]) -> String {
    title
        .chars()
        .filter(|c| !FORBIDDEN_TITLE_CHARS.contains(c) && !extra.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Run command with timeout (shared utility)
pub async fn run_output_with_timeout(
    program: &Path,
    args: &[&str],
    timeout_secs: u64,
) -> io::Result<std::process::Output> {
    let mut cmd = TokioCommand::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match timeout(TokioDuration::from_secs(timeout_secs), cmd.output()).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("{} timed out after {}s", program.display(), timeout_secs),
        )),
    }
}

/// Open a directory in the platform file manager. Spawn-and-forget; callers
/// log the error, a finished download must never fail on this.
pub fn open_in_file_manager(dir: &Path) -> io::Result<()> {
    #[cfg(target_os = "macos")]
    let program = "open";
    #[cfg(target_os = "windows")]
    let program = "explorer";
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let program = "xdg-open";

    std::process::Command::new(program).arg(dir).spawn()?;
    Ok(())
}
