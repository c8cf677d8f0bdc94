// mediagrab CLI - validates the URL, spawns the download worker and renders
// progress on the main task. Exit code 0 on success, 1 on failure.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use mediagrab::downloader::tools::probe_version;
use mediagrab::downloader::utils::open_in_file_manager;
use mediagrab::{classify, Dispatcher, MediaKind, ProgressEvent, ProgressSink, ToolConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The URL to download (YouTube, Instagram, Aikive or Threads)
    url: Option<String>,

    /// Output directory (defaults to the platform Downloads folder)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// What to save: the full video as MP4, or just the audio as MP3
    #[arg(short = 'k', long, value_enum, default_value_t = MediaKind::Video)]
    kind: MediaKind,

    /// Emit progress as JSON lines instead of plain text
    #[clap(long)]
    json: bool,

    /// Open the output directory when the download succeeds
    #[clap(long)]
    open: bool,

    /// Print resolved tool paths and versions, then exit
    #[clap(long)]
    check_tools: bool,

    /// yt-dlp executable override
    #[clap(long, value_name = "PATH", env = "MEDIAGRAB_YTDLP")]
    ytdlp: Option<PathBuf>,

    /// ffmpeg executable override
    #[clap(long, value_name = "PATH", env = "MEDIAGRAB_FFMPEG")]
    ffmpeg: Option<PathBuf>,

    /// Chromium/Chrome executable for the Aikive/Threads extractors
    #[clap(long, value_name = "PATH", env = "MEDIAGRAB_BROWSER")]
    browser: Option<PathBuf>,

    /// CA bundle handed to yt-dlp (for self-contained installs)
    #[clap(long, value_name = "PATH", env = "MEDIAGRAB_CA_BUNDLE")]
    ca_bundle: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    // JSON mode keeps stdout machine-readable, so logging drops to errors.
    init_logging(args.verbose, args.json);

    let mut tools = ToolConfig::resolve();
    if let Some(path) = args.ytdlp {
        tools = tools.with_ytdlp(path);
    }
    if let Some(path) = args.ffmpeg {
        tools = tools.with_ffmpeg(path);
    }
    if let Some(path) = args.browser {
        tools = tools.with_browser(path);
    }
    if let Some(path) = args.ca_bundle {
        tools = tools.with_ca_bundle(path);
    }

    if args.check_tools {
        report_tools(&tools).await;
        return Ok(());
    }

    let url = match args.url {
        Some(ref url) => url.clone(),
        None => anyhow::bail!("a URL is required (or pass --check-tools)"),
    };
    let provider = match classify(&url) {
        Some(provider) => provider,
        None => anyhow::bail!("unsupported URL: {}", url),
    };
    info!("provider: {}", provider.as_str());

    let output_dir = match args.output {
        Some(dir) => dir,
        None => dirs::download_dir()
            .context("could not locate a Downloads directory; pass --output")?,
    };
    if !output_dir.is_dir() {
        anyhow::bail!("output directory does not exist: {}", output_dir.display());
    }

    let dispatcher = Dispatcher::new(tools);
    let (sink, mut rx) = ProgressSink::channel();
    let kind = args.kind;
    let worker_url = url;
    let worker_dir = output_dir.clone();
    let worker = tokio::spawn(async move {
        match kind {
            MediaKind::Video => {
                dispatcher
                    .download_video(&worker_url, &worker_dir, &sink)
                    .await
            }
            MediaKind::Audio => {
                dispatcher
                    .download_audio(&worker_url, &worker_dir, &sink)
                    .await
            }
        }
    });

    // The worker drops its sink when it finishes, which ends this loop.
    while let Some(event) = rx.recv().await {
        render_event(&event, args.json);
    }
    let ok = worker.await?;

    if !ok {
        anyhow::bail!("download failed");
    }
    if !args.json {
        println!("Saved to {}", output_dir.display());
    }
    if args.open {
        if let Err(e) = open_in_file_manager(&output_dir) {
            warn!("could not open {}: {}", output_dir.display(), e);
        }
    }
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_level(verbose))
        .init();
}

fn render_event(event: &ProgressEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("progress serialization failed: {}", e),
        }
    } else {
        println!("[{:>3.0}%] {}", event.percent, event.status);
    }
}

async fn report_tools(tools: &ToolConfig) {
    print_tool("yt-dlp", &tools.ytdlp, probe_version(&tools.ytdlp, "--version").await);
    print_tool("ffmpeg", &tools.ffmpeg, probe_version(&tools.ffmpeg, "-version").await);
    match &tools.browser {
        Some(path) => println!("browser: {}", path.display()),
        None => println!("browser: auto-detected at launch"),
    }
    match &tools.ca_bundle {
        Some(path) => println!("ca-bundle: {}", path.display()),
        None => println!("ca-bundle: system trust store"),
    }
}

fn print_tool(name: &str, path: &Path, version: Option<String>) {
    match version {
        Some(v) => println!("{}: {} ({})", name, path.display(), v),
        None => println!("{}: {} (not found or not runnable)", name, path.display()),
    }
}
