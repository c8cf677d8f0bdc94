// mediagrab - saves YouTube, Instagram, Threads and Aikive links as MP4 or
// MP3. The library surface is the dispatcher plus the types the CLI needs;
// everything provider-specific stays behind it.

pub mod downloader;
pub mod ytdlp;

pub use downloader::{
    classify, validate, Dispatcher, DownloadError, DownloadRequest, ExtractedMedia, MediaKind,
    ProgressEvent, ProgressSink, ProviderKind, Result, ToolConfig,
};
