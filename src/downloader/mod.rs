// Downloader module - URL classification, extraction and provider dispatch

pub mod classifier;
pub mod dispatcher;
pub mod errors;
pub mod extractors;
pub mod ffmpeg;
pub mod models;
pub mod progress;
pub mod providers;
pub mod tools;
pub mod utils;

pub use classifier::{classify, validate};
pub use dispatcher::Dispatcher;
pub use errors::{DownloadError, Result};
pub use models::{DownloadRequest, ExtractedMedia, MediaKind, ProgressEvent, ProviderKind};
pub use progress::ProgressSink;
pub use tools::ToolConfig;
