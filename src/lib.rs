pub mod config;
pub mod download;
pub mod episode;
pub mod error;
pub mod fetch;
pub mod http;
pub mod progress;

// Re-export main types for convenience
pub use config::{Config, DEFAULT_USER_AGENT};
pub use download::{
    AlwaysOverwrite, ArtifactOutcome, DownloadMode, DownloadReport, DownloadRequest,
    NeverOverwrite, OverwritePolicy, download,
};
pub use episode::{EpisodeMetadata, EpisodeRef, extract, file_name, sanitize, validate};
pub use error::{ConfigError, DownloadError, ExtractError, FetchError, UrlError};
pub use fetch::{RetryPolicy, fetch_stream, fetch_text};
pub use http::{ByteStream, HttpClient, ReqwestClient, StreamResponse, TextResponse};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
