use std::path::PathBuf;
use thiserror::Error;

/// Errors produced when validating an episode URL. No I/O has been
/// performed when any of these surface.
#[derive(Error, Debug)]
pub enum UrlError {
    #[error("Not a valid URL '{input}': {source}")]
    Malformed {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported host '{host}' (expected www.xiaoyuzhoufm.com)")]
    UnsupportedHost { host: String },

    #[error("URL has no /episode/<id> path: {url}")]
    MissingEpisodeId { url: String },

    #[error("Episode identifier '{id}' is not alphanumeric")]
    InvalidEpisodeId { id: String },
}

/// Errors from the retrying fetch layer
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed for {url}: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Giving up on {url} after {attempts} attempts: {source}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        source: Box<FetchError>,
    },

    #[error("Stream error while reading {url}: {source}")]
    StreamFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Errors from metadata extraction. The page was fetched and parsed, but a
/// required field could not be located. Audio and title failures stay
/// separate so callers can report which field was missing.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractError {
    #[error("No audio source found in page")]
    AudioMissing,

    #[error("No parseable episode title found in page")]
    TitleMissing,
}

impl ExtractError {
    /// Name of the metadata field that could not be extracted
    pub fn field(&self) -> &'static str {
        match self {
            ExtractError::AudioMissing => "audio",
            ExtractError::TitleMissing => "title",
        }
    }
}

/// Errors from loading, saving, or validating the configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize config: {0}")]
    SerializeFailed(#[from] serde_json::Error),
}

/// Top-level errors for one orchestrated download
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Invalid episode URL: {0}")]
    Url(#[from] UrlError),

    #[error("Failed to fetch episode page: {0}")]
    PageFetch(#[source] FetchError),

    #[error("Failed to extract episode metadata: {0}")]
    Extract(#[from] ExtractError),

    #[error("Failed to fetch audio: {0}")]
    AudioFetch(#[source] FetchError),

    #[error("File already exists: {path}")]
    FileExists { path: PathBuf },

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create file {path}: {source}")]
    FileCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to file {path}: {source}")]
    FileWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to finalize {path}: {source}")]
    FinalizeFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Download cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_error_reports_missing_field() {
        assert_eq!(ExtractError::AudioMissing.field(), "audio");
        assert_eq!(ExtractError::TitleMissing.field(), "title");
    }

    #[test]
    fn download_error_keeps_fetch_context() {
        let page = DownloadError::PageFetch(FetchError::HttpStatus {
            url: "https://example.com/episode/abc".to_string(),
            status: 500,
        });
        let audio = DownloadError::AudioFetch(FetchError::HttpStatus {
            url: "https://example.com/audio.mp3".to_string(),
            status: 500,
        });

        assert!(page.to_string().contains("episode page"));
        assert!(audio.to_string().contains("audio"));
    }
}
