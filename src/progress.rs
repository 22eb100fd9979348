use std::path::PathBuf;
use std::sync::Arc;

/// Events emitted during one episode download for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The episode page is being fetched
    FetchingPage { url: String },

    /// A fetch attempt failed with a transient error and will be retried
    RetryingFetch {
        url: String,
        /// Attempt that just failed (1-based)
        attempt: u32,
        max_attempts: u32,
    },

    /// Metadata was extracted from the page
    MetadataExtracted { title: String, host: String },

    /// The audio transfer is starting
    DownloadStarting {
        file_name: String,
        /// Expected content length in bytes, if the server reported one
        content_length: Option<u64>,
    },

    /// Transfer progress update, emitted after each chunk
    DownloadProgress {
        file_name: String,
        bytes_downloaded: u64,
        /// None when the server did not report a total size
        total_bytes: Option<u64>,
    },

    /// Transfer finished, the partial file is being renamed into place
    Finalizing { file_name: String },

    /// The audio file was written successfully
    DownloadCompleted {
        file_name: String,
        bytes_downloaded: u64,
    },

    /// The audio transfer failed
    DownloadFailed { file_name: String, error: String },

    /// The show-notes file was written successfully
    NotesWritten { path: PathBuf },
}

/// Trait for reporting progress events during a download.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics. The core never performs terminal I/O itself.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {
        // Intentionally empty
    }
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_reporter_handles_all_events() {
        let reporter = NoopReporter;

        reporter.report(ProgressEvent::FetchingPage {
            url: "https://www.xiaoyuzhoufm.com/episode/abc123".to_string(),
        });

        reporter.report(ProgressEvent::RetryingFetch {
            url: "https://www.xiaoyuzhoufm.com/episode/abc123".to_string(),
            attempt: 1,
            max_attempts: 3,
        });

        reporter.report(ProgressEvent::MetadataExtracted {
            title: "Test Episode".to_string(),
            host: "Test Host".to_string(),
        });

        reporter.report(ProgressEvent::DownloadStarting {
            file_name: "Test Host - Test Episode.mp3".to_string(),
            content_length: Some(1024),
        });

        reporter.report(ProgressEvent::DownloadProgress {
            file_name: "Test Host - Test Episode.mp3".to_string(),
            bytes_downloaded: 512,
            total_bytes: None,
        });

        reporter.report(ProgressEvent::Finalizing {
            file_name: "Test Host - Test Episode.mp3".to_string(),
        });

        reporter.report(ProgressEvent::DownloadCompleted {
            file_name: "Test Host - Test Episode.mp3".to_string(),
            bytes_downloaded: 1024,
        });

        reporter.report(ProgressEvent::DownloadFailed {
            file_name: "Test Host - Test Episode.mp3".to_string(),
            error: "Connection timeout".to_string(),
        });

        reporter.report(ProgressEvent::NotesWritten {
            path: PathBuf::from("Test Host - Test Episode.md"),
        });
    }
}
