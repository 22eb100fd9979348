// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Download orchestration: validate → fetch page → extract → name →
//! retrieve artifacts.

mod audio;
mod notes;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::episode::{self, EpisodeMetadata, EpisodeRef};
use crate::error::DownloadError;
use crate::fetch::{RetryPolicy, fetch_text};
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// Which artifacts to retrieve for an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    /// Audio file only
    Audio,
    /// Show-notes file only
    Notes,
    /// Both artifacts
    Both,
}

impl DownloadMode {
    pub fn wants_audio(self) -> bool {
        matches!(self, DownloadMode::Audio | DownloadMode::Both)
    }

    pub fn wants_notes(self) -> bool {
        matches!(self, DownloadMode::Notes | DownloadMode::Both)
    }
}

impl fmt::Display for DownloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DownloadMode::Audio => "audio",
            DownloadMode::Notes => "notes",
            DownloadMode::Both => "both",
        };
        f.write_str(name)
    }
}

impl FromStr for DownloadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "audio" => Ok(DownloadMode::Audio),
            "notes" => Ok(DownloadMode::Notes),
            "both" => Ok(DownloadMode::Both),
            other => Err(format!(
                "invalid mode '{other}' (expected audio, notes, or both)"
            )),
        }
    }
}

/// Input parameters for one orchestrated download
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Episode page URL as supplied by the user
    pub url: String,
    /// Destination directory for the artifacts
    pub directory: PathBuf,
    /// Which artifacts to retrieve
    pub mode: DownloadMode,
}

/// Decides whether an existing file at the target path may be replaced.
///
/// The orchestrator never overwrites silently; this hook replaces any
/// interactive prompt so the core stays terminal-free.
pub trait OverwritePolicy: Send + Sync {
    fn confirm_overwrite(&self, path: &Path) -> bool;
}

/// Declines every overwrite
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverOverwrite;

impl OverwritePolicy for NeverOverwrite {
    fn confirm_overwrite(&self, _path: &Path) -> bool {
        false
    }
}

/// Accepts every overwrite
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysOverwrite;

impl OverwritePolicy for AlwaysOverwrite {
    fn confirm_overwrite(&self, _path: &Path) -> bool {
        true
    }
}

/// Outcome of one requested artifact
#[derive(Debug)]
pub enum ArtifactOutcome {
    /// The artifact was written to `path`
    Written { path: PathBuf, bytes: u64 },
    /// Retrieval of this artifact failed; other artifacts are unaffected
    Failed { error: DownloadError },
}

impl ArtifactOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, ArtifactOutcome::Written { .. })
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ArtifactOutcome::Written { path, .. } => Some(path),
            ArtifactOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&DownloadError> {
        match self {
            ArtifactOutcome::Written { .. } => None,
            ArtifactOutcome::Failed { error } => Some(error),
        }
    }
}

/// Result of one orchestrated download.
///
/// Artifact outcomes are reported individually: in `Both` mode one
/// artifact can succeed while the other fails.
#[derive(Debug)]
pub struct DownloadReport {
    pub episode: EpisodeRef,
    pub metadata: EpisodeMetadata,
    /// Audio outcome; None when the mode did not request audio
    pub audio: Option<ArtifactOutcome>,
    /// Notes outcome; None when the mode did not request notes
    pub notes: Option<ArtifactOutcome>,
}

impl DownloadReport {
    /// True when every requested artifact was written
    pub fn all_succeeded(&self) -> bool {
        self.audio.iter().all(|a| a.is_written()) && self.notes.iter().all(|n| n.is_written())
    }
}

/// Download the artifacts for one episode.
///
/// Validation and extraction failures abort the whole call; artifact
/// failures are isolated per artifact. Audio streaming and notes writing
/// run concurrently once metadata is known. Cancelling the token stops
/// in-flight reads and removes any partial file.
pub async fn download<C: HttpClient>(
    client: &C,
    request: &DownloadRequest,
    config: &Config,
    overwrite: &dyn OverwritePolicy,
    reporter: &SharedProgressReporter,
    cancel: &CancellationToken,
) -> Result<DownloadReport, DownloadError> {
    // Fail fast on bad input: no network call before validation passes
    let episode = episode::validate(&request.url)?;

    let policy = RetryPolicy::from_config(config);

    reporter.report(ProgressEvent::FetchingPage {
        url: episode.canonical_url.clone(),
    });
    let html = fetch_text(client, &episode.canonical_url, &policy, reporter)
        .await
        .map_err(DownloadError::PageFetch)?;

    let metadata = episode::extract(&html)?;
    reporter.report(ProgressEvent::MetadataExtracted {
        title: metadata.title.clone(),
        host: metadata.host.clone(),
    });

    tokio::fs::create_dir_all(&request.directory)
        .await
        .map_err(|e| DownloadError::CreateDirectoryFailed {
            path: request.directory.clone(),
            source: e,
        })?;

    let audio_path = request
        .directory
        .join(episode::file_name(&metadata.host, &metadata.title, "mp3"));
    let notes_path = request
        .directory
        .join(episode::file_name(&metadata.host, &metadata.title, "md"));

    let audio_task = async {
        if !request.mode.wants_audio() {
            return None;
        }
        Some(match check_collision(&audio_path, overwrite) {
            Err(error) => ArtifactOutcome::Failed { error },
            Ok(()) => {
                let result = audio::download_audio(
                    client,
                    &metadata.audio_url,
                    &audio_path,
                    &policy,
                    config.chunk_size,
                    reporter,
                    cancel,
                )
                .await;
                match result {
                    Ok(bytes) => ArtifactOutcome::Written {
                        path: audio_path.clone(),
                        bytes,
                    },
                    Err(error) => ArtifactOutcome::Failed { error },
                }
            }
        })
    };

    let notes_task = async {
        if !request.mode.wants_notes() {
            return None;
        }
        Some(match check_collision(&notes_path, overwrite) {
            Err(error) => ArtifactOutcome::Failed { error },
            Ok(()) => match notes::write_notes(&episode, &metadata, &notes_path, reporter).await {
                Ok(bytes) => ArtifactOutcome::Written {
                    path: notes_path.clone(),
                    bytes,
                },
                Err(error) => ArtifactOutcome::Failed { error },
            },
        })
    };

    let (audio_outcome, notes_outcome) = tokio::join!(audio_task, notes_task);

    Ok(DownloadReport {
        episode,
        metadata,
        audio: audio_outcome,
        notes: notes_outcome,
    })
}

/// Existence check happens immediately before the write; serializing
/// concurrent writers against the same directory is the caller's concern
fn check_collision(path: &Path, overwrite: &dyn OverwritePolicy) -> Result<(), DownloadError> {
    if path.exists() && !overwrite.confirm_overwrite(path) {
        return Err(DownloadError::FileExists {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtractError, FetchError, UrlError};
    use crate::http::{ByteStream, StreamResponse, TextResponse};
    use crate::progress::NoopReporter;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    const EPISODE_URL: &str = "https://www.xiaoyuzhoufm.com/episode/abc123";

    const PAGE_HTML: &str = r#"<html><head>
<title>My Show - Jane Doe | Platform</title>
<meta name="description" content="Notes for the test episode." />
</head><body><audio src="https://media.example.com/ep.mp3"></audio></body></html>"#;

    struct MockHttpClient {
        page_html: String,
        audio: Vec<u8>,
        audio_status: u16,
        requests: AtomicUsize,
    }

    impl MockHttpClient {
        fn new() -> Self {
            Self {
                page_html: PAGE_HTML.to_string(),
                audio: b"fake audio content".to_vec(),
                audio_status: 200,
                requests: AtomicUsize::new(0),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get_text(&self, _url: &str) -> Result<TextResponse, reqwest::Error> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(TextResponse {
                status: 200,
                body: self.page_html.clone(),
            })
        }

        async fn get_stream(&self, _url: &str) -> Result<StreamResponse, reqwest::Error> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let data = Bytes::from(self.audio.clone());
            let len = data.len() as u64;
            let body: ByteStream = Box::pin(futures::stream::once(async move { Ok(data) }));

            Ok(StreamResponse {
                status: self.audio_status,
                content_length: Some(len),
                body,
            })
        }
    }

    fn request(dir: &Path, mode: DownloadMode) -> DownloadRequest {
        DownloadRequest {
            url: EPISODE_URL.to_string(),
            directory: dir.to_path_buf(),
            mode,
        }
    }

    fn fast_config() -> Config {
        Config {
            retry_delay_ms: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn downloads_both_artifacts() {
        let dir = tempdir().unwrap();
        let client = MockHttpClient::new();

        let report = download(
            &client,
            &request(dir.path(), DownloadMode::Both),
            &fast_config(),
            &NeverOverwrite,
            &NoopReporter::shared(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(report.all_succeeded());
        assert_eq!(report.metadata.title, "My Show");
        assert_eq!(report.metadata.host, "Jane Doe");

        let audio_path = dir.path().join("Jane Doe - My Show.mp3");
        let notes_path = dir.path().join("Jane Doe - My Show.md");
        assert_eq!(report.audio.unwrap().path().unwrap(), audio_path);
        assert_eq!(report.notes.unwrap().path().unwrap(), notes_path);
        assert_eq!(std::fs::read(&audio_path).unwrap(), b"fake audio content");
        assert!(
            std::fs::read_to_string(&notes_path)
                .unwrap()
                .contains("Notes for the test episode.")
        );
    }

    #[tokio::test]
    async fn audio_mode_skips_notes() {
        let dir = tempdir().unwrap();
        let client = MockHttpClient::new();

        let report = download(
            &client,
            &request(dir.path(), DownloadMode::Audio),
            &fast_config(),
            &NeverOverwrite,
            &NoopReporter::shared(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(report.audio.is_some());
        assert!(report.notes.is_none());
        assert!(!dir.path().join("Jane Doe - My Show.md").exists());
    }

    #[tokio::test]
    async fn invalid_url_fails_before_any_request() {
        let dir = tempdir().unwrap();
        let client = MockHttpClient::new();

        let result = download(
            &client,
            &DownloadRequest {
                url: "https://example.com/episode/abc123".to_string(),
                directory: dir.path().to_path_buf(),
                mode: DownloadMode::Both,
            },
            &fast_config(),
            &NeverOverwrite,
            &NoopReporter::shared(),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(
            result,
            Err(DownloadError::Url(UrlError::UnsupportedHost { .. }))
        ));
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn missing_audio_aborts_the_whole_operation() {
        let dir = tempdir().unwrap();
        let client = MockHttpClient {
            page_html: "<html><head><title>My Show - Jane Doe | P</title></head><body></body></html>"
                .to_string(),
            ..MockHttpClient::new()
        };

        let result = download(
            &client,
            &request(dir.path(), DownloadMode::Both),
            &fast_config(),
            &NeverOverwrite,
            &NoopReporter::shared(),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(
            result,
            Err(DownloadError::Extract(ExtractError::AudioMissing))
        ));
        assert!(!dir.path().join("Jane Doe - My Show.md").exists());
    }

    #[tokio::test]
    async fn failed_audio_does_not_cancel_notes() {
        let dir = tempdir().unwrap();
        let client = MockHttpClient {
            audio_status: 404,
            ..MockHttpClient::new()
        };

        let report = download(
            &client,
            &request(dir.path(), DownloadMode::Both),
            &fast_config(),
            &NeverOverwrite,
            &NoopReporter::shared(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(!report.all_succeeded());

        let audio = report.audio.unwrap();
        assert!(matches!(
            audio.error(),
            Some(DownloadError::AudioFetch(FetchError::HttpStatus {
                status: 404,
                ..
            }))
        ));

        let notes = report.notes.unwrap();
        assert!(notes.is_written());
        assert!(dir.path().join("Jane Doe - My Show.md").exists());
    }

    #[tokio::test]
    async fn declined_overwrite_reports_collision_and_keeps_the_file() {
        let dir = tempdir().unwrap();
        let client = MockHttpClient::new();

        let first = download(
            &client,
            &request(dir.path(), DownloadMode::Both),
            &fast_config(),
            &NeverOverwrite,
            &NoopReporter::shared(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert!(first.all_succeeded());

        let audio_path = dir.path().join("Jane Doe - My Show.mp3");
        std::fs::write(&audio_path, b"pre-existing content").unwrap();

        let second = download(
            &client,
            &request(dir.path(), DownloadMode::Both),
            &fast_config(),
            &NeverOverwrite,
            &NoopReporter::shared(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        let audio = second.audio.unwrap();
        assert!(matches!(
            audio.error(),
            Some(DownloadError::FileExists { .. })
        ));
        assert_eq!(
            std::fs::read(&audio_path).unwrap(),
            b"pre-existing content"
        );
    }

    #[tokio::test]
    async fn accepted_overwrite_replaces_the_file() {
        let dir = tempdir().unwrap();
        let client = MockHttpClient::new();

        let audio_path = dir.path().join("Jane Doe - My Show.mp3");
        std::fs::write(&audio_path, b"stale content").unwrap();

        let report = download(
            &client,
            &request(dir.path(), DownloadMode::Audio),
            &fast_config(),
            &AlwaysOverwrite,
            &NoopReporter::shared(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(report.all_succeeded());
        assert_eq!(std::fs::read(&audio_path).unwrap(), b"fake audio content");
    }

    #[test]
    fn mode_parses_from_strings() {
        assert_eq!("audio".parse::<DownloadMode>().unwrap(), DownloadMode::Audio);
        assert_eq!("NOTES".parse::<DownloadMode>().unwrap(), DownloadMode::Notes);
        assert_eq!("both".parse::<DownloadMode>().unwrap(), DownloadMode::Both);
        assert!("md".parse::<DownloadMode>().is_err());
    }
}
