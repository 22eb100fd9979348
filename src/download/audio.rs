// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::error::{DownloadError, FetchError};
use crate::fetch::{RetryPolicy, fetch_stream};
use crate::http::{ByteStream, HttpClient};
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// Stream the audio payload to `target`.
///
/// Bytes go to a `<target>.partial` file that is renamed into place only
/// after the stream completes and is flushed; any failure or cancellation
/// removes the partial file so no corrupt artifact is left behind.
/// Returns the number of bytes written.
pub(crate) async fn download_audio<C: HttpClient>(
    client: &C,
    audio_url: &str,
    target: &Path,
    policy: &RetryPolicy,
    chunk_size: usize,
    reporter: &SharedProgressReporter,
    cancel: &CancellationToken,
) -> Result<u64, DownloadError> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let response = fetch_stream(client, audio_url, policy, chunk_size, reporter)
        .await
        .map_err(DownloadError::AudioFetch)?;

    reporter.report(ProgressEvent::DownloadStarting {
        file_name: file_name.clone(),
        content_length: response.content_length,
    });

    let partial = partial_path(target);

    let outcome: Result<u64, DownloadError> = async {
        let bytes = stream_to_file(
            response.body,
            response.content_length,
            &partial,
            &file_name,
            audio_url,
            reporter,
            cancel,
        )
        .await?;

        reporter.report(ProgressEvent::Finalizing {
            file_name: file_name.clone(),
        });
        tokio::fs::rename(&partial, target)
            .await
            .map_err(|e| DownloadError::FinalizeFailed {
                path: target.to_path_buf(),
                source: e,
            })?;

        Ok(bytes)
    }
    .await;

    match outcome {
        Ok(bytes) => {
            reporter.report(ProgressEvent::DownloadCompleted {
                file_name,
                bytes_downloaded: bytes,
            });
            Ok(bytes)
        }
        Err(error) => {
            let _ = tokio::fs::remove_file(&partial).await;
            reporter.report(ProgressEvent::DownloadFailed {
                file_name,
                error: error.to_string(),
            });
            Err(error)
        }
    }
}

async fn stream_to_file(
    mut body: ByteStream,
    total_bytes: Option<u64>,
    path: &Path,
    file_name: &str,
    url: &str,
    reporter: &SharedProgressReporter,
    cancel: &CancellationToken,
) -> Result<u64, DownloadError> {
    let mut file = File::create(path)
        .await
        .map_err(|e| DownloadError::FileCreateFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut bytes_downloaded: u64 = 0;

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            next = body.next() => next,
        };

        let Some(chunk) = next else { break };

        let chunk = chunk.map_err(|e| {
            DownloadError::AudioFetch(FetchError::StreamFailed {
                url: url.to_string(),
                source: e,
            })
        })?;

        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::FileWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        bytes_downloaded += chunk.len() as u64;

        reporter.report(ProgressEvent::DownloadProgress {
            file_name: file_name.to_string(),
            bytes_downloaded,
            total_bytes,
        });
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::FileWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(bytes_downloaded)
}

fn partial_path(target: &Path) -> PathBuf {
    let mut os = target.as_os_str().to_os_string();
    os.push(".partial");
    PathBuf::from(os)
}
