// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;

use crate::config::Config;
use crate::error::FetchError;
use crate::http::{ByteStream, HttpClient, StreamResponse};
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// Bounded-attempt retry with a fixed delay between attempts.
///
/// Transient failures (transport errors, 5xx statuses) are retried;
/// 4xx statuses fail immediately.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Derive the policy from the application config
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_retries,
            delay: config.retry_delay(),
        }
    }
}

fn is_retryable_status(status: u16) -> bool {
    (500..=599).contains(&status)
}

/// Fetch a text document with retry, returning the response body.
///
/// Non-2xx/3xx statuses below 500 fail fast; 5xx and transport errors are
/// retried up to the policy's attempt count. The last cause is preserved
/// inside `FetchError::RetriesExhausted`.
pub async fn fetch_text<C: HttpClient>(
    client: &C,
    url: &str,
    policy: &RetryPolicy,
    reporter: &SharedProgressReporter,
) -> Result<String, FetchError> {
    let mut attempt = 0;

    loop {
        attempt += 1;

        let err = match client.get_text(url).await {
            Ok(response) if response.status < 400 => return Ok(response.body),
            Ok(response) => {
                let err = FetchError::HttpStatus {
                    url: url.to_string(),
                    status: response.status,
                };
                if !is_retryable_status(response.status) {
                    return Err(err);
                }
                err
            }
            Err(e) => FetchError::RequestFailed {
                url: url.to_string(),
                source: e,
            },
        };

        if attempt >= policy.max_attempts {
            return Err(FetchError::RetriesExhausted {
                url: url.to_string(),
                attempts: attempt,
                source: Box::new(err),
            });
        }

        reporter.report(ProgressEvent::RetryingFetch {
            url: url.to_string(),
            attempt,
            max_attempts: policy.max_attempts,
        });
        tokio::time::sleep(policy.delay).await;
    }
}

/// Open a streaming response with retry.
///
/// Retry applies to establishing the stream (request plus status check);
/// errors mid-stream are surfaced to the consumer and not retried. The
/// returned body never yields a chunk larger than `max_chunk` bytes.
pub async fn fetch_stream<C: HttpClient>(
    client: &C,
    url: &str,
    policy: &RetryPolicy,
    max_chunk: usize,
    reporter: &SharedProgressReporter,
) -> Result<StreamResponse, FetchError> {
    let mut attempt = 0;

    loop {
        attempt += 1;

        let err = match client.get_stream(url).await {
            Ok(response) if response.status < 400 => {
                return Ok(StreamResponse {
                    status: response.status,
                    content_length: response.content_length,
                    body: bounded_chunks(response.body, max_chunk),
                });
            }
            Ok(response) => {
                let err = FetchError::HttpStatus {
                    url: url.to_string(),
                    status: response.status,
                };
                if !is_retryable_status(response.status) {
                    return Err(err);
                }
                err
            }
            Err(e) => FetchError::RequestFailed {
                url: url.to_string(),
                source: e,
            },
        };

        if attempt >= policy.max_attempts {
            return Err(FetchError::RetriesExhausted {
                url: url.to_string(),
                attempts: attempt,
                source: Box::new(err),
            });
        }

        reporter.report(ProgressEvent::RetryingFetch {
            url: url.to_string(),
            attempt,
            max_attempts: policy.max_attempts,
        });
        tokio::time::sleep(policy.delay).await;
    }
}

/// Re-chunk a byte stream so no emitted chunk exceeds `max_chunk` bytes.
///
/// `Bytes::split_to` shares the underlying buffer, so splitting an
/// oversized chunk copies nothing.
pub fn bounded_chunks(stream: ByteStream, max_chunk: usize) -> ByteStream {
    Box::pin(stream.flat_map(move |item| {
        let parts: Vec<Result<Bytes, reqwest::Error>> = match item {
            Ok(mut chunk) => {
                let mut parts = Vec::with_capacity(chunk.len() / max_chunk + 1);
                while chunk.len() > max_chunk {
                    parts.push(Ok(chunk.split_to(max_chunk)));
                }
                if !chunk.is_empty() || parts.is_empty() {
                    parts.push(Ok(chunk));
                }
                parts
            }
            Err(e) => vec![Err(e)],
        };
        futures::stream::iter(parts)
    }))
}
