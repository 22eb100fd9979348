// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

/// A streaming response body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Response to a text GET: status plus the fully read body
pub struct TextResponse {
    /// HTTP status code
    pub status: u16,
    /// Decoded response body
    pub body: String,
}

/// Response to a streamed GET: status, content length, and body stream
pub struct StreamResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Length header value, if the server reported one
    pub content_length: Option<u64>,
    /// Response body as a stream of bytes
    pub body: ByteStream,
}

/// HTTP client abstraction for testability
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch a text document (the episode page)
    async fn get_text(&self, url: &str) -> Result<TextResponse, reqwest::Error>;

    /// Get a streaming response for large downloads
    async fn get_stream(&self, url: &str) -> Result<StreamResponse, reqwest::Error>;
}

/// Default HTTP client implementation using reqwest.
///
/// Sends a browser-like user-agent on every request; the episode host
/// rejects obviously non-browser agents. Timeouts are per attempt and
/// apply to connect and per-read, so a long audio stream is not killed
/// by a whole-request deadline.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Build a client with the given user-agent and timeout
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Wrap an existing reqwest::Client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_text(&self, url: &str) -> Result<TextResponse, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(TextResponse { status, body })
    }

    async fn get_stream(&self, url: &str) -> Result<StreamResponse, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let content_length = response.content_length();
        let body: ByteStream = Box::pin(response.bytes_stream());

        Ok(StreamResponse {
            status,
            content_length,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reqwest_client_can_be_created() {
        let client = ReqwestClient::new("test-agent/1.0", Duration::from_secs(30)).unwrap();
        let _cloned = client.clone();
    }

    #[test]
    fn reqwest_client_wraps_existing_client() {
        let _client = ReqwestClient::with_client(reqwest::Client::new());
    }
}
