//! HTTP client with a configurable retry policy.

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::time::Duration;

use super::retry::{RetryPolicy, check_retryable, is_retryable_error};

/// HTTP client wrapping a shared reqwest [`Client`] and a [`RetryPolicy`].
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    policy: RetryPolicy,
    json_timeout: Option<Duration>,
}

impl HttpClient {
    /// Creates a client using the default retry policy.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            policy: RetryPolicy::default(),
            json_timeout: None,
        }
    }

    /// Replaces the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bounds each JSON request. Downloads are left unbounded.
    pub fn with_json_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.json_timeout = timeout;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Performs a GET request and deserializes the JSON response.
    ///
    /// Non-success statuses and undecodable bodies are reported as
    /// [`NonRetryableError`](super::NonRetryableError) when retrying cannot help.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET JSON from {}...", url);

        self.with_retry("GET JSON", || async {
            let mut request = self.client.get(url);
            if let Some(timeout) = self.json_timeout {
                request = request.timeout(timeout);
            }
            let response = request
                .send()
                .await
                .context("Failed to send request")?;

            let response = response.error_for_status().map_err(check_retryable)?;

            let result = response
                .json::<T>()
                .await
                .map_err(check_retryable)
                .context("Failed to parse JSON response")?;

            Ok(result)
        })
        .await
    }

    /// Streams the body at `url` into the writer produced by `create_writer`.
    ///
    /// `on_progress` receives the bytes written so far and the content length
    /// when the server announced one. The writer is only created once the
    /// server has answered with a success status.
    #[tracing::instrument(skip(self, create_writer, on_progress))]
    pub async fn download_file<W, F, P>(
        &self,
        url: &str,
        create_writer: F,
        mut on_progress: P,
    ) -> Result<u64>
    where
        W: Write,
        F: Fn() -> Result<W>,
        P: FnMut(u64, Option<u64>),
    {
        debug!("Downloading file from {}...", url);

        let attempts = self.policy.attempts();
        let mut attempt = 1;
        loop {
            match self
                .download_file_once(url, &create_writer, &mut on_progress)
                .await
            {
                Ok(bytes) => return Ok(bytes),
                Err(e) if attempt < attempts && is_retryable_error(&e) => {
                    warn!(
                        "Download attempt {}/{} failed ({}), retrying...",
                        attempt, attempts, e
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn download_file_once<W, F, P>(
        &self,
        url: &str,
        create_writer: &F,
        on_progress: &mut P,
    ) -> Result<u64>
    where
        W: Write,
        F: Fn() -> Result<W>,
        P: FnMut(u64, Option<u64>),
    {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to start download request")?;

        let mut response = response.error_for_status().map_err(check_retryable)?;
        let total = response.content_length();

        let mut writer = create_writer()?;
        let mut downloaded_bytes: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read chunk from download stream")?
        {
            writer
                .write_all(&chunk)
                .context("Failed to write chunk to file")?;
            downloaded_bytes += chunk.len() as u64;
            on_progress(downloaded_bytes, total);
        }
        writer.flush().context("Failed to flush downloaded file")?;

        debug!(
            "Downloaded {:.2} MB",
            downloaded_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(downloaded_bytes)
    }

    /// Executes an async operation under the client's retry policy.
    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let attempts = self.policy.attempts();
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if !is_retryable_error(&e) => {
                    debug!("{}: non-retryable error: {}", operation_name, e);
                    return Err(e);
                }
                Err(e) if attempt < attempts => {
                    warn!(
                        "{}: attempt {}/{} failed ({}), retrying in {:?}...",
                        operation_name, attempt, attempts, e, self.policy.delay
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::NonRetryableError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_client(max_attempts: usize) -> HttpClient {
        HttpClient::new(Client::new()).with_policy(RetryPolicy {
            max_attempts,
            delay: Duration::ZERO,
        })
    }

    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct TestResponse {
        name: String,
        value: i32,
    }

    #[tokio::test]
    async fn test_get_json_success() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "test", "value": 42}"#)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result: TestResponse = client.get_json(&format!("{}/test", url)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            result,
            TestResponse {
                name: "test".to_string(),
                value: 42
            }
        );
    }

    #[tokio::test]
    async fn test_get_json_not_found_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/test")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let client = fast_client(3);
        let result: Result<serde_json::Value> = client.get_json(&format!("{}/test", url)).await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert!(err.downcast_ref::<NonRetryableError>().is_some());
    }

    #[tokio::test]
    async fn test_get_json_malformed_body_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/test")
            .with_status(200)
            .with_body(r#"{"name": "test"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = fast_client(3);
        let result: Result<TestResponse> = client.get_json(&format!("{}/test", url)).await;

        mock.assert_async().await;
        assert!(matches!(
            result.unwrap_err().downcast_ref::<NonRetryableError>(),
            Some(NonRetryableError::MalformedBody(_))
        ));
    }

    #[tokio::test]
    async fn test_get_json_server_error_retried_per_policy() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/test")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let client = fast_client(2);
        let result: Result<serde_json::Value> = client.get_json(&format!("{}/test", url)).await;

        mock.assert_async().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_json_single_attempt_policy() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/test")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new()).with_policy(RetryPolicy::single_attempt());
        let result: Result<serde_json::Value> = client.get_json(&format!("{}/test", url)).await;

        mock.assert_async().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_get_json_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and never answer
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let client = fast_client(1).with_json_timeout(Some(Duration::from_millis(200)));
        let result: Result<serde_json::Value> =
            client.get_json(&format!("http://{}/slow", addr)).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_download_file_reports_progress() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/file.bin")
            .with_status(200)
            .with_body("test content")
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let mut last = (0, None);
        let bytes = client
            .download_file(
                &format!("{}/file.bin", url),
                || Ok(std::io::sink()),
                |done, total| last = (done, total),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, 12); // "test content" is 12 bytes
        assert_eq!(last, (12, Some(12)));
    }

    #[tokio::test]
    async fn test_download_file_not_found_does_not_create_writer() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/file.bin")
            .with_status(404)
            .create_async()
            .await;

        let client = fast_client(3);
        let created = AtomicUsize::new(0);
        let result = client
            .download_file(
                &format!("{}/file.bin", url),
                || {
                    created.fetch_add(1, Ordering::SeqCst);
                    Ok(std::io::sink())
                },
                |_, _| {},
            )
            .await;

        mock.assert_async().await;
        assert!(result.is_err());
        assert_eq!(created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_with_retry_retries_on_network_error() {
        let client = fast_client(3);
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = client
            .with_retry("test", || {
                let count = call_count_clone.clone();
                async move {
                    let current = count.fetch_add(1, Ordering::SeqCst);
                    if current < 2 {
                        Err::<&str, _>(anyhow::anyhow!("connection reset"))
                    } else {
                        Ok("success after retries")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "success after retries");
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_exhausts_retries() {
        let client = fast_client(3);
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = client
            .with_retry("test", || {
                let count = call_count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(anyhow::anyhow!("connection timeout"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_immediate_failure_on_non_retryable() {
        let client = fast_client(3);
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let result = client
            .with_retry("test", || {
                let count = call_count_clone.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(anyhow::Error::from(NonRetryableError::NotFound(
                        "not found".to_string(),
                    )))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }
}
