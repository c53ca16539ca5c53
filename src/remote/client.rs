//! HTTP access to the remote listing API
//!
//! This module handles all HTTP requests for the sync pipeline, including:
//! - Building the HTTP client with proper user agent strings
//! - GET requests for listing pages and raw file content
//! - Retry logic with exponential backoff for transient failures
//! - Error classification into retryable and fatal failures

use crate::remote::throttle::TokenBucket;
use crate::remote::{ListingPage, RemoteEntry};
use crate::{Result, SyncError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// Base delay for the exponential backoff between retry attempts
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `auth_token` - Optional bearer token sent with every request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(auth_token: Option<&str>) -> std::result::Result<Client, reqwest::Error> {
    let user_agent = format!("docsync/{}", env!("CARGO_PKG_VERSION"));

    let mut headers = HeaderMap::new();
    if let Some(token) = auth_token {
        if let Ok(mut value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
    }

    Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .build()
}

/// Client for the remote listing and download API
///
/// All requests go through the shared token bucket first, and transient
/// failures (HTTP 429, 5xx, timeouts, connection errors) are retried with
/// exponential backoff up to the configured attempt count.
pub struct RemoteClient {
    client: Client,
    api_base_url: String,
    repository: String,
    max_retries: u32,
    throttle: Arc<TokenBucket>,
    retry_base_delay: Duration,
}

impl RemoteClient {
    /// Creates a new remote client
    ///
    /// # Arguments
    ///
    /// * `client` - The underlying HTTP client
    /// * `api_base_url` - Base URL of the listing API
    /// * `repository` - Repository identifier ("owner/name")
    /// * `max_retries` - Maximum attempts per request
    /// * `throttle` - Token bucket shared by all callers
    pub fn new(
        client: Client,
        api_base_url: impl Into<String>,
        repository: impl Into<String>,
        max_retries: u32,
        throttle: Arc<TokenBucket>,
    ) -> Self {
        Self {
            client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            repository: repository.into(),
            max_retries,
            throttle,
            retry_base_delay: RETRY_BASE_DELAY,
        }
    }

    /// Overrides the backoff base delay (used by tests to keep retries fast)
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Builds the listing URL for a directory path within the repository
    pub fn listing_url(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{}/repos/{}/contents", self.api_base_url, self.repository)
        } else {
            format!(
                "{}/repos/{}/contents/{}",
                self.api_base_url, self.repository, path
            )
        }
    }

    /// Fetches one page of a directory listing
    ///
    /// # Arguments
    ///
    /// * `path` - Directory path relative to the repository root
    /// * `page_token` - Pagination token from the previous page, if any
    pub async fn list_directory_page(
        &self,
        path: &str,
        page_token: Option<&str>,
    ) -> Result<ListingPage> {
        let url = self.page_url(path, page_token)?;

        let response = self.get_with_retry(&url, path).await?;
        response
            .json::<ListingPage>()
            .await
            .map_err(|e| SyncError::Fetch {
                path: path.to_string(),
                reason: format!("malformed listing response: {}", e),
            })
    }

    /// Builds the listing URL with the pagination token as an encoded query
    ///
    /// The token is remote-issued and opaque; appending it through the URL's
    /// query serializer keeps reserved characters from corrupting the request.
    fn page_url(&self, path: &str, page_token: Option<&str>) -> Result<String> {
        let mut url =
            reqwest::Url::parse(&self.listing_url(path)).map_err(|e| SyncError::Fetch {
                path: path.to_string(),
                reason: format!("invalid listing URL: {}", e),
            })?;
        if let Some(token) = page_token {
            url.query_pairs_mut().append_pair("page_token", token);
        }
        Ok(url.to_string())
    }

    /// Downloads the raw bytes of a remote file
    pub async fn download(&self, entry: &RemoteEntry) -> Result<Vec<u8>> {
        let response = self.get_with_retry(&entry.download_url, &entry.path).await?;
        let bytes = response.bytes().await.map_err(|e| SyncError::Fetch {
            path: entry.path.clone(),
            reason: format!("failed to read body: {}", e),
        })?;
        Ok(bytes.to_vec())
    }

    /// Sends a GET request, retrying transient failures with backoff
    ///
    /// # Retry Logic
    ///
    /// | Condition          | Action                                   |
    /// |--------------------|------------------------------------------|
    /// | HTTP 2xx           | Return response                          |
    /// | HTTP 429           | Retry up to max attempts, backoff        |
    /// | HTTP 5xx           | Retry up to max attempts, backoff        |
    /// | Timeout            | Retry up to max attempts, backoff        |
    /// | Connection refused | Retry up to max attempts, backoff        |
    /// | Other HTTP status  | Immediate failure (auth, missing, ...)   |
    async fn get_with_retry(&self, url: &str, path: &str) -> Result<reqwest::Response> {
        let mut last_error = SyncError::Fetch {
            path: path.to_string(),
            reason: "no attempts made".to_string(),
        };

        for attempt in 1..=self.max_retries {
            // All workers share this throttle; the pool as a whole stays
            // within the remote quota.
            self.throttle.acquire().await;

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        tracing::debug!(
                            "Rate limited fetching {} (attempt {}/{})",
                            path,
                            attempt,
                            self.max_retries
                        );
                        last_error = SyncError::RateLimited {
                            path: path.to_string(),
                        };
                    } else if status.is_server_error() {
                        tracing::debug!(
                            "Server error {} fetching {} (attempt {}/{})",
                            status,
                            path,
                            attempt,
                            self.max_retries
                        );
                        last_error = SyncError::Fetch {
                            path: path.to_string(),
                            reason: format!("HTTP {}", status),
                        };
                    } else {
                        // 4xx other than 429 will not get better by retrying
                        return Err(SyncError::Fetch {
                            path: path.to_string(),
                            reason: format!("HTTP {}", status),
                        });
                    }
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    tracing::debug!(
                        "Network error fetching {} (attempt {}/{}): {}",
                        path,
                        attempt,
                        self.max_retries,
                        e
                    );
                    last_error = SyncError::Fetch {
                        path: path.to_string(),
                        reason: e.to_string(),
                    };
                }
                Err(e) => {
                    return Err(SyncError::Fetch {
                        path: path.to_string(),
                        reason: e.to_string(),
                    });
                }
            }

            if attempt < self.max_retries {
                tokio::time::sleep(backoff_delay(self.retry_base_delay, attempt)).await;
            }
        }

        Err(last_error)
    }
}

/// Calculates the exponential backoff delay for a completed attempt
///
/// Attempt 1 waits the base delay, attempt 2 twice that, and so on.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt.saturating_sub(1))
}
