use backon::{ExponentialBuilder, Retryable};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config_loader::{ApiConfig, RetryConfig};
use crate::errors::{VaultError, VaultResult};

/// HTTP client for the storefront's profile endpoints.
///
/// Connection failures and timeouts are retried with exponential backoff
/// until the retry window closes. HTTP 401 and other error statuses are
/// returned on the first attempt.
pub struct ProfileClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryConfig,
}

impl ProfileClient {
    pub fn new(api: &ApiConfig, retry: RetryConfig) -> VaultResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(api.timeout())
            .user_agent(format!("session_vault/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VaultError::network("building http client", e))?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path` with `Authorization: Bearer <token>` and parse the JSON body.
    pub async fn fetch_profile(&self, path: &str, token: &str) -> VaultResult<Value> {
        let url = self.url_for(path);
        let deadline = Instant::now() + self.retry.window();

        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.retry.min_delay())
            .with_max_delay(self.retry.max_delay())
            .with_max_times(usize::MAX);

        (|| async { self.fetch_once(&url, token).await })
            .retry(backoff)
            .when(|err: &VaultError| err.is_network() && Instant::now() < deadline)
            .notify(|err: &VaultError, delay| {
                warn!("Profile fetch failed, retrying in {delay:?}: {err}");
            })
            .await
    }

    async fn fetch_once(&self, url: &str, token: &str) -> VaultResult<Value> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| VaultError::network(format!("GET {url}"), e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(VaultError::Unauthorized);
        }
        if !status.is_success() {
            return Err(VaultError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| VaultError::network(format!("reading {url}"), e))?;
        debug!("Profile fetched from {url} ({} bytes)", body.len());
        serde_json::from_slice(&body).map_err(|e| VaultError::serialization("profile response", e))
    }
}
