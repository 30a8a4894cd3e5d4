use crate::config::lookup_config::{ApiConfig, RetryConfig};
use crate::domain::ports::JsonSource;
use crate::utils::error::{LookupError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

const ACCEPT_VALUE: &str = "application/json, text/plain, */*";
const MAX_BACKOFF_EXPONENT: u32 = 10;

/// 重試策略：最多 `retries` 次重試（總共 `retries + 1` 次嘗試），指數退避
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base_delay: Duration,
    pub factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            base_delay: Duration::from_millis(1000),
            factor: 2,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            retries: config.retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            factor: config.factor,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.retries + 1
    }

    /// 第 `attempt` 次失敗後的等待時間（attempt 從 1 起算）
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        self.base_delay
            .saturating_mul(self.factor.saturating_pow(exponent))
    }
}

/// Runs `operation` until it succeeds or the policy's attempts are used up.
///
/// Every failure is retried; the caller decides what counts as a failure.
/// The terminal error wraps the last attempt's error.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!("✅ {} succeeded on attempt {}", label, attempt);
                }
                return Ok(value);
            }
            Err(err) if attempt <= policy.retries => {
                let delay = policy.backoff_delay(attempt);
                tracing::warn!(
                    attempt,
                    "🔄 {} failed: {}; retrying after {:?}",
                    label,
                    err,
                    delay
                );
                sleep(delay).await;
            }
            Err(err) => {
                tracing::warn!("❌ {} failed after {} attempts: {}", label, attempt, err);
                return Err(LookupError::RetriesExhausted {
                    attempts: attempt,
                    source: Box::new(err),
                });
            }
        }
    }
}

/// GET + JSON 解析，失敗時依策略重試
#[derive(Debug, Clone)]
pub struct RetryingFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn from_config(api: &ApiConfig, policy: RetryPolicy) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(api.user_agent.as_str())
            .timeout(Duration::from_secs(api.timeout_seconds))
            .build()?;

        Ok(Self::new(client, policy))
    }

    async fn fetch_once(&self, url: &str) -> Result<serde_json::Value> {
        tracing::debug!("Making API request to: {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            return Err(LookupError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl JsonSource for RetryingFetcher {
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
        retry_with_backoff(&self.policy, url, || self.fetch_once(url)).await
    }
}
