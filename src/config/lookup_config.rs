use crate::core::cache::DEFAULT_TTL;
use crate::core::endpoints::DEFAULT_BASE_URL;
use crate::domain::jurisdiction::Jurisdiction;
use crate::utils::error::{LookupError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub batch: BatchConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 30,
            user_agent: concat!("naic-lookup/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub retries: u32,
    pub base_delay_ms: u64,
    pub factor: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 2,
            base_delay_ms: 1000,
            factor: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub concurrency: usize,
    pub jurisdictions: Option<Vec<Jurisdiction>>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 6,
            jurisdictions: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL.as_secs(),
        }
    }
}

impl LookupConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LookupError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LookupError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${NAIC_BASE_URL})，未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LookupError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 要查詢的州，依設定順序；未設定時使用全部
    pub fn jurisdictions(&self) -> Vec<Jurisdiction> {
        self.batch
            .jurisdictions
            .clone()
            .unwrap_or_else(|| Jurisdiction::ALL.to_vec())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_seconds)
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api.base_url)?;
        validation::validate_non_empty_string("api.user_agent", &self.api.user_agent)?;
        validation::validate_positive_number("api.timeout_seconds", self.api.timeout_seconds, 1)?;
        validation::validate_positive_number("retry.factor", self.retry.factor as u64, 1)?;
        validation::validate_positive_number("batch.concurrency", self.batch.concurrency as u64, 1)?;
        validation::validate_positive_number("cache.ttl_seconds", self.cache.ttl_seconds, 1)?;

        if let Some(jurisdictions) = &self.batch.jurisdictions {
            if jurisdictions.is_empty() {
                return Err(LookupError::InvalidConfigValueError {
                    field: "batch.jurisdictions".to_string(),
                    value: "[]".to_string(),
                    reason: "At least one jurisdiction is required".to_string(),
                });
            }
            validation::validate_unique("batch.jurisdictions", jurisdictions)?;
        }

        Ok(())
    }
}

impl Validate for LookupConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
