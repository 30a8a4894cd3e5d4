use crate::utils::error::Result;
use async_trait::async_trait;

/// 以 GET 取得 JSON 的來源；查詢鏈只依賴這個介面
#[async_trait]
pub trait JsonSource: Send + Sync {
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value>;
}
