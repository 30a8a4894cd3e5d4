use crate::config::lookup_config::LookupConfig;
use crate::core::cache::ResultCache;
use crate::core::endpoints::Endpoints;
use crate::core::fetcher::{RetryPolicy, RetryingFetcher};
use crate::core::orchestrator::BatchOrchestrator;
use crate::core::resolver::JurisdictionResolver;
use crate::domain::model::{LookupReport, Npn};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use std::sync::Arc;

/// 組合快取與批次查詢；同一 NPN 的並行請求只會觸發一次批次
pub struct LookupService {
    orchestrator: BatchOrchestrator,
    cache: ResultCache,
}

impl LookupService {
    pub fn new(orchestrator: BatchOrchestrator, cache: ResultCache) -> Self {
        Self {
            orchestrator,
            cache,
        }
    }

    pub fn from_config(config: &LookupConfig) -> Result<Self> {
        config.validate()?;

        let fetcher = RetryingFetcher::from_config(&config.api, RetryPolicy::from_config(&config.retry))?;
        let endpoints = Endpoints::new(&config.api.base_url)?;
        let resolver = JurisdictionResolver::new(Arc::new(fetcher), endpoints);
        let orchestrator =
            BatchOrchestrator::new(resolver, config.jurisdictions(), config.batch.concurrency);

        tracing::debug!(
            "Lookup service ready: base_url={}, jurisdictions={}, concurrency={}, cache_ttl={:?}",
            config.api.base_url,
            orchestrator.jurisdictions().len(),
            orchestrator.concurrency(),
            config.cache_ttl()
        );

        Ok(Self::new(orchestrator, ResultCache::new(config.cache_ttl())))
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Looks up every configured jurisdiction for `raw_npn`.
    ///
    /// Blank input is rejected before any network call. A fresh cached batch
    /// is returned as-is; otherwise a new batch is run and cached. Callers that
    /// arrive while a batch for the same NPN is running wait for that batch.
    pub async fn lookup(&self, raw_npn: &str) -> Result<LookupReport> {
        let npn = Npn::parse(raw_npn)?;

        let (batch, ran) = self
            .cache
            .get_or_run(&npn, self.orchestrator.run_batch(&npn))
            .await;

        if !ran {
            tracing::info!("📦 Serving NPN {} from cache", npn);
        }

        Ok(LookupReport {
            cached: !ran,
            batch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::jurisdiction::Jurisdiction;
    use crate::domain::ports::JsonSource;
    use crate::utils::error::LookupError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct EmptySource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl JsonSource for EmptySource {
        async fn fetch_json(&self, _url: &str) -> Result<serde_json::Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(serde_json::json!([]))
        }
    }

    fn service(source: Arc<EmptySource>, ttl: Duration) -> LookupService {
        let resolver =
            JurisdictionResolver::new(source, Endpoints::new("http://naic.test/api").unwrap());
        let orchestrator = BatchOrchestrator::new(
            resolver,
            vec![Jurisdiction::AL, Jurisdiction::TN, Jurisdiction::WI],
            6,
        );
        LookupService::new(orchestrator, ResultCache::new(ttl))
    }

    #[tokio::test]
    async fn test_blank_npn_rejected_before_network() {
        let source = Arc::new(EmptySource::default());
        let service = service(source.clone(), Duration::from_secs(300));

        let result = service.lookup("   ").await;

        assert!(matches!(result, Err(LookupError::ValidationError { .. })));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_second_lookup_served_from_cache_until_expiry() {
        let ttl = Duration::from_millis(300);
        let source = Arc::new(EmptySource::default());
        let service = service(source.clone(), ttl);

        let first = service.lookup(" 123456 ").await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.batch.results.len(), 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);

        let second = service.lookup("123456").await.unwrap();
        assert!(second.cached);
        assert!(Arc::ptr_eq(&first.batch, &second.batch));
        assert_eq!(
            serde_json::to_string(first.batch.as_ref()).unwrap(),
            serde_json::to_string(second.batch.as_ref()).unwrap()
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);

        // moka 不受 tokio 暫停時鐘影響，以真實時間等待過期
        tokio::time::sleep(ttl * 2).await;

        let third = service.lookup("123456").await.unwrap();
        assert!(!third.cached);
        assert_eq!(source.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_batch() {
        let source = Arc::new(EmptySource::default());
        let service = service(source.clone(), Duration::from_secs(300));

        let (a, b) = tokio::join!(service.lookup("555"), service.lookup("555"));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(Arc::ptr_eq(&a.batch, &b.batch));
        assert!(a.cached != b.cached);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(service.cache().len().await, 1);
    }

    #[tokio::test]
    async fn test_different_npns_are_cached_separately() {
        let source = Arc::new(EmptySource::default());
        let service = service(source.clone(), Duration::from_secs(300));

        service.lookup("111").await.unwrap();
        service.lookup("222").await.unwrap();

        assert_eq!(service.cache().len().await, 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let mut config = LookupConfig::default();
        config.batch.concurrency = 0;
        assert!(LookupService::from_config(&config).is_err());
    }
}
