use crate::core::resolver::JurisdictionResolver;
use crate::domain::jurisdiction::Jurisdiction;
use crate::domain::model::{Batch, Npn, StateResult};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

pub const DEFAULT_CONCURRENCY: usize = 6;

/// 對所有州並行查詢（受 semaphore 限制），依州順序組成批次
pub struct BatchOrchestrator {
    resolver: Arc<JurisdictionResolver>,
    jurisdictions: Vec<Jurisdiction>,
    concurrency: usize,
}

impl BatchOrchestrator {
    pub fn new(
        resolver: JurisdictionResolver,
        jurisdictions: Vec<Jurisdiction>,
        concurrency: usize,
    ) -> Self {
        Self {
            resolver: Arc::new(resolver),
            jurisdictions,
            concurrency: concurrency.max(1),
        }
    }

    pub fn jurisdictions(&self) -> &[Jurisdiction] {
        &self.jurisdictions
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs every jurisdiction chain and returns the assembled batch.
    ///
    /// At most `concurrency` chains run at once; the rest wait for a permit.
    /// Results are placed by scheduling order, so the batch always follows
    /// the configured jurisdiction order whatever order the chains finish in.
    pub async fn run_batch(&self, npn: &Npn) -> Batch {
        let started = Instant::now();
        tracing::info!(
            "🚀 Starting batch for NPN {} across {} jurisdictions (concurrency {})",
            npn,
            self.jurisdictions.len(),
            self.concurrency
        );

        let limiter = Arc::new(Semaphore::new(self.concurrency));

        let handles: Vec<_> = self
            .jurisdictions
            .iter()
            .map(|&jurisdiction| {
                let limiter = limiter.clone();
                let resolver = self.resolver.clone();
                let npn = npn.clone();
                let handle = tokio::spawn(async move {
                    let Ok(_permit) = limiter.acquire_owned().await else {
                        return StateResult::not_found(jurisdiction);
                    };
                    resolver.resolve(jurisdiction, &npn).await
                });
                (jurisdiction, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (jurisdiction, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(err) => {
                    tracing::error!("❌ {}: lookup task aborted: {}", jurisdiction, err);
                    StateResult::not_found(jurisdiction)
                }
            };
            results.push(result);
        }

        let batch = Batch::new(npn.clone(), results);
        tracing::info!(
            "📊 Batch for NPN {} finished in {:?}: {}/{} jurisdictions found",
            npn,
            started.elapsed(),
            batch.found_count(),
            batch.results.len()
        );
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::endpoints::Endpoints;
    use crate::domain::ports::JsonSource;
    use crate::utils::error::{LookupError, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// 記錄同時進行中的請求數；指定州的搜尋回傳一筆資料，其他回傳空陣列
    struct CountingSource {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        total: AtomicUsize,
        hits: Vec<&'static str>,
        failing: Vec<&'static str>,
    }

    impl CountingSource {
        fn new(hits: Vec<&'static str>, failing: Vec<&'static str>) -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                total: AtomicUsize::new(0),
                hits,
                failing,
            }
        }
    }

    #[async_trait]
    impl JsonSource for CountingSource {
        async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.total.fetch_add(1, Ordering::SeqCst);

            // 讓較前面的州較慢完成，確認結果順序不依完成時間
            let delay = if url.contains("jurisdiction=AL") { 40 } else { 5 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.iter().any(|code| url.contains(&format!("jurisdiction={}", code))) {
                return Err(LookupError::HttpStatus {
                    status: 500,
                    url: url.to_string(),
                });
            }

            if url.contains("/licenseLookup/search") {
                let hit = self
                    .hits
                    .iter()
                    .any(|code| url.contains(&format!("jurisdiction={}", code)));
                if hit {
                    return Ok(json!([{"licenseNumber": "L1"}]));
                }
                return Ok(json!([]));
            }
            if url.contains("/licenseTypes/") {
                return Ok(json!([{"licenseId": 10}]));
            }
            Ok(json!({"appointments": [{"company": "Acme"}]}))
        }
    }

    /// 指定州的請求直接 panic，其他州都有資料
    struct PanickingSource {
        panics_on: &'static str,
    }

    #[async_trait]
    impl JsonSource for PanickingSource {
        async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
            if url.contains(&format!("jurisdiction={}", self.panics_on)) {
                panic!("upstream handler blew up for {}", self.panics_on);
            }
            if url.contains("/licenseLookup/search") {
                return Ok(json!([{"licenseNumber": "L1"}]));
            }
            if url.contains("/licenseTypes/") {
                return Ok(json!([{"licenseId": 10}]));
            }
            Ok(json!({"appointments": []}))
        }
    }

    fn orchestrator(source: Arc<CountingSource>, concurrency: usize) -> BatchOrchestrator {
        let resolver =
            JurisdictionResolver::new(source, Endpoints::new("http://naic.test/api").unwrap());
        BatchOrchestrator::new(resolver, Jurisdiction::ALL.to_vec(), concurrency)
    }

    #[tokio::test]
    async fn test_batch_has_one_result_per_jurisdiction_in_order() {
        let source = Arc::new(CountingSource::new(vec!["AL", "TN"], vec!["AK", "WI"]));
        let orchestrator = orchestrator(source.clone(), DEFAULT_CONCURRENCY);
        let npn = Npn::parse("123456").unwrap();

        let batch = orchestrator.run_batch(&npn).await;

        assert_eq!(batch.npn, npn);
        assert_eq!(batch.results.len(), Jurisdiction::ALL.len());
        let states: Vec<Jurisdiction> = batch.results.iter().map(|r| r.state).collect();
        assert_eq!(states, Jurisdiction::ALL.to_vec());

        assert!(batch.results[0].is_found());
        assert_eq!(batch.results[1], StateResult::not_found(Jurisdiction::AK));
        assert_eq!(batch.found_count(), 2);
        // 34 次搜尋 + AL、TN 各多兩次
        assert_eq!(source.total.load(Ordering::SeqCst), 34 + 4);
    }

    #[tokio::test]
    async fn test_concurrency_cap_is_respected() {
        let source = Arc::new(CountingSource::new(vec!["AL", "CT", "MN"], vec![]));
        let orchestrator = orchestrator(source.clone(), DEFAULT_CONCURRENCY);

        orchestrator
            .run_batch(&Npn::parse("987654").unwrap())
            .await;

        let max = source.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= DEFAULT_CONCURRENCY, "saw {} chains in flight", max);
        assert!(max > 1, "chains never overlapped");
    }

    #[tokio::test]
    async fn test_concurrency_of_one_is_sequential() {
        let source = Arc::new(CountingSource::new(vec![], vec![]));
        let orchestrator = orchestrator(source.clone(), 1);

        let batch = orchestrator.run_batch(&Npn::parse("1").unwrap()).await;

        assert_eq!(batch.results.len(), Jurisdiction::ALL.len());
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_chain_degrades_to_not_found() {
        let source = Arc::new(PanickingSource { panics_on: "GU" });
        let resolver =
            JurisdictionResolver::new(source, Endpoints::new("http://naic.test/api").unwrap());
        let orchestrator = BatchOrchestrator::new(resolver, Jurisdiction::ALL.to_vec(), 2);

        let batch = orchestrator.run_batch(&Npn::parse("123456").unwrap()).await;

        let states: Vec<Jurisdiction> = batch.results.iter().map(|r| r.state).collect();
        assert_eq!(states, Jurisdiction::ALL.to_vec());

        let gu = batch
            .results
            .iter()
            .find(|r| r.state == Jurisdiction::GU)
            .unwrap();
        assert_eq!(*gu, StateResult::not_found(Jurisdiction::GU));
        assert_eq!(batch.found_count(), Jurisdiction::ALL.len() - 1);
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let source = Arc::new(CountingSource::new(vec![], vec![]));
        assert_eq!(orchestrator(source, 0).concurrency(), 1);
    }
}
