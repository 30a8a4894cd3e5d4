use crate::domain::model::{Batch, Npn};
use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// In-memory batch cache keyed by NPN with a fixed time-to-live.
///
/// Concurrent callers for the same NPN are coalesced by `get_or_run`: only one
/// of them drives the batch, the rest wait for its value.
#[derive(Clone)]
pub struct ResultCache {
    entries: Cache<Npn, Arc<Batch>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        let entries = Cache::builder().time_to_live(ttl).build();
        Self { entries }
    }

    pub async fn get(&self, npn: &Npn) -> Option<Arc<Batch>> {
        self.entries.get(npn).await
    }

    /// 後寫入者覆蓋先前的項目，並重新計算存活時間
    pub async fn put(&self, npn: &Npn, batch: Arc<Batch>) {
        self.entries.insert(npn.clone(), batch).await;
    }

    /// 回傳快取中的批次，不存在時執行 `run` 並寫入。
    /// 第二個值為 `true` 表示本次呼叫實際執行了批次。
    pub async fn get_or_run<F>(&self, npn: &Npn, run: F) -> (Arc<Batch>, bool)
    where
        F: Future<Output = Batch>,
    {
        let entry = self
            .entries
            .entry_by_ref(npn)
            .or_insert_with(async move { Arc::new(run.await) })
            .await;
        let fresh = entry.is_fresh();
        (entry.into_value(), fresh)
    }

    /// 目前的項目數；先處理待執行的淘汰工作
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }
}
