use crate::core::endpoints::Endpoints;
use crate::domain::jurisdiction::Jurisdiction;
use crate::domain::model::{Npn, Record, StateResult, APPOINTMENTS_FIELD};
use crate::domain::ports::JsonSource;
use crate::utils::error::Result;
use std::sync::Arc;

/// 單一州的查詢鏈：search → license types → appointments
#[derive(Clone)]
pub struct JurisdictionResolver {
    source: Arc<dyn JsonSource>,
    endpoints: Endpoints,
}

impl JurisdictionResolver {
    pub fn new(source: Arc<dyn JsonSource>, endpoints: Endpoints) -> Self {
        Self { source, endpoints }
    }

    /// Resolves one jurisdiction. Never fails: any error inside the chain
    /// collapses to the generic "Not found in <STATE>" result.
    pub async fn resolve(&self, jurisdiction: Jurisdiction, npn: &Npn) -> StateResult {
        match self.run_chain(jurisdiction, npn).await {
            Ok(result) => {
                tracing::debug!(
                    "🔎 {}: found={} {}",
                    jurisdiction,
                    result.is_found(),
                    result.message().unwrap_or("")
                );
                result
            }
            Err(err) if err.is_transient() => {
                tracing::warn!("⚠️ {}: lookup chain failed, reporting not found: {}", jurisdiction, err);
                StateResult::not_found(jurisdiction)
            }
            Err(err) => {
                tracing::error!("❌ {}: unexpected lookup error, reporting not found: {}", jurisdiction, err);
                StateResult::not_found(jurisdiction)
            }
        }
    }

    async fn run_chain(&self, jurisdiction: Jurisdiction, npn: &Npn) -> Result<StateResult> {
        // 1) 以 NPN 搜尋執照
        let search_url = self.endpoints.search(jurisdiction, npn)?;
        let search = self.source.fetch_json(search_url.as_str()).await?;

        let Some(summary) = first_record(search) else {
            return Ok(StateResult::not_found(jurisdiction));
        };
        let Some(license_number) = summary.license_number() else {
            return Ok(StateResult::not_found(jurisdiction));
        };

        // 2) 取得 license types 以拿到 licenseId
        let types_url = self.endpoints.license_types(jurisdiction, &license_number)?;
        let types_body = self.source.fetch_json(types_url.as_str()).await?;

        let license_id = match types_body.as_array().and_then(|items| items.first()) {
            // 第一筆是 null 代表上游資料毀損，與其他錯誤同樣視為查無資料
            Some(serde_json::Value::Null) => {
                tracing::debug!("{}: first license type entry is null", jurisdiction);
                return Ok(StateResult::not_found(jurisdiction));
            }
            Some(first) => Record::new(first.clone()).license_id(),
            None => None,
        };
        let Some(license_id) = license_id else {
            return Ok(StateResult::missing_license_id(
                jurisdiction,
                summary,
                types_body,
            ));
        };
        let license_types = Record::list_from(types_body);

        // 3) appointments
        let appointments_url = self.endpoints.appointments(jurisdiction, &license_id)?;
        let appointments = extract_appointments(
            self.source.fetch_json(appointments_url.as_str()).await?,
        );

        Ok(StateResult::found(
            jurisdiction,
            summary,
            license_types,
            appointments,
        ))
    }
}

// 通常每州一個 NPN 只會有一筆
fn first_record(search: serde_json::Value) -> Option<Record> {
    match search {
        serde_json::Value::Array(items) => items.into_iter().next().map(Record::new),
        _ => None,
    }
}

fn extract_appointments(mut response: serde_json::Value) -> Vec<Record> {
    match response.get_mut(APPOINTMENTS_FIELD).map(serde_json::Value::take) {
        Some(list) => Record::list_from(list),
        None => Vec::new(),
    }
}
