use crate::domain::jurisdiction::Jurisdiction;
use crate::utils::error::{LookupError, Result};
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// 上游對 license type 識別碼有兩種拼法，依優先順序嘗試
pub const LICENSE_ID_FIELDS: &[&str] = &["licenseId", "licenseID"];

pub const LICENSE_NUMBER_FIELD: &str = "licenseNumber";

pub const APPOINTMENTS_FIELD: &str = "appointments";

/// National Producer Number，已去除前後空白且非空
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Npn(String);

impl Npn {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LookupError::ValidationError {
                message: "Please enter an NPN.".to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Npn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Loosely typed upstream record.
///
/// The NAIC endpoints are not schema-stable, so records keep the raw JSON and
/// expose the few fields the lookup chain needs through accessors. Missing,
/// `null`, empty-string, zero and `false` values all count as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: serde_json::Value,
}

impl Record {
    pub fn new(data: serde_json::Value) -> Self {
        Self { data }
    }

    /// 依序嘗試多個欄位名稱，回傳第一個有值的欄位（字串化）
    pub fn field_str(&self, names: &[&str]) -> Option<String> {
        names
            .iter()
            .filter_map(|name| self.data.get(*name))
            .find_map(present_as_string)
    }

    pub fn license_number(&self) -> Option<String> {
        self.field_str(&[LICENSE_NUMBER_FIELD])
    }

    pub fn license_id(&self) -> Option<String> {
        self.field_str(LICENSE_ID_FIELDS)
    }

    /// 將 JSON 陣列轉為記錄序列；非陣列回傳空序列
    pub fn list_from(value: serde_json::Value) -> Vec<Record> {
        match value {
            serde_json::Value::Array(items) => items.into_iter().map(Record::new).collect(),
            _ => Vec::new(),
        }
    }
}

/// `null`、`false`、0 與空字串視為沒有值
fn is_falsy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null | serde_json::Value::Bool(false) => true,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn present_as_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        serde_json::Value::Bool(true) => Some("true".to_string()),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Some(value.to_string()),
        _ => None,
    }
}

/// 單一州查詢的最終結果
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Found {
        search: Record,
        license_types: Vec<Record>,
        appointments: Vec<Record>,
    },
    NotFound {
        message: String,
    },
    /// 搜尋成功但 license type 沒有可用的識別碼，保留中間資料。
    /// `license_types` 為上游原始回應，不一定是陣列
    MissingLicenseId {
        search: Record,
        license_types: serde_json::Value,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateResult {
    pub state: Jurisdiction,
    pub outcome: Outcome,
}

impl StateResult {
    pub fn found(
        state: Jurisdiction,
        search: Record,
        license_types: Vec<Record>,
        appointments: Vec<Record>,
    ) -> Self {
        Self {
            state,
            outcome: Outcome::Found {
                search,
                license_types,
                appointments,
            },
        }
    }

    pub fn not_found(state: Jurisdiction) -> Self {
        Self {
            state,
            outcome: Outcome::NotFound {
                message: format!("Not found in {}", state),
            },
        }
    }

    /// 沒有值的回應（`null`、空字串等）以空陣列記錄，其餘保留原樣
    pub fn missing_license_id(
        state: Jurisdiction,
        search: Record,
        license_types: serde_json::Value,
    ) -> Self {
        let license_types = if is_falsy(&license_types) {
            serde_json::Value::Array(Vec::new())
        } else {
            license_types
        };
        Self {
            state,
            outcome: Outcome::MissingLicenseId {
                search,
                license_types,
                message: format!("No licenseId returned for {}", state),
            },
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self.outcome, Outcome::Found { .. })
    }

    pub fn message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Found { .. } => None,
            Outcome::NotFound { message } | Outcome::MissingLicenseId { message, .. } => {
                Some(message)
            }
        }
    }

    pub fn search(&self) -> Option<&Record> {
        match &self.outcome {
            Outcome::Found { search, .. } | Outcome::MissingLicenseId { search, .. } => {
                Some(search)
            }
            Outcome::NotFound { .. } => None,
        }
    }

    pub fn appointments(&self) -> &[Record] {
        match &self.outcome {
            Outcome::Found { appointments, .. } => appointments,
            _ => &[],
        }
    }
}

// 輸出為扁平物件：{state, found, search?, licenseTypes?, appointments?, message?}
impl Serialize for StateResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("state", &self.state)?;
        map.serialize_entry("found", &self.is_found())?;
        match &self.outcome {
            Outcome::Found {
                search,
                license_types,
                appointments,
            } => {
                map.serialize_entry("search", search)?;
                map.serialize_entry("licenseTypes", license_types)?;
                map.serialize_entry("appointments", appointments)?;
            }
            Outcome::NotFound { message } => {
                map.serialize_entry("message", message)?;
            }
            Outcome::MissingLicenseId {
                search,
                license_types,
                message,
            } => {
                map.serialize_entry("search", search)?;
                map.serialize_entry("licenseTypes", license_types)?;
                map.serialize_entry("message", message)?;
            }
        }
        map.end()
    }
}

/// 一個 NPN 的完整批次結果，依州順序排列
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Batch {
    pub npn: Npn,
    pub results: Vec<StateResult>,
    pub completed_at: DateTime<Utc>,
}

impl Batch {
    pub fn new(npn: Npn, results: Vec<StateResult>) -> Self {
        Self {
            npn,
            results,
            completed_at: Utc::now(),
        }
    }

    pub fn found_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_found()).count()
    }
}

/// 查詢服務的回傳值；`cached` 表示批次是否直接由快取提供
#[derive(Debug, Clone)]
pub struct LookupReport {
    pub cached: bool,
    pub batch: Arc<Batch>,
}

impl Serialize for LookupReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("npn", &self.batch.npn)?;
        map.serialize_entry("cached", &self.cached)?;
        map.serialize_entry("completed_at", &self.batch.completed_at)?;
        map.serialize_entry("results", &self.batch.results)?;
        map.end()
    }
}
