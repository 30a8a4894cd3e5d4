use crate::domain::jurisdiction::Jurisdiction;
use crate::domain::model::Npn;
use crate::utils::error::{LookupError, Result};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://services.naic.org/api";

/// NAIC license lookup 的三個端點
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(LookupError::ConfigError {
                message: format!("Base URL cannot carry path segments: {}", base_url),
            });
        }
        Ok(Self { base })
    }

    fn with_segments(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| LookupError::ConfigError {
                message: format!("Base URL cannot carry path segments: {}", self.base),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn search(&self, jurisdiction: Jurisdiction, npn: &Npn) -> Result<Url> {
        let mut url = self.with_segments(&["licenseLookup", "search"])?;
        url.query_pairs_mut()
            .append_pair("jurisdiction", jurisdiction.code())
            .append_pair("searchType", "Licensee")
            .append_pair("entityType", "IND")
            .append_pair("npn", npn.as_str());
        Ok(url)
    }

    pub fn license_types(&self, jurisdiction: Jurisdiction, license_number: &str) -> Result<Url> {
        self.with_segments(&[
            "licenseeLookup",
            "summary",
            "licenseTypes",
            jurisdiction.code(),
            license_number,
        ])
    }

    pub fn appointments(&self, jurisdiction: Jurisdiction, license_id: &str) -> Result<Url> {
        self.with_segments(&[
            "licenseeLookup",
            "summary",
            "appointments",
            jurisdiction.code(),
            license_id,
        ])
    }
}
