use super::{
    FetchError, PackageAdapterInstanceRecord, PackageFilter, PackageRecord, RequestRecord,
    RequestTracker,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// In-memory tracker backed by a JSON snapshot of the service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureTracker {
    #[serde(default)]
    pub instances: Vec<PackageAdapterInstanceRecord>,
    #[serde(default)]
    pub packages: Vec<PackageRecord>,
    /// Kept as raw JSON so a malformed entry fails only its own lookup.
    #[serde(default)]
    pub requests: Vec<serde_json::Value>,
}

impl FixtureTracker {
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse fixture {}", path.display()))
    }
}

impl RequestTracker for FixtureTracker {
    fn resolve_instance(&self, id: &str) -> Result<PackageAdapterInstanceRecord, FetchError> {
        self.instances
            .iter()
            .find(|instance| instance.id == id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                what: format!("package adapter instance {id}"),
            })
    }

    fn list_packages(&self, filter: &PackageFilter) -> Result<Vec<PackageRecord>, FetchError> {
        Ok(self
            .packages
            .iter()
            .filter(|package| filter.matches(package))
            .cloned()
            .collect())
    }

    fn get_request(&self, request_number: &str) -> Result<RequestRecord, FetchError> {
        let raw = self
            .requests
            .iter()
            .find(|value| {
                value
                    .get("request_number")
                    .and_then(|number| number.as_str())
                    .is_some_and(|number| number.eq_ignore_ascii_case(request_number))
            })
            .ok_or_else(|| FetchError::NotFound {
                what: format!("request {request_number}"),
            })?;
        serde_json::from_value(raw.clone()).map_err(|err| FetchError::Serialization {
            details: vec![err.to_string()],
        })
    }
}
