//! Request-tracking service boundary.
//!
//! The validator only needs three lookups; `RequestTracker` names them so
//! the HTTP client and the fixture snapshot are interchangeable.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod fixture;
mod http;

pub use fixture::FixtureTracker;
pub use http::HttpTracker;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PackageAdapterInstanceRecord {
    pub id: String,
    pub package_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PackageRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub package_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageFilter {
    pub package_key: Option<String>,
}

impl PackageFilter {
    pub fn by_package_key(package_key: &str) -> Self {
        Self {
            package_key: Some(package_key.to_string()),
        }
    }

    pub fn matches(&self, package: &PackageRecord) -> bool {
        self.package_key
            .as_deref()
            .is_none_or(|key| key == package.package_key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequestPackageRecord {
    pub package_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequestRecord {
    pub id: i64,
    pub request_number: String,
    #[serde(default)]
    pub application_name: String,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    #[serde(default = "min_utc")]
    pub approved_date_time: DateTime<Utc>,
    pub is_approved: bool,
    pub is_complete: bool,
    #[serde(default)]
    pub packages: Vec<RequestPackageRecord>,
}

fn min_utc() -> DateTime<Utc> {
    DateTime::<Utc>::MIN_UTC
}

impl RequestRecord {
    /// Stand-in for a request that could not be fetched.
    ///
    /// Unapproved, already complete and outside every date range, so any
    /// verdict computed over it fails.
    pub fn sentinel() -> Self {
        Self {
            id: 0,
            request_number: "Invalid".to_string(),
            application_name: "Unknown".to_string(),
            start_date_time: min_utc(),
            end_date_time: min_utc(),
            approved_date_time: min_utc(),
            is_approved: false,
            is_complete: true,
            packages: Vec::new(),
        }
    }

    pub fn has_package(&self, package_id: i64) -> bool {
        self.packages.iter().any(|p| p.package_id == package_id)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("response could not be deserialized{}", join_details(.details))]
    Serialization { details: Vec<String> },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {code} from {url}")]
    Status { code: u16, url: String },

    #[error("{what} not found")]
    NotFound { what: String },
}

impl FetchError {
    pub fn is_serialization(&self) -> bool {
        matches!(self, FetchError::Serialization { .. })
    }

    /// Detail suffix in the ` :: a :: b` shape used by the run transcript.
    pub fn detail_suffix(&self) -> String {
        match self {
            FetchError::Serialization { details } => join_details(details),
            _ => String::new(),
        }
    }
}

fn join_details(details: &[String]) -> String {
    details
        .iter()
        .map(|detail| format!(" :: {detail}"))
        .collect::<String>()
}

pub trait RequestTracker {
    fn resolve_instance(&self, id: &str) -> Result<PackageAdapterInstanceRecord, FetchError>;

    fn list_packages(&self, filter: &PackageFilter) -> Result<Vec<PackageRecord>, FetchError>;

    fn get_request(&self, request_number: &str) -> Result<RequestRecord, FetchError>;
}
