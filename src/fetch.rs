//! Remote lookups for one validation: the package behind the adapter
//! instance (fatal on failure) and the request record (degraded to the
//! sentinel on failure).
use crate::remote::{FetchError, PackageFilter, RequestRecord, RequestTracker};
use anyhow::{anyhow, Context, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIdentity {
    pub id: i64,
    pub name: String,
}

pub fn resolve_package(tracker: &dyn RequestTracker, instance_id: &str) -> Result<PackageIdentity> {
    let instance = tracker
        .resolve_instance(instance_id)
        .with_context(|| format!("resolve PackageAdapterInstance [{instance_id}]"))?;
    let packages = tracker
        .list_packages(&PackageFilter::by_package_key(&instance.package_key))
        .with_context(|| format!("list packages for key [{}]", instance.package_key))?;
    let package = packages.into_iter().next().ok_or_else(|| {
        anyhow!("Could not resolve Package from PackageAdapterInstance [{instance_id}]")
    })?;
    tracing::debug!(
        instance_id,
        package_id = package.id,
        package = package.name.as_str(),
        "package resolved"
    );
    Ok(PackageIdentity {
        id: package.id,
        name: package.name,
    })
}

/// Result of a request lookup that never aborts the run.
#[derive(Debug)]
pub struct RequestFetch {
    pub record: RequestRecord,
    pub failure: Option<FetchError>,
}

impl RequestFetch {
    /// Transcript line describing the failure, if any.
    pub fn failure_message(&self, request_number: &str) -> Option<String> {
        let failure = self.failure.as_ref()?;
        Some(if failure.is_serialization() {
            format!(
                "Error:  Could not retrieve Request [{request_number}].{}",
                failure.detail_suffix()
            )
        } else {
            format!("Error:  Could not retrieve Request [{request_number}].  Unhandled exception.")
        })
    }
}

pub fn fetch_request(tracker: &dyn RequestTracker, request_number: &str) -> RequestFetch {
    match tracker.get_request(request_number) {
        Ok(record) => {
            tracing::debug!(
                request_number,
                request_id = record.id,
                application = record.application_name.as_str(),
                approved_at = %record.approved_date_time,
                "request fetched"
            );
            RequestFetch {
                record,
                failure: None,
            }
        }
        Err(err) => {
            tracing::warn!(request_number, error = %err, "request lookup failed; using sentinel");
            RequestFetch {
                record: RequestRecord::sentinel(),
                failure: Some(err),
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeTracker;
    use super::*;

    #[test]
    fn resolves_first_matching_package() {
        let mut tracker = FakeTracker::with_package(7, "Payroll");
        tracker.packages.push(crate::remote::PackageRecord {
            id: 8,
            name: "Payroll v2".to_string(),
            package_key: "key".to_string(),
        });
        let package = resolve_package(&tracker, "42").expect("package");
        assert_eq!(
            package,
            PackageIdentity {
                id: 7,
                name: "Payroll".to_string()
            }
        );
    }

    #[test]
    fn zero_candidates_is_fatal() {
        let mut tracker = FakeTracker::with_package(7, "Payroll");
        tracker.packages.clear();
        let err = resolve_package(&tracker, "42").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not resolve Package from PackageAdapterInstance [42]"
        );
    }

    #[test]
    fn instance_lookup_failure_is_fatal() {
        let tracker = FakeTracker::default();
        let err = resolve_package(&tracker, "42").unwrap_err();
        assert!(format!("{err:#}").contains("resolve PackageAdapterInstance [42]"));
    }

    #[test]
    fn serialization_failure_degrades_with_details() {
        let tracker = FakeTracker {
            request_error: Some(|| FetchError::Serialization {
                details: vec!["bad date".to_string()],
            }),
            ..FakeTracker::default()
        };
        let fetch = fetch_request(&tracker, "CRQ000000000001");
        assert!(fetch.failure.is_some());
        assert_eq!(fetch.record, RequestRecord::sentinel());
        assert_eq!(
            fetch.failure_message("CRQ000000000001").as_deref(),
            Some("Error:  Could not retrieve Request [CRQ000000000001]. :: bad date")
        );
    }

    #[test]
    fn other_failure_degrades_as_unhandled() {
        let tracker = FakeTracker {
            request_error: Some(|| FetchError::Transport("connection reset".to_string())),
            ..FakeTracker::default()
        };
        let fetch = fetch_request(&tracker, "INC000000000001");
        assert_eq!(fetch.record, RequestRecord::sentinel());
        assert_eq!(
            fetch.failure_message("INC000000000001").as_deref(),
            Some("Error:  Could not retrieve Request [INC000000000001].  Unhandled exception.")
        );
    }

    #[test]
    fn successful_fetch_has_no_failure_message() {
        let mut record = RequestRecord::sentinel();
        record.id = 9;
        let tracker = FakeTracker {
            request: Some(record.clone()),
            ..FakeTracker::default()
        };
        let fetch = fetch_request(&tracker, "TAS000000000001");
        assert!(fetch.failure.is_none());
        assert_eq!(fetch.record, record);
        assert_eq!(fetch.failure_message("TAS000000000001"), None);
    }
}
