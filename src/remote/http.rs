use super::{
    FetchError, PackageAdapterInstanceRecord, PackageFilter, PackageRecord, RequestRecord,
    RequestTracker,
};
use crate::config::RemoteConfig;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use ureq::Agent;
use urlencoding::encode;

/// JSON-over-HTTP client for the request-tracking service.
///
/// Identifiers are percent-encoded as single path segments, so a value
/// holding `/`, `?` or `#` can never address another resource.
pub struct HttpTracker {
    agent: Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpTracker {
    pub fn new(config: &RemoteConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_millis(config.timeout_ms)))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<(&str, &str)>,
    ) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, path);
        let mut request = self.agent.get(&url).header("accept", "application/json");
        if let Some((key, value)) = query {
            request = request.query(key, value);
        }
        if let Some(token) = self.token.as_deref() {
            request = request.header("authorization", format!("Bearer {token}"));
        }

        let start = Instant::now();
        let mut response = request
            .call()
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        let status = response.status();
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            status = status.as_u16(),
            url = url.as_str(),
            "request tracker call complete"
        );
        if status.as_u16() == 404 {
            return Err(FetchError::NotFound {
                what: path.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
                url,
            });
        }
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        serde_json::from_str(&body).map_err(|err| FetchError::Serialization {
            details: vec![err.to_string()],
        })
    }
}

impl RequestTracker for HttpTracker {
    fn resolve_instance(&self, id: &str) -> Result<PackageAdapterInstanceRecord, FetchError> {
        self.get_json(&format!("package-adapter-instances/{}", encode(id)), None)
    }

    fn list_packages(&self, filter: &PackageFilter) -> Result<Vec<PackageRecord>, FetchError> {
        let query = filter
            .package_key
            .as_deref()
            .map(|key| ("package_key", key));
        self.get_json("packages", query)
    }

    fn get_request(&self, request_number: &str) -> Result<RequestRecord, FetchError> {
        self.get_json(&format!("requests/{}", encode(request_number)), None)
    }
}
