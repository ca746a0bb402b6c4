use anyhow::{anyhow, Result};

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Bearer token sent with every call. Set via REQVAL_API_TOKEN.
    pub token: Option<String>,
    /// Per-call timeout. Set via REQVAL_API_TIMEOUT_MS. Default: 30000.
    pub timeout_ms: u64,
}

impl RemoteConfig {
    /// Resolve settings: explicit flag > environment > default.
    pub fn resolve(api_url: Option<&str>, timeout_ms: Option<u64>) -> Result<Self> {
        Self::resolve_with(api_url, timeout_ms, |key| std::env::var(key).ok())
    }

    fn resolve_with(
        api_url: Option<&str>,
        timeout_ms: Option<u64>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let base_url = api_url
            .map(str::to_string)
            .or_else(|| env("REQVAL_API_URL"))
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow!("no request tracker configured (pass --api-url, --fixture, or set REQVAL_API_URL)"))?;
        let timeout_ms = timeout_ms
            .or_else(|| env("REQVAL_API_TIMEOUT_MS").and_then(|v| v.trim().parse().ok()))
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let token = env("REQVAL_API_TOKEN").filter(|token| !token.trim().is_empty());
        Ok(Self {
            base_url,
            token,
            timeout_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn flag_wins_over_environment() {
        let config = RemoteConfig::resolve_with(
            Some("http://flag"),
            None,
            env_from(&[("REQVAL_API_URL", "http://env"), ("REQVAL_API_TIMEOUT_MS", "500")]),
        )
        .expect("config");
        assert_eq!(config.base_url, "http://flag");
        assert_eq!(config.timeout_ms, 500);
        assert_eq!(config.token, None);
    }

    #[test]
    fn environment_supplies_url_and_token() {
        let config = RemoteConfig::resolve_with(
            None,
            Some(10),
            env_from(&[("REQVAL_API_URL", "http://env"), ("REQVAL_API_TOKEN", "secret")]),
        )
        .expect("config");
        assert_eq!(config.base_url, "http://env");
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.timeout_ms, 10);
    }

    #[test]
    fn bad_timeout_falls_back_to_default() {
        let config = RemoteConfig::resolve_with(
            Some("http://flag"),
            None,
            env_from(&[("REQVAL_API_TIMEOUT_MS", "soon")]),
        )
        .expect("config");
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn missing_url_is_an_error() {
        assert!(RemoteConfig::resolve_with(None, None, env_from(&[])).is_err());
        assert!(RemoteConfig::resolve_with(Some("  "), None, env_from(&[])).is_err());
    }
}
