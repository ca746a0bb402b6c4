//! Workflow parameters: the JSON payload handed to the validator and the
//! prepared rule list derived from it.
use crate::classify::RequestType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Raw parameters as supplied by the caller.
///
/// Every field defaults so that a blank request number or an empty rule
/// list surfaces as "invalid parameters" during validation rather than as a
/// parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct WorkflowParameters {
    #[serde(default)]
    pub request_number: Option<String>,
    #[serde(default)]
    pub package_adapter_instance: Option<String>,
    #[serde(default)]
    pub request_type_options: Vec<RequestTypeOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequestTypeOption {
    pub request_type: RequestType,
    pub requires_approval: bool,
}

/// Ordered `(category, requires approval)` rules, one per category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTypeRules {
    rules: Vec<RequestTypeOption>,
}

impl RequestTypeRules {
    /// Keep the first rule seen for each category, preserving input order.
    pub fn from_options(options: &[RequestTypeOption]) -> Self {
        let mut rules: Vec<RequestTypeOption> = Vec::with_capacity(options.len());
        for option in options {
            if let Some(kept) = rules
                .iter()
                .find(|rule| rule.request_type == option.request_type)
            {
                tracing::warn!(
                    request_type = option.request_type.as_str(),
                    kept = kept.requires_approval,
                    ignored = option.requires_approval,
                    "duplicate request type option ignored"
                );
                continue;
            }
            rules.push(*option);
        }
        Self { rules }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestTypeOption> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Parameters after the rule list has been derived and validity computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedParameters {
    pub request_number: String,
    pub package_adapter_instance: String,
    pub rules: RequestTypeRules,
    pub is_valid: bool,
}

impl WorkflowParameters {
    /// Replace payload identifiers with the values the invocation carries.
    pub fn apply_overrides(
        &mut self,
        request_number: Option<&str>,
        package_adapter_instance: Option<&str>,
    ) {
        if let Some(number) = request_number {
            self.request_number = Some(number.to_string());
        }
        if let Some(instance) = package_adapter_instance {
            self.package_adapter_instance = Some(instance.to_string());
        }
    }

    /// The request number is carried verbatim: surrounding whitespace makes it
    /// an Unknown Format number rather than being silently repaired.
    pub fn prepare(&self) -> PreparedParameters {
        let request_number = self.request_number.clone().unwrap_or_default();
        let rules = RequestTypeRules::from_options(&self.request_type_options);
        let is_valid = !request_number.trim().is_empty() && !rules.is_empty();
        PreparedParameters {
            request_number,
            package_adapter_instance: self
                .package_adapter_instance
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            rules,
            is_valid,
        }
    }

    /// Single-line rendering for the run transcript.
    pub fn compact_json(&self) -> Result<String> {
        serde_json::to_string(self).context("serialize workflow parameters")
    }
}

pub fn load_parameters(raw: &str) -> Result<WorkflowParameters> {
    serde_json::from_str(raw).context("parse workflow parameters JSON")
}

/// Load parameters from a file, or from stdin when `path` is `-`.
pub fn load_parameters_file(path: &Path) -> Result<WorkflowParameters> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read workflow parameters from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?
    };
    load_parameters(&raw).with_context(|| format!("load parameters from {}", path.display()))
}
