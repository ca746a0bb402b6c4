//! Request number classification.
//!
//! Formats are fixed per category; whether a category needs approval comes
//! from the caller's rule list, which is walked in order so the first
//! category whose format matches decides.
use crate::params::RequestTypeRules;
use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_FORMAT: &str = "Unknown Format";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    #[serde(alias = "Change")]
    Change,
    #[serde(alias = "Incident")]
    Incident,
    #[serde(alias = "Task")]
    Task,
}

impl RequestType {
    pub const ALL: [RequestType; 3] = [RequestType::Change, RequestType::Incident, RequestType::Task];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Change => "change",
            RequestType::Incident => "incident",
            RequestType::Task => "task",
        }
    }

    pub fn pattern(&self) -> &'static str {
        match self {
            RequestType::Change => r"^CRQ[\d]{12}$",
            RequestType::Incident => r"^INC[\d]{12}$",
            RequestType::Task => r"^TAS[\d]{12}$",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub matched: bool,
    pub category: Option<RequestType>,
    pub format_label: String,
    pub requires_approval: bool,
}

impl Classification {
    pub fn audit_line(&self, request_number: &str) -> String {
        format!(
            "RequestNumber Format: Pass: [{}], Condition: [{}], RequestNumber [{}]",
            self.matched, self.format_label, request_number
        )
    }
}

/// Compiled request number formats, one per category.
pub struct RequestNumberFormats {
    formats: Vec<(RequestType, Regex)>,
}

impl RequestNumberFormats {
    pub fn new() -> Result<Self> {
        let formats = RequestType::ALL
            .iter()
            .map(|request_type| {
                RegexBuilder::new(request_type.pattern())
                    .case_insensitive(true)
                    .build()
                    .with_context(|| format!("compile {} format", request_type.as_str()))
                    .map(|regex| (*request_type, regex))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { formats })
    }

    fn regex_for(&self, request_type: RequestType) -> Option<&Regex> {
        self.formats
            .iter()
            .find(|(candidate, _)| *candidate == request_type)
            .map(|(_, regex)| regex)
    }

    /// Classify `request_number` against the categories named by `rules`.
    ///
    /// With no matching rule the number is reported as `Unknown Format` and
    /// approval stays required.
    pub fn classify(&self, request_number: &str, rules: &RequestTypeRules) -> Classification {
        for rule in rules.iter() {
            let Some(regex) = self.regex_for(rule.request_type) else {
                continue;
            };
            if regex.is_match(request_number) {
                tracing::debug!(
                    request_number,
                    request_type = rule.request_type.as_str(),
                    requires_approval = rule.requires_approval,
                    "request number format matched"
                );
                return Classification {
                    matched: true,
                    category: Some(rule.request_type),
                    format_label: rule.request_type.pattern().to_string(),
                    requires_approval: rule.requires_approval,
                };
            }
        }
        tracing::debug!(
            request_number,
            rules = rules.len(),
            "request number matched no configured format"
        );
        Classification {
            matched: false,
            category: None,
            format_label: UNKNOWN_FORMAT.to_string(),
            requires_approval: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::RequestTypeOption;

    fn rules(options: &[(RequestType, bool)]) -> RequestTypeRules {
        let options: Vec<_> = options
            .iter()
            .map(|(request_type, requires_approval)| RequestTypeOption {
                request_type: *request_type,
                requires_approval: *requires_approval,
            })
            .collect();
        RequestTypeRules::from_options(&options)
    }

    fn all_rules() -> RequestTypeRules {
        rules(&[
            (RequestType::Change, false),
            (RequestType::Incident, true),
            (RequestType::Task, false),
        ])
    }

    #[test]
    fn change_number_selects_change_rule() {
        let formats = RequestNumberFormats::new().expect("formats");
        let result = formats.classify("CRQ000000000001", &all_rules());
        assert!(result.matched);
        assert_eq!(result.category, Some(RequestType::Change));
        assert_eq!(result.format_label, r"^CRQ[\d]{12}$");
        assert!(!result.requires_approval);
    }

    #[test]
    fn match_is_case_insensitive() {
        let formats = RequestNumberFormats::new().expect("formats");
        let result = formats.classify("inc123456789012", &all_rules());
        assert_eq!(result.category, Some(RequestType::Incident));
        assert!(result.requires_approval);
    }

    #[test]
    fn unknown_number_defaults_to_required_approval() {
        let formats = RequestNumberFormats::new().expect("formats");
        let result = formats.classify("XYZ123", &all_rules());
        assert!(!result.matched);
        assert_eq!(result.category, None);
        assert_eq!(result.format_label, UNKNOWN_FORMAT);
        assert!(result.requires_approval);
    }

    #[test]
    fn categories_without_a_rule_never_match() {
        let formats = RequestNumberFormats::new().expect("formats");
        let result = formats.classify("TAS000000000001", &rules(&[(RequestType::Change, false)]));
        assert!(!result.matched);
        assert!(result.requires_approval);
    }

    #[test]
    fn empty_rules_fail_silently() {
        let formats = RequestNumberFormats::new().expect("formats");
        let result = formats.classify("CRQ000000000001", &RequestTypeRules::default());
        assert!(!result.matched);
        assert!(result.requires_approval);
    }

    #[test]
    fn wrong_digit_count_does_not_match() {
        let formats = RequestNumberFormats::new().expect("formats");
        assert!(!formats.classify("CRQ00000000001", &all_rules()).matched);
        assert!(!formats.classify("CRQ0000000000012", &all_rules()).matched);
        assert!(!formats.classify(" CRQ000000000001", &all_rules()).matched);
    }

    #[test]
    fn classification_is_repeatable() {
        let formats = RequestNumberFormats::new().expect("formats");
        let rules = all_rules();
        assert_eq!(
            formats.classify("TAS000000000042", &rules),
            formats.classify("TAS000000000042", &rules)
        );
    }

    #[test]
    fn audit_line_reports_outcome_and_condition() {
        let formats = RequestNumberFormats::new().expect("formats");
        let result = formats.classify("XYZ123", &all_rules());
        assert_eq!(
            result.audit_line("XYZ123"),
            "RequestNumber Format: Pass: [false], Condition: [Unknown Format], RequestNumber [XYZ123]"
        );
    }
}
