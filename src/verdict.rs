use crate::fetch::PackageIdentity;
use crate::remote::RequestRecord;
use chrono::{DateTime, Utc};

/// Outcome of the approval condition, kept separate so the transcript can
/// say when approval was waived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalCheck {
    Approved,
    NotApproved,
    NotRequired,
}

impl ApprovalCheck {
    pub fn passed(&self) -> bool {
        !matches!(self, ApprovalCheck::NotApproved)
    }

    fn label(&self) -> &'static str {
        match self {
            ApprovalCheck::Approved => "true",
            ApprovalCheck::NotApproved => "false",
            ApprovalCheck::NotRequired => "Not Required",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub package_associated: bool,
    pub in_date_range: bool,
    pub approval: ApprovalCheck,
    pub not_complete: bool,
    audit: Vec<String>,
}

impl Verdict {
    pub fn evaluate(
        package: &PackageIdentity,
        record: &RequestRecord,
        request_number: &str,
        requires_approval: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let package_associated = record.has_package(package.id);
        let in_date_range = record.start_date_time <= now && now <= record.end_date_time;
        let approval = match (requires_approval, record.is_approved) {
            (false, _) => ApprovalCheck::NotRequired,
            (true, true) => ApprovalCheck::Approved,
            (true, false) => ApprovalCheck::NotApproved,
        };
        let not_complete = !record.is_complete;

        let audit = vec![
            format!(
                "Package Association:  Pass: [{}], Condition: Package [{}] to Request [{}]",
                package_associated, package.name, request_number
            ),
            format!(
                "Date Range:           Pass: [{}], Condition: StartDateTime:[{}] <= {} <= EndDateTime:[{}]",
                in_date_range, record.start_date_time, now, record.end_date_time
            ),
            format!(
                "IsApproved:           Pass: [{}], Condition: IsApproved == true",
                approval.label()
            ),
            format!(
                "IsComplete:           Pass: [{}], Condition: IsComplete == false",
                not_complete
            ),
        ];

        Self {
            package_associated,
            in_date_range,
            approval,
            not_complete,
            audit,
        }
    }

    pub fn passed(&self) -> bool {
        self.package_associated && self.in_date_range && self.approval.passed() && self.not_complete
    }

    /// One line per condition, then the aggregate line.
    pub fn audit_lines(&self) -> Vec<String> {
        let mut lines = self.audit.clone();
        lines.push(format!(
            "Request is Valid:     Pass: [{}], Condition: (HasPackageAssociation && InDateRange && IsApproved && !IsComplete)",
            self.passed()
        ));
        lines
    }
}
