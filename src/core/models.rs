//! Data types flowing through the email enrichment pipeline.

use crate::utils::records::{FlatRecord, InputRow};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const FIRST_NAME_COLUMN: &str = "first_name";
pub const LAST_NAME_COLUMN: &str = "last_name";
pub const COMPANY_DOMAIN_COLUMN: &str = "company_domain";

/// Columns the email pipeline refuses to start without.
pub const REQUIRED_LEAD_COLUMNS: [&str; 3] =
    [FIRST_NAME_COLUMN, LAST_NAME_COLUMN, COMPANY_DOMAIN_COLUMN];

/// One input row of the email pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lead {
    /// 0-based position in the input file.
    pub row: usize,
    pub first_name: String,
    pub last_name: String,
    pub company_domain: String,
    /// Every other input column, in input order.
    pub passthrough: FlatRecord,
}

impl Lead {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        company_domain: impl Into<String>,
    ) -> Self {
        Self {
            row: 0,
            first_name: first_name.into(),
            last_name: last_name.into(),
            company_domain: company_domain.into(),
            passthrough: FlatRecord::default(),
        }
    }

    pub fn from_row(row: &InputRow) -> Self {
        let passthrough = row
            .fields
            .iter()
            .filter(|(column, _)| !REQUIRED_LEAD_COLUMNS.contains(column))
            .collect();
        Self {
            row: row.index,
            first_name: row.get(FIRST_NAME_COLUMN).to_string(),
            last_name: row.get(LAST_NAME_COLUMN).to_string(),
            company_domain: row.get(COMPANY_DOMAIN_COLUMN).to_string(),
            passthrough,
        }
    }
}

/// A lead whose required fields are present and whose domain has been normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLead {
    pub first_name: String,
    pub last_name: String,
    pub domain: String,
    pub original: Lead,
}

/// An alternate spelling of a person's name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameVariant {
    pub first: String,
    pub last: String,
}

impl NameVariant {
    pub fn new(first: impl Into<String>, last: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            last: last.into(),
        }
    }
}

/// Quality ranking of a verification, ordered `Invalid < Risky < Safe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    Invalid,
    Risky,
    Safe,
}

impl Reachability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reachability::Invalid => "invalid",
            Reachability::Risky => "risky",
            Reachability::Safe => "safe",
        }
    }
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat, normalized outcome of checking one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub reachability: Reachability,
    /// Whether the mailbox accepted the recipient during the SMTP probe.
    pub smtp_deliverable: bool,
    pub is_disposable: bool,
    pub is_role_account: bool,
    pub mx_records: Vec<String>,
    /// Set when the check itself failed (network error, non-2xx, bad body).
    pub raw_error: Option<String>,
}

impl VerificationResult {
    /// The synthetic result an oracle hands back when it could not perform the check.
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            reachability: Reachability::Invalid,
            smtp_deliverable: false,
            is_disposable: false,
            is_role_account: false,
            mx_records: Vec::new(),
            raw_error: Some(message.into()),
        }
    }

    /// A hit needs a deliverable mailbox and a non-invalid ranking.
    pub fn is_hit(&self) -> bool {
        self.smtp_deliverable && self.reachability != Reachability::Invalid
    }
}

/// Result of searching one lead's candidate list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub best_candidate: Option<String>,
    pub best_result: Option<VerificationResult>,
    pub patterns_tested: usize,
    /// Deliverable candidates observed, whether or not one was kept.
    pub patterns_hit: usize,
}

impl SearchOutcome {
    pub const NONE_FOUND: &'static str = "none_found";

    /// `none_found` when nothing was kept, else the kept result's reachability.
    pub fn validation_status(&self) -> &'static str {
        match (&self.best_candidate, &self.best_result) {
            (Some(_), Some(result)) => result.reachability.as_str(),
            _ => Self::NONE_FOUND,
        }
    }
}

/// Output columns of the email pipeline, before passthrough columns.
pub const ENRICHED_LEAD_COLUMNS: [&str; 12] = [
    "first_name",
    "last_name",
    "company_domain",
    "validated_email",
    "validation_status",
    "is_reachable",
    "is_reachable_smtp",
    "is_disposable",
    "is_role_account",
    "mx_records",
    "patterns_tested",
    "patterns_validated",
];

/// Leading columns of the exported file. `mx_records` is left
/// out so it follows right after this block, ahead of passthrough columns.
pub const EXPORT_PRIORITY_COLUMNS: [&str; 11] = [
    "first_name",
    "last_name",
    "company_domain",
    "validated_email",
    "validation_status",
    "is_reachable",
    "is_reachable_smtp",
    "is_disposable",
    "is_role_account",
    "patterns_tested",
    "patterns_validated",
];

/// A lead together with the outcome of its search.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedLead {
    pub lead: ValidatedLead,
    pub outcome: SearchOutcome,
}

impl EnrichedLead {
    pub fn validated_email(&self) -> Option<&str> {
        self.outcome.best_candidate.as_deref()
    }

    pub fn to_record(&self) -> FlatRecord {
        let best = self.outcome.best_result.as_ref();
        let flag = |value: bool| value.to_string();

        let mut record = FlatRecord::default();
        record.insert("first_name", self.lead.first_name.as_str());
        record.insert("last_name", self.lead.last_name.as_str());
        record.insert("company_domain", self.lead.original.company_domain.trim());
        record.insert("validated_email", self.validated_email().unwrap_or(""));
        record.insert("validation_status", self.outcome.validation_status());
        record.insert(
            "is_reachable",
            best.map(|r| r.reachability.as_str()).unwrap_or(""),
        );
        record.insert(
            "is_reachable_smtp",
            flag(best.is_some_and(|r| r.smtp_deliverable)),
        );
        record.insert("is_disposable", flag(best.is_some_and(|r| r.is_disposable)));
        record.insert(
            "is_role_account",
            flag(best.is_some_and(|r| r.is_role_account)),
        );
        record.insert(
            "mx_records",
            best.map(|r| r.mx_records.join(", ")).unwrap_or_default(),
        );
        record.insert("patterns_tested", self.outcome.patterns_tested.to_string());
        record.insert("patterns_validated", self.outcome.patterns_hit.to_string());

        for (column, value) in self.lead.original.passthrough.iter() {
            if record.get(column).is_none() {
                record.insert(column, value);
            }
        }
        record
    }
}

/// What happened to one input lead.
#[derive(Debug, Clone, PartialEq)]
pub enum LeadOutcome {
    Enriched(EnrichedLead),
    Skipped { lead: Lead, reason: String },
}

impl LeadOutcome {
    pub fn enriched(&self) -> Option<&EnrichedLead> {
        match self {
            LeadOutcome::Enriched(enriched) => Some(enriched),
            LeadOutcome::Skipped { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn safe_result() -> VerificationResult {
        VerificationResult {
            reachability: Reachability::Safe,
            smtp_deliverable: true,
            is_disposable: false,
            is_role_account: true,
            mx_records: vec!["mx1.acme.com.".into(), "mx2.acme.com.".into()],
            raw_error: None,
        }
    }

    fn validated(lead: Lead) -> ValidatedLead {
        ValidatedLead {
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            domain: lead.company_domain.clone(),
            original: lead,
        }
    }

    #[test]
    fn test_reachability_ordering() {
        assert!(Reachability::Safe > Reachability::Risky);
        assert!(Reachability::Risky > Reachability::Invalid);
    }

    #[test]
    fn test_hit_requires_deliverable_and_not_invalid() {
        assert!(safe_result().is_hit());

        let mut undeliverable = safe_result();
        undeliverable.smtp_deliverable = false;
        assert!(!undeliverable.is_hit());

        let mut invalid = safe_result();
        invalid.reachability = Reachability::Invalid;
        assert!(!invalid.is_hit());

        assert!(!VerificationResult::transport_failure("timeout").is_hit());
    }

    #[test]
    fn test_validation_status_mapping() {
        assert_eq!(SearchOutcome::default().validation_status(), "none_found");
        let outcome = SearchOutcome {
            best_candidate: Some("john@acme.com".into()),
            best_result: Some(safe_result()),
            patterns_tested: 1,
            patterns_hit: 1,
        };
        assert_eq!(outcome.validation_status(), "safe");
    }

    #[test]
    fn test_record_for_found_email() {
        let mut lead = Lead::new("John", "Smith", "acme.com");
        lead.passthrough.insert("title", "CTO");
        let enriched = EnrichedLead {
            lead: validated(lead),
            outcome: SearchOutcome {
                best_candidate: Some("john@acme.com".into()),
                best_result: Some(safe_result()),
                patterns_tested: 3,
                patterns_hit: 2,
            },
        };

        let record = enriched.to_record();
        let columns: Vec<&str> = record.columns().collect();
        let mut expected: Vec<&str> = ENRICHED_LEAD_COLUMNS.to_vec();
        expected.push("title");
        assert_eq!(columns, expected);

        assert_eq!(record.get("validated_email"), Some("john@acme.com"));
        assert_eq!(record.get("validation_status"), Some("safe"));
        assert_eq!(record.get("is_reachable"), Some("safe"));
        assert_eq!(record.get("is_reachable_smtp"), Some("true"));
        assert_eq!(record.get("is_role_account"), Some("true"));
        assert_eq!(record.get("mx_records"), Some("mx1.acme.com., mx2.acme.com."));
        assert_eq!(record.get("patterns_tested"), Some("3"));
        assert_eq!(record.get("patterns_validated"), Some("2"));
        assert_eq!(record.get("title"), Some("CTO"));
    }

    #[test]
    fn test_record_keeps_input_domain() {
        let lead = Lead::new("John", "Smith", " https://www.Acme.com/team ");
        let enriched = EnrichedLead {
            lead: ValidatedLead {
                first_name: "John".into(),
                last_name: "Smith".into(),
                domain: "acme.com".into(),
                original: lead,
            },
            outcome: SearchOutcome::default(),
        };
        assert_eq!(
            enriched.to_record().get("company_domain"),
            Some("https://www.Acme.com/team")
        );
    }

    #[test]
    fn test_record_for_nothing_found() {
        let enriched = EnrichedLead {
            lead: validated(Lead::new("Ann", "Lee", "lee.io")),
            outcome: SearchOutcome {
                patterns_tested: 9,
                patterns_hit: 1,
                ..SearchOutcome::default()
            },
        };
        let record = enriched.to_record();
        assert_eq!(record.get("validated_email"), Some(""));
        assert_eq!(record.get("validation_status"), Some("none_found"));
        assert_eq!(record.get("is_reachable"), Some(""));
        assert_eq!(record.get("is_reachable_smtp"), Some("false"));
        assert_eq!(record.get("mx_records"), Some(""));
        assert_eq!(record.get("patterns_validated"), Some("1"));
    }
}
