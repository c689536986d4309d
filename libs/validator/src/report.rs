use medbridge_record::EntityRef;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Result of validating one record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// `true` when no finding has error severity.
    pub accepted: bool,
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn new(findings: Vec<Finding>) -> Self {
        Self {
            accepted: !findings.iter().any(|f| f.severity == Severity::Error),
            findings,
        }
    }

    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count()
    }

    pub fn findings_for<'a>(&'a self, entity: &'a EntityRef) -> impl Iterator<Item = &'a Finding> + 'a {
        self.findings.iter().filter(move |f| &f.entity == entity)
    }

    pub fn with_code(&self, code: FindingCode) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.code == code)
    }

    pub fn to_operation_outcome(&self) -> Value {
        serde_json::json!({
            "resourceType": "OperationOutcome",
            "issue": self.findings.iter().map(Finding::to_json).collect::<Vec<_>>()
        })
    }
}

/// Individual validation finding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub code: FindingCode,
    pub message: String,
    /// The entity the finding concerns.
    pub entity: EntityRef,
    /// Position of the entity in the validated set, e.g. `records[0].patients[1]`.
    pub location: Option<String>,
}

impl Finding {
    pub fn error(code: FindingCode, entity: EntityRef, message: String) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message,
            entity,
            location: None,
        }
    }

    pub fn warning(code: FindingCode, entity: EntityRef, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message,
            entity,
            location: None,
        }
    }

    pub fn with_location(mut self, location: String) -> Self {
        self.location = Some(location);
        self
    }

    fn to_json(&self) -> Value {
        let mut issue = serde_json::json!({
            "severity": self.severity.to_string(),
            "code": self.code.issue_type(),
            "details": { "text": self.code.as_str() },
            "diagnostics": self.message,
            "expression": [self.entity.to_string()],
        });

        if let Some(ref loc) = self.location {
            issue["location"] = serde_json::json!([loc]);
        }

        issue
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// Stable finding codes, one per rule outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingCode {
    RequiredField,
    UnresolvedReference,
    InvalidDate,
    FutureDate,
    PeriodOrder,
    NonFiniteValue,
    DuplicateIdentifier,
    RecommendedField,
}

impl FindingCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequiredField => "required-field",
            Self::UnresolvedReference => "unresolved-reference",
            Self::InvalidDate => "invalid-date",
            Self::FutureDate => "future-date",
            Self::PeriodOrder => "period-order",
            Self::NonFiniteValue => "non-finite-value",
            Self::DuplicateIdentifier => "duplicate-identifier",
            Self::RecommendedField => "recommended-field",
        }
    }

    /// FHIR `issue-type` used when rendering an OperationOutcome.
    pub fn issue_type(&self) -> &'static str {
        match self {
            Self::RequiredField => "required",
            Self::UnresolvedReference => "not-found",
            Self::InvalidDate | Self::NonFiniteValue => "value",
            Self::FutureDate | Self::PeriodOrder => "business-rule",
            Self::DuplicateIdentifier => "duplicate",
            Self::RecommendedField => "incomplete",
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
