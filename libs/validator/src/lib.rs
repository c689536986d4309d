//! Record-set validation
//!
//! One rule engine for every source format. A [`ValidatorConfig`] compiles
//! into a [`ValidationPlan`]; a [`Validator`] owns the plan and can be reused
//! for any number of record sets. Rules run in a fixed order (required
//! fields, references, values, duplicates, recommended fields) and every
//! rule always runs, so a report is complete in one pass.
//!
//! # Example
//!
//! ```rust
//! use medbridge_record::{EntityKind, NormalizedRecord, Observation, Reference, SourceFormat};
//! use medbridge_validator::{validate, FindingCode};
//!
//! let mut record = NormalizedRecord::new(SourceFormat::Fhir);
//! record
//!     .observations
//!     .push(Observation::new("o1", Some(Reference::to(EntityKind::Patient, "999"))));
//!
//! let report = validate(&[record]);
//! assert!(!report.accepted);
//! assert_eq!(report.with_code(FindingCode::UnresolvedReference).count(), 1);
//! ```

pub mod config;
pub mod error;
pub mod plan;
pub mod report;
pub mod steps;
pub mod validator;

pub use config::{Preset, QualityConfig, RecommendedField, ValidatorConfig, ValidatorConfigBuilder};
pub use error::ConfigError;
pub use plan::{QualityPlan, Step, ValidationPlan, ValuesPlan};
pub use report::{Finding, FindingCode, Severity, ValidationReport};
pub use validator::Validator;

use medbridge_record::NormalizedRecord;

/// Validate with the `Ingestion` preset.
pub fn validate(records: &[NormalizedRecord]) -> ValidationReport {
    Validator::default().validate(records)
}
