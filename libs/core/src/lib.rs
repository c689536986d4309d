//! medbridge core
//!
//! Entry points for turning DICOM bytes, HL7 v2 text and FHIR JSON into
//! [`NormalizedRecord`]s, and for validating a set of records as one unit.
//!
//! A parser only fails on input it cannot decode at all ([`ParseError`]).
//! Every semantic problem is reported by [`validate`] as a [`Finding`], and
//! the caller decides what to do with a rejected set.
//!
//! Nothing here performs I/O or keeps global state, so calls may run
//! concurrently on independent inputs.
//!
//! # Example
//!
//! ```rust
//! use medbridge_core::{parse_hl7, validate};
//!
//! let record = parse_hl7("MSH|^~\\&|LAB|HOSP\rPID|1||12345^^^MRN||Doe^Jane||19800101|F\r")?;
//! let report = validate(&[record]);
//! assert!(report.accepted);
//! # Ok::<(), medbridge_core::ParseError>(())
//! ```
//!
//! # Module Organization
//!
//! - [`record`]: the normalized model, errors and limits
//! - [`dicom`], [`hl7`], [`fhir`]: per-format decoders and their trees
//! - [`validator`]: configuration, plans and reports

pub use medbridge_dicom as dicom;
pub use medbridge_fhir as fhir;
pub use medbridge_hl7 as hl7;
pub use medbridge_record as record;
pub use medbridge_validator as validator;

pub use medbridge_record::{
    Code, Encounter, EntityKind, EntityRef, HumanName, NormalizedRecord, Observation,
    ObservationValue, ParseError, ParseIssue, ParseLimits, Patient, Reference, Result, Sex,
    SourceFormat, Temporal,
};
pub use medbridge_validator::{
    ConfigError, Finding, FindingCode, Preset, Severity, ValidationReport, Validator,
    ValidatorConfig,
};

use serde_json::Value;

/// Decode a DICOM buffer (Part 10 file or bare dataset).
pub fn parse_dicom(bytes: &[u8]) -> Result<NormalizedRecord> {
    parse_dicom_with_limits(bytes, &ParseLimits::default())
}

pub fn parse_dicom_with_limits(bytes: &[u8], limits: &ParseLimits) -> Result<NormalizedRecord> {
    tracing::debug!(bytes = bytes.len(), "parsing DICOM");
    medbridge_dicom::parse_dicom_with_limits(bytes, limits)
}

/// Decode an HL7 v2 message.
pub fn parse_hl7(text: &str) -> Result<NormalizedRecord> {
    parse_hl7_with_limits(text, &ParseLimits::default())
}

pub fn parse_hl7_with_limits(text: &str, limits: &ParseLimits) -> Result<NormalizedRecord> {
    tracing::debug!(chars = text.len(), "parsing HL7 v2");
    medbridge_hl7::parse_hl7_with_limits(text, limits)
}

/// Map an already-parsed FHIR JSON tree (resource or bundle).
pub fn parse_fhir(json: &Value) -> Result<NormalizedRecord> {
    parse_fhir_with_limits(json, &ParseLimits::default())
}

pub fn parse_fhir_with_limits(json: &Value, limits: &ParseLimits) -> Result<NormalizedRecord> {
    tracing::debug!("parsing FHIR JSON");
    medbridge_fhir::parse_fhir_with_limits(json, limits)
}

/// Validate a record set with the default (`Ingestion`) rules.
pub fn validate(records: &[NormalizedRecord]) -> ValidationReport {
    medbridge_validator::validate(records)
}

/// Validate with an explicit configuration.
///
/// Fails only when the configuration itself does not compile. Callers
/// validating many sets should build a [`Validator`] once instead.
pub fn validate_with(
    config: &ValidatorConfig,
    records: &[NormalizedRecord],
) -> std::result::Result<ValidationReport, ConfigError> {
    Ok(Validator::from_config(config)?.validate(records))
}
