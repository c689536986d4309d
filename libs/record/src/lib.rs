//! Normalized clinical records
//!
//! The unification target of every source-format parser. DICOM studies,
//! HL7 v2 messages and FHIR bundles all decode into a [`NormalizedRecord`]
//! holding owned, format-independent `Patient`, `Encounter` and
//! `Observation` entities.
//!
//! # Module Organization
//!
//! - `model`: entity types, references and the record container
//! - `temporal`: dates and timestamps as decoded from any source
//! - `error`: the fatal [`ParseError`] and non-fatal [`ParseIssue`] tiers
//! - `limits`: resource caps applied by every parser
//!
//! # Example
//!
//! ```rust
//! use medbridge_record::{NormalizedRecord, Patient, Sex, SourceFormat};
//!
//! let mut record = NormalizedRecord::new(SourceFormat::Hl7v2);
//! record.patients.push(Patient {
//!     sex: Some(Sex::Female),
//!     ..Patient::new("12345")
//! });
//! assert_eq!(record.entity_count(), 1);
//! ```

pub mod error;
pub mod limits;
pub mod model;
pub mod temporal;

pub use error::{ParseError, ParseIssue, Result, Tag};
pub use limits::ParseLimits;
pub use model::*;
pub use temporal::Temporal;
