//! FHIR JSON ingestion
//!
//! Works on an already-parsed [`serde_json::Value`]: the tree is first
//! decoded into a flat [`FhirDocument`] (bundles unwrapped, references split
//! into type and id) and then mapped into a [`NormalizedRecord`].
//! References are never resolved here; that happens at validation time,
//! once every record of a set is visible.
//!
//! # Example
//!
//! ```rust
//! use medbridge_fhir::parse_fhir;
//! use serde_json::json;
//!
//! let record = parse_fhir(&json!({
//!     "resourceType": "Patient",
//!     "id": "p1",
//!     "gender": "female"
//! }))
//! .unwrap();
//! assert_eq!(record.patients[0].identifier, "p1");
//! ```

mod decode;
mod normalize;
pub mod reference;
pub mod resource;
pub mod temporal;

pub use decode::decode;
pub use normalize::normalize;
pub use reference::parse_reference;
pub use resource::{Coding, FhirDocument, FhirResource, FhirValue, ResourceKind};
pub use temporal::parse_fhir_temporal;

use medbridge_record::{NormalizedRecord, ParseLimits, Result};
use serde_json::Value;

/// Decode and normalize with default [`ParseLimits`].
pub fn parse_fhir(json: &Value) -> Result<NormalizedRecord> {
    parse_fhir_with_limits(json, &ParseLimits::default())
}

pub fn parse_fhir_with_limits(json: &Value, limits: &ParseLimits) -> Result<NormalizedRecord> {
    let document = decode(json, limits)?;
    normalize(&document)
}
