//! DICOM decoding
//!
//! Decodes DICOM tag-length-value streams into an arena-backed element tree
//! and maps the patient/study header into a [`NormalizedRecord`]. Pixel data
//! is carried through as opaque bytes.
//!
//! # Example
//!
//! ```rust
//! use medbridge_dicom::parse_dicom;
//!
//! // (0010,0020) LO "P-1"
//! let bytes = [0x10, 0x00, 0x20, 0x00, b'L', b'O', 0x04, 0x00, b'P', b'-', b'1', b' '];
//! let record = parse_dicom(&bytes).unwrap();
//! assert_eq!(record.patients[0].identifier, "P-1");
//! ```

mod decoder;
pub mod dictionary;
mod normalize;
pub mod transfer;
pub mod tree;
pub mod vr;

pub use decoder::decode;
pub use normalize::normalize;
pub use transfer::TransferSyntax;
pub use tree::{DicomDataset, ElementId, ElementNode, RawElement, UNDEFINED_LENGTH};
pub use vr::{ValueKind, Vr};

use medbridge_record::{NormalizedRecord, ParseLimits, Result};

/// Decode and normalize with default [`ParseLimits`].
pub fn parse_dicom(bytes: &[u8]) -> Result<NormalizedRecord> {
    parse_dicom_with_limits(bytes, &ParseLimits::default())
}

pub fn parse_dicom_with_limits(bytes: &[u8], limits: &ParseLimits) -> Result<NormalizedRecord> {
    let dataset = decode(bytes, limits)?;
    Ok(normalize(&dataset))
}
