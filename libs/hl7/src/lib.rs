//! HL7 v2 decoding
//!
//! A message is split into a [`Message`] tree using the delimiters declared
//! in MSH, and PID / PV1 / OBX segments are mapped into a
//! [`NormalizedRecord`]. [`encode`] writes the tree back with the same
//! delimiters.
//!
//! # Example
//!
//! ```rust
//! use medbridge_hl7::parse_hl7;
//!
//! let record = parse_hl7("MSH|^~\\&|APP\rPID|1||12345^^^MRN||Doe^Jane||19800101|F\r").unwrap();
//! assert_eq!(record.patients[0].identifier, "12345");
//! ```

mod decoder;
pub mod delimiters;
mod encoder;
pub mod escape;
mod normalize;
pub mod timestamp;
pub mod tree;

pub use decoder::decode;
pub use delimiters::Delimiters;
pub use encoder::encode;
pub use normalize::normalize;
pub use timestamp::parse_timestamp;
pub use tree::{Component, Field, Message, Repetition, Segment, SubComponent};

use medbridge_record::{NormalizedRecord, ParseLimits, Result};

/// Decode and normalize with default [`ParseLimits`].
pub fn parse_hl7(text: &str) -> Result<NormalizedRecord> {
    parse_hl7_with_limits(text, &ParseLimits::default())
}

pub fn parse_hl7_with_limits(text: &str, limits: &ParseLimits) -> Result<NormalizedRecord> {
    let message = decode(text, limits)?;
    normalize(&message)
}
