//! Error types shared by all source-format parsers
//!
//! Two tiers: a [`ParseError`] aborts a single parse call and never leaves a
//! partial record behind; a [`ParseIssue`] is recorded on the record and
//! decoding carries on.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ParseError>;

/// DICOM data element tag (group, element).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag(pub u16, pub u16);

impl Tag {
    pub const fn group(self) -> u16 {
        self.0
    }

    pub const fn element(self) -> u16 {
        self.1
    }

    /// Key used in audit maps, `GGGG,EEEE`.
    pub fn key(self) -> String {
        format!("{:04X},{:04X}", self.0, self.1)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.0, self.1)
    }
}

/// Structural decode failures. Fatal to the parse call that produced them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected end of input at offset {offset} ({needed} more bytes needed)")]
    UnexpectedEndOfInput { offset: usize, needed: usize },

    #[error("missing required segment {segment}: {reason}")]
    MissingRequiredSegment { segment: String, reason: String },

    #[error("malformed segment #{index}: {reason}")]
    MalformedSegment { index: usize, reason: String },

    #[error("malformed sequence {tag} at offset {offset}: {reason}")]
    MalformedSequence {
        tag: Tag,
        offset: usize,
        reason: String,
    },

    #[error("unsupported transfer syntax {uid}")]
    UnsupportedTransferSyntax { uid: String },

    #[error("{resource}: missing required field {field}")]
    MissingRequiredField { resource: String, field: String },

    #[error("{resource}: field {field} is not a valid {expected}")]
    TypeMismatch {
        resource: String,
        field: String,
        expected: &'static str,
    },

    #[error("resource limit exceeded: more than {max} {limit}")]
    ResourceLimitExceeded { limit: &'static str, max: usize },
}

/// Recoverable anomalies noticed while decoding. Carried on the record.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParseIssue {
    #[error("unknown value representation {vr:?} for {tag} at offset {offset}")]
    UnknownValueRepresentation { tag: Tag, vr: String, offset: usize },

    #[error("sequence {tag} at offset {offset} has no terminator; element dropped")]
    MalformedSequence { tag: Tag, offset: usize },

    #[error("malformed timestamp {value:?} at {location}")]
    MalformedTimestamp { location: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_formats_as_hex_pair() {
        let tag = Tag(0x0010, 0x0020);
        assert_eq!(tag.to_string(), "(0010,0020)");
        assert_eq!(tag.key(), "0010,0020");
        assert!(Tag(0x0008, 0xFFFF) < tag);
    }

    #[test]
    fn errors_carry_context_in_messages() {
        let err = ParseError::UnexpectedEndOfInput {
            offset: 12,
            needed: 4,
        };
        assert_eq!(
            err.to_string(),
            "unexpected end of input at offset 12 (4 more bytes needed)"
        );

        let err = ParseError::MalformedSequence {
            tag: Tag(0x0040, 0xA730),
            offset: 200,
            reason: "expected item".into(),
        };
        assert!(err.to_string().contains("(0040,A730)"));
    }
}
