use crate::error::{ParseError, Result};
use serde::{Deserialize, Serialize};

/// Caps that keep every decode terminating in bounded memory, even on
/// adversarial input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseLimits {
    /// Maximum nesting of DICOM sequences/items and FHIR bundles.
    pub max_depth: usize,
    /// Maximum DICOM element nodes or FHIR resources per call.
    pub max_elements: usize,
    /// Maximum HL7 segments per message.
    pub max_segments: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_depth: 16,
            max_elements: 100_000,
            max_segments: 10_000,
        }
    }
}

impl ParseLimits {
    pub fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(ParseError::ResourceLimitExceeded {
                limit: "nesting levels",
                max: self.max_depth,
            });
        }
        Ok(())
    }

    pub fn check_elements(&self, count: usize) -> Result<()> {
        if count > self.max_elements {
            return Err(ParseError::ResourceLimitExceeded {
                limit: "elements",
                max: self.max_elements,
            });
        }
        Ok(())
    }

    pub fn check_segments(&self, count: usize) -> Result<()> {
        if count > self.max_segments {
            return Err(ParseError::ResourceLimitExceeded {
                limit: "segments",
                max: self.max_segments,
            });
        }
        Ok(())
    }
}
