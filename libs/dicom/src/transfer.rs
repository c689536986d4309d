use medbridge_cursor::Endian;
use medbridge_record::{ParseError, Result};

pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1.99";
pub const EXPLICIT_VR_BIG_ENDIAN: &str = "1.2.840.10008.1.2.2";

/// Dataset encoding selected by `(0002,0010)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSyntax {
    ImplicitVrLittleEndian,
    ExplicitVrLittleEndian,
    ExplicitVrBigEndian,
    /// Compressed pixel data; the header is explicit VR little endian.
    Encapsulated,
}

impl TransferSyntax {
    pub fn from_uid(uid: &str) -> Result<Self> {
        match uid {
            IMPLICIT_VR_LITTLE_ENDIAN => Ok(Self::ImplicitVrLittleEndian),
            EXPLICIT_VR_LITTLE_ENDIAN => Ok(Self::ExplicitVrLittleEndian),
            EXPLICIT_VR_BIG_ENDIAN => Ok(Self::ExplicitVrBigEndian),
            DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN => Err(ParseError::UnsupportedTransferSyntax {
                uid: uid.to_string(),
            }),
            // JPEG, JPEG-LS, JPEG 2000, RLE, MPEG, ...
            other if other.starts_with("1.2.840.10008.1.2.") => Ok(Self::Encapsulated),
            other => Err(ParseError::UnsupportedTransferSyntax {
                uid: other.to_string(),
            }),
        }
    }

    pub fn explicit_vr(&self) -> bool {
        !matches!(self, Self::ImplicitVrLittleEndian)
    }

    pub fn endian(&self) -> Endian {
        match self {
            Self::ExplicitVrBigEndian => Endian::Big,
            _ => Endian::Little,
        }
    }
}
