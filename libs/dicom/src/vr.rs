//! Value representations
//!
//! Uses a compile-time perfect hash map (phf) from the two-character VR code
//! to its header layout and value kind.

use phf::phf_map;
use std::fmt;

/// How the bytes of a value are to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    UnsignedShort,
    UnsignedLong,
    SignedShort,
    SignedLong,
    Float,
    Double,
    AttributeTag,
    Sequence,
    Opaque,
}

#[derive(Debug, Clone, Copy)]
pub struct VrInfo {
    /// Explicit VR header uses 2 reserved bytes plus a 4-byte length.
    pub long_length: bool,
    pub kind: ValueKind,
}

static VR_TABLE: phf::Map<&'static str, VrInfo> = phf_map! {
    "AE" => VrInfo { long_length: false, kind: ValueKind::Text },
    "AS" => VrInfo { long_length: false, kind: ValueKind::Text },
    "AT" => VrInfo { long_length: false, kind: ValueKind::AttributeTag },
    "CS" => VrInfo { long_length: false, kind: ValueKind::Text },
    "DA" => VrInfo { long_length: false, kind: ValueKind::Text },
    "DS" => VrInfo { long_length: false, kind: ValueKind::Text },
    "DT" => VrInfo { long_length: false, kind: ValueKind::Text },
    "FD" => VrInfo { long_length: false, kind: ValueKind::Double },
    "FL" => VrInfo { long_length: false, kind: ValueKind::Float },
    "IS" => VrInfo { long_length: false, kind: ValueKind::Text },
    "LO" => VrInfo { long_length: false, kind: ValueKind::Text },
    "LT" => VrInfo { long_length: false, kind: ValueKind::Text },
    "PN" => VrInfo { long_length: false, kind: ValueKind::Text },
    "SH" => VrInfo { long_length: false, kind: ValueKind::Text },
    "SL" => VrInfo { long_length: false, kind: ValueKind::SignedLong },
    "SS" => VrInfo { long_length: false, kind: ValueKind::SignedShort },
    "ST" => VrInfo { long_length: false, kind: ValueKind::Text },
    "TM" => VrInfo { long_length: false, kind: ValueKind::Text },
    "UI" => VrInfo { long_length: false, kind: ValueKind::Text },
    "UL" => VrInfo { long_length: false, kind: ValueKind::UnsignedLong },
    "US" => VrInfo { long_length: false, kind: ValueKind::UnsignedShort },

    "OB" => VrInfo { long_length: true, kind: ValueKind::Opaque },
    "OD" => VrInfo { long_length: true, kind: ValueKind::Opaque },
    "OF" => VrInfo { long_length: true, kind: ValueKind::Opaque },
    "OL" => VrInfo { long_length: true, kind: ValueKind::Opaque },
    "OV" => VrInfo { long_length: true, kind: ValueKind::Opaque },
    "OW" => VrInfo { long_length: true, kind: ValueKind::Opaque },
    "SQ" => VrInfo { long_length: true, kind: ValueKind::Sequence },
    "SV" => VrInfo { long_length: true, kind: ValueKind::Opaque },
    "UC" => VrInfo { long_length: true, kind: ValueKind::Text },
    "UN" => VrInfo { long_length: true, kind: ValueKind::Opaque },
    "UR" => VrInfo { long_length: true, kind: ValueKind::Text },
    "UT" => VrInfo { long_length: true, kind: ValueKind::Text },
    "UV" => VrInfo { long_length: true, kind: ValueKind::Opaque },
};

/// Two-character value representation code as it appears on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vr(pub [u8; 2]);

impl Vr {
    pub const SQ: Vr = Vr(*b"SQ");
    pub const UN: Vr = Vr(*b"UN");

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("??")
    }

    pub fn info(&self) -> Option<&'static VrInfo> {
        std::str::from_utf8(&self.0)
            .ok()
            .and_then(|code| VR_TABLE.get(code))
    }

    pub fn is_known(&self) -> bool {
        self.info().is_some()
    }

    /// Unknown VRs use the long header layout, as new VRs in the standard do.
    pub fn has_long_length(&self) -> bool {
        self.info().map_or(true, |info| info.long_length)
    }

    pub fn kind(&self) -> ValueKind {
        self.info().map_or(ValueKind::Opaque, |info| info.kind)
    }
}

impl fmt::Debug for Vr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vr({})", self.as_str())
    }
}

impl fmt::Display for Vr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
