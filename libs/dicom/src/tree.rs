//! Decoded element tree
//!
//! Elements live in a flat arena indexed by [`ElementId`]; every node keeps
//! its parent index and ordered children. Sequence items are nodes tagged
//! `(FFFE,E000)` whose children are the item's elements.

use crate::transfer::TransferSyntax;
use crate::vr::{ValueKind, Vr};
use medbridge_cursor::Endian;
use medbridge_record::{ParseIssue, Tag};

/// Length field value marking a sequence or item closed by a delimiter.
pub const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    pub tag: Tag,
    /// `None` for sequence items, which carry no VR on the wire.
    pub vr: Option<Vr>,
    /// Length as declared in the header, possibly [`UNDEFINED_LENGTH`].
    pub length: u32,
    /// Offset of the tag's first byte.
    pub offset: usize,
    pub value: Vec<u8>,
}

impl RawElement {
    pub fn has_undefined_length(&self) -> bool {
        self.length == UNDEFINED_LENGTH
    }

    /// Value as text with DICOM space/NUL padding removed.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.value)
            .trim_matches(|c: char| c == ' ' || c == '\0')
            .to_string()
    }

    /// First of a backslash-separated multi-value.
    pub fn first_text(&self) -> Option<String> {
        let text = self.text();
        let first = text.split('\\').next().unwrap_or_default().trim();
        if first.is_empty() {
            None
        } else {
            Some(first.to_string())
        }
    }

    /// Binary numeric values rendered in source byte order.
    pub fn numbers(&self, endian: Endian) -> Option<Vec<String>> {
        let kind = self.vr?.kind();
        let width = match kind {
            ValueKind::UnsignedShort | ValueKind::SignedShort => 2,
            ValueKind::UnsignedLong
            | ValueKind::SignedLong
            | ValueKind::Float
            | ValueKind::AttributeTag => 4,
            ValueKind::Double => 8,
            _ => return None,
        };
        let rendered = self
            .value
            .chunks_exact(width)
            .map(|chunk| render_number(kind, chunk, endian))
            .collect();
        Some(rendered)
    }
}

fn render_number(kind: ValueKind, chunk: &[u8], endian: Endian) -> String {
    let mut raw = [0u8; 8];
    raw[..chunk.len()].copy_from_slice(chunk);
    let [b0, b1, b2, b3, b4, b5, b6, b7] = raw;
    let two = [b0, b1];
    let four = [b0, b1, b2, b3];
    let eight = [b0, b1, b2, b3, b4, b5, b6, b7];
    let little = endian == Endian::Little;
    match kind {
        ValueKind::UnsignedShort if little => u16::from_le_bytes(two).to_string(),
        ValueKind::UnsignedShort => u16::from_be_bytes(two).to_string(),
        ValueKind::SignedShort if little => i16::from_le_bytes(two).to_string(),
        ValueKind::SignedShort => i16::from_be_bytes(two).to_string(),
        ValueKind::UnsignedLong if little => u32::from_le_bytes(four).to_string(),
        ValueKind::UnsignedLong => u32::from_be_bytes(four).to_string(),
        ValueKind::SignedLong if little => i32::from_le_bytes(four).to_string(),
        ValueKind::SignedLong => i32::from_be_bytes(four).to_string(),
        ValueKind::Float if little => f32::from_le_bytes(four).to_string(),
        ValueKind::Float => f32::from_be_bytes(four).to_string(),
        ValueKind::Double if little => f64::from_le_bytes(eight).to_string(),
        ValueKind::Double => f64::from_be_bytes(eight).to_string(),
        ValueKind::AttributeTag => {
            let (group, element) = if little {
                (u16::from_le_bytes(two), u16::from_le_bytes([b2, b3]))
            } else {
                (u16::from_be_bytes(two), u16::from_be_bytes([b2, b3]))
            };
            Tag(group, element).to_string()
        }
        _ => hex::encode(chunk),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub element: RawElement,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
}

/// Everything one decode pass produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DicomDataset {
    pub(crate) nodes: Vec<ElementNode>,
    pub(crate) roots: Vec<ElementId>,
    pub(crate) transfer_syntax: TransferSyntax,
    pub(crate) issues: Vec<ParseIssue>,
}

impl DicomDataset {
    pub fn transfer_syntax(&self) -> TransferSyntax {
        self.transfer_syntax
    }

    pub fn issues(&self) -> &[ParseIssue] {
        &self.issues
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: ElementId) -> &ElementNode {
        &self.nodes[id.0]
    }

    pub fn element(&self, id: ElementId) -> &RawElement {
        &self.nodes[id.0].element
    }

    /// Top-level elements (file meta group included) in stream order.
    pub fn roots(&self) -> &[ElementId] {
        &self.roots
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        &self.nodes[id.0].children
    }

    pub fn find(&self, tag: Tag) -> Option<&RawElement> {
        self.roots
            .iter()
            .map(|id| self.element(*id))
            .find(|element| element.tag == tag)
    }

    pub fn find_id(&self, tag: Tag) -> Option<ElementId> {
        self.roots
            .iter()
            .copied()
            .find(|id| self.element(*id).tag == tag)
    }

    /// Number of sequences/items between `id` and the top level.
    pub fn depth(&self, id: ElementId) -> usize {
        let mut depth = 0;
        let mut current = self.nodes[id.0].parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes[parent.0].parent;
        }
        depth
    }
}
