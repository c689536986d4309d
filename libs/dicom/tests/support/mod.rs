#![allow(dead_code)]

//! Byte-level DICOM writer for building test buffers.

pub const UNDEFINED: u32 = 0xFFFF_FFFF;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    ExplicitLittle,
    ExplicitBig,
    ImplicitLittle,
}

pub struct DicomWriter {
    buf: Vec<u8>,
    syntax: Syntax,
}

impl DicomWriter {
    pub fn new(syntax: Syntax) -> Self {
        Self {
            buf: Vec::new(),
            syntax,
        }
    }

    pub fn explicit_le() -> Self {
        Self::new(Syntax::ExplicitLittle)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.buf.clone()
    }

    fn u16(&mut self, value: u16) {
        match self.syntax {
            Syntax::ExplicitBig => self.buf.extend_from_slice(&value.to_be_bytes()),
            _ => self.buf.extend_from_slice(&value.to_le_bytes()),
        }
    }

    fn u32(&mut self, value: u32) {
        match self.syntax {
            Syntax::ExplicitBig => self.buf.extend_from_slice(&value.to_be_bytes()),
            _ => self.buf.extend_from_slice(&value.to_le_bytes()),
        }
    }

    fn tag(&mut self, group: u16, element: u16) {
        self.u16(group);
        self.u16(element);
    }

    fn header(&mut self, group: u16, element: u16, vr: &str, length: u32) {
        self.tag(group, element);
        if self.syntax == Syntax::ImplicitLittle {
            self.u32(length);
            return;
        }
        self.buf.extend_from_slice(vr.as_bytes());
        let short = matches!(
            vr,
            "AE" | "AS" | "AT" | "CS" | "DA" | "DS" | "DT" | "FD" | "FL" | "IS" | "LO" | "LT"
                | "PN" | "SH" | "SL" | "SS" | "ST" | "TM" | "UI" | "UL" | "US"
        );
        let long = !short;
        if long {
            self.u16(0);
            self.u32(length);
        } else {
            self.u16(length as u16);
        }
    }

    pub fn element(&mut self, group: u16, element: u16, vr: &str, value: &[u8]) -> &mut Self {
        self.header(group, element, vr, value.len() as u32);
        self.buf.extend_from_slice(value);
        self
    }

    /// Text value padded to even length with a space.
    pub fn text(&mut self, group: u16, element: u16, vr: &str, value: &str) -> &mut Self {
        let mut bytes = value.as_bytes().to_vec();
        if bytes.len() % 2 == 1 {
            bytes.push(if vr == "UI" { 0 } else { b' ' });
        }
        self.element(group, element, vr, &bytes)
    }

    pub fn us(&mut self, group: u16, element: u16, value: u16) -> &mut Self {
        let bytes = match self.syntax {
            Syntax::ExplicitBig => value.to_be_bytes(),
            _ => value.to_le_bytes(),
        };
        self.element(group, element, "US", &bytes)
    }

    /// Header only, declared with undefined length.
    pub fn undefined(&mut self, group: u16, element: u16, vr: &str) -> &mut Self {
        self.header(group, element, vr, UNDEFINED);
        self
    }

    pub fn sequence_start(&mut self, group: u16, element: u16, length: u32) -> &mut Self {
        self.header(group, element, "SQ", length);
        self
    }

    pub fn item_start(&mut self, length: u32) -> &mut Self {
        self.tag(0xFFFE, 0xE000);
        self.u32(length);
        self
    }

    pub fn item_end(&mut self) -> &mut Self {
        self.tag(0xFFFE, 0xE00D);
        self.u32(0);
        self
    }

    pub fn sequence_end(&mut self) -> &mut Self {
        self.tag(0xFFFE, 0xE0DD);
        self.u32(0);
        self
    }

    /// Defined-length sequence whose items are pre-encoded datasets.
    pub fn sequence_defined(&mut self, group: u16, element: u16, items: &[Vec<u8>]) -> &mut Self {
        let length: usize = items.iter().map(|item| 8 + item.len()).sum();
        self.sequence_start(group, element, length as u32);
        for item in items {
            self.item_start(item.len() as u32);
            self.buf.extend_from_slice(item);
        }
        self
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }
}

/// Part 10 file: 128-byte preamble, `DICM`, explicit VR LE meta group.
pub fn part10(transfer_syntax: &str, dataset: &[u8]) -> Vec<u8> {
    let mut meta = DicomWriter::explicit_le();
    meta.element(0x0002, 0x0001, "OB", &[0x00, 0x01]);
    meta.text(0x0002, 0x0010, "UI", transfer_syntax);

    let mut out = vec![0u8; 128];
    out.extend_from_slice(b"DICM");
    out.extend_from_slice(&meta.bytes());
    out.extend_from_slice(dataset);
    out
}

/// Minimal patient header shared by several tests.
pub fn patient_header(writer: &mut DicomWriter) -> &mut DicomWriter {
    writer
        .text(0x0010, 0x0010, "PN", "Doe^Jane")
        .text(0x0010, 0x0020, "LO", "PAT-001")
        .text(0x0010, 0x0030, "DA", "19800101")
        .text(0x0010, 0x0040, "CS", "F")
}
