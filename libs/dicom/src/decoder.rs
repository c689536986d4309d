//! Tag-length-value decoding
//!
//! Nested sequences are tracked on an explicit frame stack instead of the
//! call stack. Each open sequence or item is one frame; a frame either ends
//! at a byte offset (defined length) or at its delimiter item (undefined
//! length). Every open frame counts toward the nesting cap of
//! [`ParseLimits`], as does every decoded node toward the element cap.
//!
//! The value of a `UN` element with undefined length is decoded as implicit
//! VR little endian whatever the dataset's transfer syntax, so each frame
//! carries the syntax its content is encoded in.

use crate::dictionary::{implicit_vr, tags};
use crate::transfer::TransferSyntax;
use crate::tree::{DicomDataset, ElementId, ElementNode, RawElement, UNDEFINED_LENGTH};
use crate::vr::Vr;
use medbridge_cursor::{ByteCursor, Endian};
use medbridge_record::{ParseError, ParseIssue, ParseLimits, Result, Tag};

const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8; 4] = b"DICM";
const META_GROUP: u16 = 0x0002;

/// Decode a DICOM buffer into an element tree.
///
/// Accepts a full Part 10 file (128-byte preamble + `DICM`), a file whose
/// preamble was stripped (`DICM` at offset 0), or a bare explicit VR little
/// endian dataset.
pub fn decode(bytes: &[u8], limits: &ParseLimits) -> Result<DicomDataset> {
    tracing::debug!(len = bytes.len(), "decoding DICOM buffer");
    let dataset = Decoder::new(bytes, limits).run()?;
    tracing::debug!(
        elements = dataset.node_count(),
        issues = dataset.issues.len(),
        "decoded DICOM dataset"
    );
    Ok(dataset)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    /// Children are items. Fragment sequences hold encapsulated pixel data.
    Sequence { fragments: bool },
    Item,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: ElementId,
    kind: FrameKind,
    /// Offset one past the last content byte; `None` until a delimiter.
    end: Option<usize>,
    /// Encoding of the frame's content.
    syntax: TransferSyntax,
}

struct Decoder<'a> {
    bytes: &'a [u8],
    cursor: ByteCursor<'a>,
    limits: &'a ParseLimits,
    syntax: TransferSyntax,
    nodes: Vec<ElementNode>,
    roots: Vec<ElementId>,
    stack: Vec<Frame>,
    issues: Vec<ParseIssue>,
}

impl<'a> Decoder<'a> {
    fn new(bytes: &'a [u8], limits: &'a ParseLimits) -> Self {
        Self {
            bytes,
            cursor: ByteCursor::new(bytes, Endian::Little),
            limits,
            syntax: TransferSyntax::ExplicitVrLittleEndian,
            nodes: Vec::new(),
            roots: Vec::new(),
            stack: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn run(mut self) -> Result<DicomDataset> {
        if let Some(meta_start) = meta_start(self.bytes) {
            self.cursor.skip(meta_start)?;
            self.read_file_meta()?;
        }

        loop {
            self.close_finished_frames()?;
            if self.cursor.is_at_end() {
                break;
            }
            let offset = self.cursor.position();
            let tag = self.read_tag()?;
            match self.stack.last().map(|frame| frame.kind) {
                Some(FrameKind::Sequence { fragments }) => {
                    self.sequence_entry(tag, offset, fragments)?
                }
                Some(FrameKind::Item) if tag.group() == 0xFFFE => {
                    self.close_delimited(tag, offset)?
                }
                _ if tag.group() == 0xFFFE => {
                    return Err(ParseError::MalformedSequence {
                        tag,
                        offset,
                        reason: "delimiter outside of any sequence".into(),
                    })
                }
                _ => self.read_element(tag, offset)?,
            }
        }

        self.recover_unterminated();

        Ok(DicomDataset {
            nodes: self.nodes,
            roots: self.roots,
            transfer_syntax: self.syntax,
            issues: self.issues,
        })
    }

    /// Group 0002 is always explicit VR little endian and never nests.
    fn read_file_meta(&mut self) -> Result<()> {
        while !self.cursor.is_at_end() && self.cursor.peek_u16()? == META_GROUP {
            let offset = self.cursor.position();
            let tag = self.read_tag()?;
            let (vr, length) = self.read_header(tag, offset)?;
            if vr == Vr::SQ || length == UNDEFINED_LENGTH {
                return Err(ParseError::MalformedSequence {
                    tag,
                    offset,
                    reason: "sequence in file meta group".into(),
                });
            }
            let value = self.cursor.read_bytes(length as usize)?.to_vec();
            self.attach(RawElement {
                tag,
                vr: Some(vr),
                length,
                offset,
                value,
            })?;
        }

        if let Some(uid) = self
            .roots
            .iter()
            .map(|id| &self.nodes[id.0].element)
            .find(|element| element.tag == tags::TRANSFER_SYNTAX_UID)
            .map(RawElement::text)
        {
            self.syntax = TransferSyntax::from_uid(&uid)?;
            self.cursor.set_endian(self.syntax.endian());
            tracing::debug!(transfer_syntax = %uid, "file meta read");
        }
        Ok(())
    }

    fn read_tag(&mut self) -> Result<Tag> {
        let group = self.cursor.read_u16()?;
        let element = self.cursor.read_u16()?;
        Ok(Tag(group, element))
    }

    /// VR and declared length following a tag.
    fn read_header(&mut self, tag: Tag, offset: usize) -> Result<(Vr, u32)> {
        let explicit = self.active_syntax().explicit_vr() || tag.group() == META_GROUP;
        if !explicit {
            let length = self.cursor.read_u32()?;
            return Ok((implicit_vr(tag), length));
        }

        let vr = Vr(self.cursor.read_array::<2>()?);
        if !vr.is_known() {
            tracing::warn!(%tag, vr = %vr, offset, "unknown value representation");
            self.issues.push(ParseIssue::UnknownValueRepresentation {
                tag,
                vr: vr.as_str().to_string(),
                offset,
            });
        }
        let length = if vr.has_long_length() {
            self.cursor.skip(2)?;
            self.cursor.read_u32()?
        } else {
            u32::from(self.cursor.read_u16()?)
        };
        Ok((vr, length))
    }

    fn read_element(&mut self, tag: Tag, offset: usize) -> Result<()> {
        let (vr, length) = self.read_header(tag, offset)?;
        let undefined = length == UNDEFINED_LENGTH;

        let syntax = self.active_syntax();
        if vr == Vr::SQ || (undefined && (vr == Vr::UN || !syntax.explicit_vr())) {
            let end = self.content_end(length)?;
            let node = self.attach(RawElement {
                tag,
                vr: Some(vr),
                length,
                offset,
                value: Vec::new(),
            })?;
            let content = if vr == Vr::UN && undefined {
                TransferSyntax::ImplicitVrLittleEndian
            } else {
                syntax
            };
            return self.open(node, FrameKind::Sequence { fragments: false }, end, content);
        }

        if undefined {
            // encapsulated pixel data: fragments up to a sequence delimiter
            let node = self.attach(RawElement {
                tag,
                vr: Some(vr),
                length,
                offset,
                value: Vec::new(),
            })?;
            return self.open(node, FrameKind::Sequence { fragments: true }, None, syntax);
        }

        let value = self.cursor.read_bytes(length as usize)?.to_vec();
        self.attach(RawElement {
            tag,
            vr: Some(vr),
            length,
            offset,
            value,
        })?;
        Ok(())
    }

    /// Inside a sequence only items and the sequence delimiter may appear.
    fn sequence_entry(&mut self, tag: Tag, offset: usize, fragments: bool) -> Result<()> {
        if tag == tags::SEQUENCE_DELIMITATION {
            return self.close_delimited(tag, offset);
        }
        if tag != tags::ITEM {
            let sequence = self.current_frame_tag();
            return Err(ParseError::MalformedSequence {
                tag: sequence,
                offset,
                reason: format!("expected item, found {tag}"),
            });
        }

        let length = self.cursor.read_u32()?;
        if fragments {
            if length == UNDEFINED_LENGTH {
                return Err(ParseError::MalformedSequence {
                    tag: self.current_frame_tag(),
                    offset,
                    reason: "pixel data fragment with undefined length".into(),
                });
            }
            let value = self.cursor.read_bytes(length as usize)?.to_vec();
            self.attach(RawElement {
                tag,
                vr: None,
                length,
                offset,
                value,
            })?;
            return Ok(());
        }

        let end = self.content_end(length)?;
        let node = self.attach(RawElement {
            tag,
            vr: None,
            length,
            offset,
            value: Vec::new(),
        })?;
        let syntax = self.active_syntax();
        self.open(node, FrameKind::Item, end, syntax)
    }

    /// Consume a delimiter item and close the frame it terminates.
    fn close_delimited(&mut self, tag: Tag, offset: usize) -> Result<()> {
        let length = self.cursor.read_u32()?;
        let expected = match self.stack.last().map(|frame| frame.kind) {
            Some(FrameKind::Item) => tags::ITEM_DELIMITATION,
            _ => tags::SEQUENCE_DELIMITATION,
        };
        let defined = self.stack.last().and_then(|frame| frame.end).is_some();
        if tag != expected || defined || length != 0 {
            return Err(ParseError::MalformedSequence {
                tag: self.current_frame_tag(),
                offset,
                reason: format!("unexpected delimiter {tag}"),
            });
        }
        self.pop();
        Ok(())
    }

    /// Pop frames whose defined length has been fully consumed.
    fn close_finished_frames(&mut self) -> Result<()> {
        while let Some(frame) = self.stack.last() {
            let Some(end) = frame.end else { break };
            let position = self.cursor.position();
            if position < end {
                break;
            }
            if position > end {
                return Err(ParseError::MalformedSequence {
                    tag: self.nodes[frame.node.0].element.tag,
                    offset: position,
                    reason: format!("content overruns declared end {end}"),
                });
            }
            self.pop();
        }
        Ok(())
    }

    fn content_end(&self, length: u32) -> Result<Option<usize>> {
        if length == UNDEFINED_LENGTH {
            return Ok(None);
        }
        let len = self.cursor.len();
        let position = self.cursor.position();
        let truncated = ParseError::UnexpectedEndOfInput {
            offset: len,
            needed: (length as usize).saturating_sub(len - position),
        };
        let end = usize::try_from(length)
            .ok()
            .and_then(|length| position.checked_add(length))
            .ok_or_else(|| truncated.clone())?;
        if end > len {
            return Err(truncated);
        }
        Ok(Some(end))
    }

    /// Syntax of the innermost open frame, or the dataset's own.
    fn active_syntax(&self) -> TransferSyntax {
        self.stack
            .last()
            .map(|frame| frame.syntax)
            .unwrap_or(self.syntax)
    }

    fn open(
        &mut self,
        node: ElementId,
        kind: FrameKind,
        end: Option<usize>,
        syntax: TransferSyntax,
    ) -> Result<()> {
        self.limits.check_depth(self.stack.len() + 1)?;
        self.stack.push(Frame {
            node,
            kind,
            end,
            syntax,
        });
        self.cursor.set_endian(syntax.endian());
        Ok(())
    }

    fn pop(&mut self) {
        self.stack.pop();
        self.cursor.set_endian(self.active_syntax().endian());
    }

    fn attach(&mut self, element: RawElement) -> Result<ElementId> {
        self.limits.check_elements(self.nodes.len() + 1)?;
        let id = ElementId(self.nodes.len());
        let parent = self.stack.last().map(|frame| frame.node);
        self.nodes.push(ElementNode {
            element,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    fn current_frame_tag(&self) -> Tag {
        self.stack
            .last()
            .map(|frame| self.nodes[frame.node.0].element.tag)
            .unwrap_or(tags::ITEM)
    }

    /// Input ended inside undefined-length frames. The outermost unterminated
    /// sequence element is dropped with everything decoded inside it; its
    /// preceding siblings are kept.
    fn recover_unterminated(&mut self) {
        let Some(index) = self.stack.iter().position(|frame| frame.end.is_none()) else {
            return;
        };
        let frame = self.stack[index];
        let sequence = match frame.kind {
            FrameKind::Item => self.nodes[frame.node.0].parent.unwrap_or(frame.node),
            FrameKind::Sequence { .. } => frame.node,
        };
        let element = &self.nodes[sequence.0].element;
        let (tag, offset) = (element.tag, element.offset);
        tracing::warn!(%tag, offset, "sequence never terminated, dropping element");
        self.issues
            .push(ParseIssue::MalformedSequence { tag, offset });

        // every node created after the sequence opened is one of its descendants
        let parent = self.nodes[sequence.0].parent;
        self.nodes.truncate(sequence.0);
        match parent {
            Some(parent) => self.nodes[parent.0].children.retain(|id| *id != sequence),
            None => self.roots.retain(|id| *id != sequence),
        }
        self.stack.clear();
    }
}

/// Offset where the file meta group starts, if the buffer carries the magic.
fn meta_start(bytes: &[u8]) -> Option<usize> {
    if bytes.get(PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()) == Some(&MAGIC[..]) {
        return Some(PREAMBLE_LEN + MAGIC.len());
    }
    if bytes.starts_with(MAGIC) {
        return Some(MAGIC.len());
    }
    None
}
