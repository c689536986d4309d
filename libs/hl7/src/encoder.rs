use crate::delimiters::Delimiters;
use crate::escape::escape;
use crate::tree::{Field, Message, Segment};

/// Serialize a message with its declared delimiters.
///
/// Every segment, the last included, is terminated by `\r`.
pub fn encode(message: &Message) -> String {
    let mut out = String::new();
    for segment in &message.segments {
        encode_segment(segment, &message.delimiters, &mut out);
        out.push('\r');
    }
    out
}

fn encode_segment(segment: &Segment, delimiters: &Delimiters, out: &mut String) {
    out.push_str(&segment.name);
    let mut fields = segment.fields.iter();
    if segment.is_header() {
        // MSH-1 is the separator itself
        fields.next();
        out.push(delimiters.field);
        out.push_str(&delimiters.encoding_characters());
        fields.next();
    }
    for field in fields {
        out.push(delimiters.field);
        encode_field(field, delimiters, out);
    }
}

fn encode_field(field: &Field, delimiters: &Delimiters, out: &mut String) {
    for (r, repetition) in field.repetitions.iter().enumerate() {
        if r > 0 {
            out.push(delimiters.repetition);
        }
        for (c, component) in repetition.components.iter().enumerate() {
            if c > 0 {
                out.push(delimiters.component);
            }
            for (s, sub) in component.subcomponents.iter().enumerate() {
                if s > 0 {
                    out.push(delimiters.subcomponent);
                }
                match &sub.raw {
                    Some(raw) => out.push_str(raw),
                    None => out.push_str(&escape(&sub.value, delimiters)),
                }
            }
        }
    }
}
