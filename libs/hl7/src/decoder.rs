use crate::delimiters::Delimiters;
use crate::escape::{escape, unescape};
use crate::tree::{Component, Field, Message, Repetition, Segment, SubComponent};
use medbridge_cursor::TokenStream;
use medbridge_record::{ParseError, ParseLimits, Result};

/// Split a message into segments and resolve every escape sequence.
///
/// Segments may end in `\r`, `\n` or `\r\n`; blank lines are skipped. The
/// first segment must be MSH.
pub fn decode(text: &str, limits: &ParseLimits) -> Result<Message> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = TokenStream::new(text);
    let mut segments = Vec::new();
    let mut delimiters: Option<Delimiters> = None;

    while let Some(line) = lines.next_line() {
        if line.trim().is_empty() {
            continue;
        }
        let active = match delimiters {
            Some(active) => active,
            None => *delimiters.insert(Delimiters::from_msh(line)?),
        };
        limits.check_segments(segments.len() + 1)?;
        segments.push(decode_segment(line, segments.len(), &active)?);
    }

    let Some(delimiters) = delimiters else {
        return Err(ParseError::MissingRequiredSegment {
            segment: "MSH".into(),
            reason: "message is empty".into(),
        });
    };
    tracing::debug!(segments = segments.len(), "decoded HL7 message");
    Ok(Message {
        delimiters,
        segments,
    })
}

fn decode_segment(line: &str, index: usize, delimiters: &Delimiters) -> Result<Segment> {
    let mut tokens = TokenStream::new(line);
    let name = tokens.next_token(delimiters.field).unwrap_or_default();
    if name.len() != 3 || !name.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return Err(ParseError::MalformedSegment {
            index,
            reason: format!("invalid segment name {name:?}"),
        });
    }

    let mut fields = Vec::new();
    if name == "MSH" {
        fields.push(Field::literal(delimiters.field));
        fields.push(Field::literal(
            tokens.next_token(delimiters.field).unwrap_or_default(),
        ));
    }
    while let Some(raw) = tokens.next_token(delimiters.field) {
        fields.push(decode_field(raw, delimiters));
    }

    Ok(Segment {
        name: name.to_string(),
        fields,
    })
}

fn decode_field(raw: &str, delimiters: &Delimiters) -> Field {
    Field {
        repetitions: split(raw, delimiters.repetition)
            .map(|repetition| Repetition {
                components: split(repetition, delimiters.component)
                    .map(|component| Component {
                        subcomponents: split(component, delimiters.subcomponent)
                            .map(|sub| decode_subcomponent(sub, delimiters))
                            .collect(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn decode_subcomponent(raw: &str, delimiters: &Delimiters) -> SubComponent {
    let value = unescape(raw, delimiters);
    let raw = (escape(&value, delimiters) != raw).then(|| raw.to_string());
    SubComponent { value, raw }
}

fn split(text: &str, delim: char) -> impl Iterator<Item = &str> {
    let mut tokens = TokenStream::new(text);
    std::iter::from_fn(move || tokens.next_token(delim))
}
