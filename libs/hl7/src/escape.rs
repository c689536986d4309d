//! HL7 escape sequences
//!
//! Escapes are resolved per sub-component. Formatting and character-set
//! escapes (`\H\`, `\N\`, `\Cxxyy\`, ...) carry no text and resolve to
//! nothing; `\.br\` becomes a line break.

use crate::delimiters::Delimiters;

/// Resolve every escape sequence in `raw`.
///
/// An escape character without a closing partner is kept literally.
pub fn unescape(raw: &str, delimiters: &Delimiters) -> String {
    let escape = delimiters.escape;
    if !raw.contains(escape) {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find(escape) {
        out.push_str(&rest[..start]);
        let after = &rest[start + escape.len_utf8()..];
        let Some(end) = after.find(escape) else {
            out.push_str(&rest[start..]);
            return out;
        };
        resolve(&after[..end], delimiters, &mut out);
        rest = &after[end + escape.len_utf8()..];
    }
    out.push_str(rest);
    out
}

fn resolve(sequence: &str, delimiters: &Delimiters, out: &mut String) {
    match sequence {
        "F" => out.push(delimiters.field),
        "S" => out.push(delimiters.component),
        "T" => out.push(delimiters.subcomponent),
        "R" => out.push(delimiters.repetition),
        "E" => out.push(delimiters.escape),
        "P" => out.extend(delimiters.truncation),
        ".br" => out.push('\n'),
        hex if hex.starts_with('X') => out.push_str(&decode_hex(&hex[1..])),
        other => {
            tracing::debug!(sequence = other, "dropping formatting escape");
        }
    }
}

/// `\Xhhhh\`: UTF-8 when valid, otherwise one Latin-1 character per byte.
fn decode_hex(digits: &str) -> String {
    if digits.len() % 2 != 0 {
        return String::new();
    }
    let bytes: Option<Vec<u8>> = (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
        })
        .collect();
    let Some(bytes) = bytes else {
        return String::new();
    };
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().into_iter().map(char::from).collect(),
    }
}

/// Canonical escaping of a literal value.
pub fn escape(value: &str, delimiters: &Delimiters) -> String {
    let e = delimiters.escape;
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        let code = match c {
            c if c == delimiters.field => "F",
            c if c == delimiters.component => "S",
            c if c == delimiters.subcomponent => "T",
            c if c == delimiters.repetition => "R",
            c if c == e => "E",
            c if Some(c) == delimiters.truncation => "P",
            '\n' => ".br",
            '\r' => "X0D",
            _ => {
                out.push(c);
                continue;
            }
        };
        out.push(e);
        out.push_str(code);
        out.push(e);
    }
    out
}
