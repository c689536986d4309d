use medbridge_record::{ParseError, Result};

/// Forward-only tokenizer over delimited text.
///
/// Splitting behaves like [`str::split`]: an input of `"a||"` yields
/// `"a"`, `""`, `""`, so empty trailing tokens keep their positions.
#[derive(Debug, Clone)]
pub struct TokenStream<'a> {
    input: &'a str,
    position: usize,
    exhausted: bool,
}

impl<'a> TokenStream<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            exhausted: false,
        }
    }

    /// Byte offset of the next unread character.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.exhausted || self.position >= self.input.len()
    }

    pub fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    pub fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consume exactly `count` characters.
    pub fn take_chars(&mut self, count: usize) -> Result<&'a str> {
        let rest = self.rest();
        let mut end = 0;
        for taken in 0..count {
            match rest[end..].chars().next() {
                Some(c) => end += c.len_utf8(),
                None => {
                    return Err(ParseError::UnexpectedEndOfInput {
                        offset: self.input.len(),
                        needed: count - taken,
                    })
                }
            }
        }
        self.position += end;
        Ok(&rest[..end])
    }

    /// Text up to the next `delim`, consuming the delimiter.
    ///
    /// The final token is returned once input runs out; `None` afterwards.
    pub fn next_token(&mut self, delim: char) -> Option<&'a str> {
        if self.exhausted {
            return None;
        }
        let rest = self.rest();
        match rest.find(delim) {
            Some(idx) => {
                self.position += idx + delim.len_utf8();
                Some(&rest[..idx])
            }
            None => {
                self.position = self.input.len();
                self.exhausted = true;
                Some(rest)
            }
        }
    }

    /// Next line ended by `\r`, `\n` or `\r\n`. Returns `None` at end of input.
    pub fn next_line(&mut self) -> Option<&'a str> {
        if self.is_at_end() {
            return None;
        }
        let rest = self.rest();
        match rest.find(['\r', '\n']) {
            Some(idx) => {
                let terminator = if rest[idx..].starts_with("\r\n") { 2 } else { 1 };
                self.position += idx + terminator;
                Some(&rest[..idx])
            }
            None => {
                self.position = self.input.len();
                Some(rest)
            }
        }
    }
}
