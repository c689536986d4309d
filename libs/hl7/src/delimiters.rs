use medbridge_record::{ParseError, Result};

/// Delimiter set declared by MSH-1 and MSH-2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub field: char,
    pub component: char,
    pub repetition: char,
    pub escape: char,
    pub subcomponent: char,
    /// HL7 2.7+ truncation character, when MSH-2 declares one.
    pub truncation: Option<char>,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            field: '|',
            component: '^',
            repetition: '~',
            escape: '\\',
            subcomponent: '&',
            truncation: None,
        }
    }
}

impl Delimiters {
    /// Read the delimiters from the fixed offsets of an MSH segment.
    pub fn from_msh(segment: &str) -> Result<Self> {
        let Some(rest) = segment.strip_prefix("MSH") else {
            return Err(missing_msh("message does not start with an MSH segment"));
        };
        let mut chars = rest.chars();
        let Some(field) = chars.next() else {
            return Err(missing_msh("MSH segment ends before the field separator"));
        };
        let encoding: Vec<char> = chars.take_while(|c| *c != field).collect();
        if !(4..=5).contains(&encoding.len()) {
            return Err(missing_msh(&format!(
                "MSH-2 must hold 4 or 5 encoding characters, found {}",
                encoding.len()
            )));
        }

        let delimiters = Self {
            field,
            component: encoding[0],
            repetition: encoding[1],
            escape: encoding[2],
            subcomponent: encoding[3],
            truncation: encoding.get(4).copied(),
        };
        delimiters.check()?;
        Ok(delimiters)
    }

    fn check(&self) -> Result<()> {
        let all = self.all();
        for (index, c) in all.iter().enumerate() {
            if c.is_alphanumeric() || c.is_whitespace() {
                return Err(missing_msh(&format!("invalid delimiter {c:?}")));
            }
            if all[..index].contains(c) {
                return Err(missing_msh(&format!("delimiter {c:?} declared twice")));
            }
        }
        Ok(())
    }

    fn all(&self) -> Vec<char> {
        let mut all = vec![
            self.field,
            self.component,
            self.repetition,
            self.escape,
            self.subcomponent,
        ];
        all.extend(self.truncation);
        all
    }

    /// MSH-2 as it appears on the wire.
    pub fn encoding_characters(&self) -> String {
        self.all()[1..].iter().collect()
    }
}

fn missing_msh(reason: &str) -> ParseError {
    ParseError::MissingRequiredSegment {
        segment: "MSH".into(),
        reason: reason.into(),
    }
}
