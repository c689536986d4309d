//! Decoded message tree
//!
//! Nesting follows the wire: a field holds repetitions, a repetition holds
//! components, a component holds sub-components. Sub-component values are
//! already unescaped.

use crate::delimiters::Delimiters;
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub delimiters: Delimiters,
    pub segments: Vec<Segment>,
}

impl Message {
    pub fn segments_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Segment> + 'a {
        self.segments.iter().filter(move |segment| segment.name == name)
    }

    pub fn header(&self) -> Option<&Segment> {
        self.segments.first().filter(|segment| segment.is_header())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    /// `fields[0]` is field 1. For MSH, field 1 is the field separator and
    /// field 2 the encoding characters, both held literally.
    pub fields: Vec<Field>,
}

impl Segment {
    pub fn is_header(&self) -> bool {
        self.name == "MSH"
    }

    /// Field by its 1-based HL7 position.
    pub fn field(&self, position: usize) -> Option<&Field> {
        position.checked_sub(1).and_then(|index| self.fields.get(index))
    }

    /// First value of `field`'s first repetition at `component` (1-based),
    /// `None` when absent or empty.
    pub fn value(&self, field: usize, component: usize) -> Option<&str> {
        self.field(field)
            .and_then(|field| field.first())
            .and_then(|repetition| repetition.value(component))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Field {
    pub repetitions: SmallVec<[Repetition; 1]>,
}

impl Field {
    pub fn literal(value: impl Into<String>) -> Self {
        let mut field = Self::default();
        field.repetitions.push(Repetition {
            components: SmallVec::from_elem(
                Component {
                    subcomponents: SmallVec::from_elem(SubComponent::new(value), 1),
                },
                1,
            ),
        });
        field
    }

    pub fn first(&self) -> Option<&Repetition> {
        self.repetitions.first()
    }

    pub fn is_empty(&self) -> bool {
        self.repetitions.iter().all(Repetition::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Repetition {
    pub components: SmallVec<[Component; 4]>,
}

impl Repetition {
    pub fn component(&self, position: usize) -> Option<&Component> {
        position
            .checked_sub(1)
            .and_then(|index| self.components.get(index))
    }

    /// First sub-component of a 1-based component, `None` when empty.
    pub fn value(&self, position: usize) -> Option<&str> {
        self.component(position)
            .and_then(|component| component.subcomponents.first())
            .map(|sub| sub.value.as_str())
            .filter(|value| !value.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.components.iter().all(|component| {
            component
                .subcomponents
                .iter()
                .all(|sub| sub.value.is_empty())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Component {
    pub subcomponents: SmallVec<[SubComponent; 1]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubComponent {
    pub value: String,
    /// Wire text, kept only when canonical escaping of `value` would not
    /// reproduce it.
    pub raw: Option<String>,
}

impl SubComponent {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            raw: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_one_based() {
        let segment = Segment {
            name: "PID".into(),
            fields: vec![Field::literal("1"), Field::default(), Field::literal("12345")],
        };
        assert_eq!(segment.value(1, 1), Some("1"));
        assert_eq!(segment.value(2, 1), None);
        assert_eq!(segment.value(3, 1), Some("12345"));
        assert_eq!(segment.value(3, 2), None);
        assert!(segment.field(0).is_none());
        assert!(segment.field(9).is_none());
        assert!(segment.field(2).unwrap().is_empty());
    }
}
