//! Decoded FHIR resources
//!
//! Element values are kept close to their JSON shape, except that objects
//! holding a `reference` become [`FhirValue::Reference`] and plain codings
//! become [`FhirValue::Code`].

use medbridge_record::{EntityKind, Reference};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    Patient,
    Encounter,
    Observation,
    Bundle,
    /// Any other `resourceType`, carried through untouched.
    Unknown(String),
}

impl ResourceKind {
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "Patient" => Self::Patient,
            "Encounter" => Self::Encounter,
            "Observation" => Self::Observation,
            "Bundle" => Self::Bundle,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Patient => "Patient",
            Self::Encounter => "Encounter",
            Self::Observation => "Observation",
            Self::Bundle => "Bundle",
            Self::Unknown(name) => name,
        }
    }

    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            Self::Patient => Some(EntityKind::Patient),
            Self::Encounter => Some(EntityKind::Encounter),
            Self::Observation => Some(EntityKind::Observation),
            Self::Bundle | Self::Unknown(_) => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coding {
    pub system: Option<String>,
    pub code: String,
    pub display: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FhirValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Code(Coding),
    Reference(Reference),
    Complex(BTreeMap<String, FhirValue>),
    List(Vec<FhirValue>),
}

impl FhirValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Self::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    /// Named child of a complex value.
    pub fn get(&self, name: &str) -> Option<&FhirValue> {
        match self {
            Self::Complex(elements) => elements.get(name),
            _ => None,
        }
    }

    /// First item of a list; any other value is its own first item.
    pub fn first(&self) -> Option<&FhirValue> {
        match self {
            Self::List(items) => items.first(),
            other => Some(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FhirResource {
    pub kind: ResourceKind,
    pub id: Option<String>,
    /// `fullUrl` of the enclosing bundle entry.
    pub full_url: Option<String>,
    pub elements: BTreeMap<String, FhirValue>,
}

impl FhirResource {
    pub fn get(&self, name: &str) -> Option<&FhirValue> {
        self.elements.get(name)
    }

    /// Follow a dotted path, taking the first item of any list on the way.
    pub fn path(&self, path: &str) -> Option<&FhirValue> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?.first()?;
        for segment in segments {
            current = current.get(segment)?.first()?;
        }
        Some(current)
    }

    /// `Type/id` label used in error messages.
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => format!("{}/{}", self.kind, id),
            None => self.kind.to_string(),
        }
    }
}

/// Every resource found in one JSON tree, bundles already unwrapped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FhirDocument {
    pub resources: Vec<FhirResource>,
}

impl FhirDocument {
    pub fn of_kind<'a>(&'a self, kind: &'a ResourceKind) -> impl Iterator<Item = &'a FhirResource> + 'a {
        self.resources.iter().filter(move |resource| &resource.kind == kind)
    }

    /// Resources of a type this crate does not map.
    pub fn unknown(&self) -> impl Iterator<Item = &FhirResource> {
        self.resources
            .iter()
            .filter(|resource| matches!(resource.kind, ResourceKind::Unknown(_)))
    }
}
