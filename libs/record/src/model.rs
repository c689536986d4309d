//! Normalized entities
//!
//! Entities are plain owned values with no aliasing back into any raw
//! decode tree, so the source buffer can be dropped as soon as a record
//! has been produced.

use crate::error::ParseIssue;
use crate::temporal::Temporal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The grammar a record was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Dicom,
    Hl7v2,
    Fhir,
}

/// Entity types that participate in validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Patient,
    Encounter,
    Observation,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "Patient",
            Self::Encounter => "Encounter",
            Self::Observation => "Observation",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "Patient" => Some(Self::Patient),
            "Encounter" => Some(Self::Encounter),
            "Observation" => Some(Self::Observation),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one entity inside a record set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Unresolved pointer to another entity, stored as a (type, id) pair.
///
/// `target` is the type as written in the source (`"Patient"`, `"Group"`, ...)
/// and is `None` when the source format carries no type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub target: Option<String>,
    pub id: String,
}

impl Reference {
    pub fn new(target: Option<&str>, id: impl Into<String>) -> Self {
        Self {
            target: target.map(str::to_string),
            id: id.into(),
        }
    }

    pub fn to(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::new(Some(kind.as_str()), id)
    }

    pub fn target_kind(&self) -> Option<EntityKind> {
        self.target.as_deref().and_then(EntityKind::from_type_name)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{}/{}", target, self.id),
            None => f.write_str(&self.id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
    Unknown,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
            Self::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanName {
    pub family: Option<String>,
    pub given: Vec<String>,
}

impl HumanName {
    pub fn is_empty(&self) -> bool {
        self.family.is_none() && self.given.is_empty()
    }

    /// Given names followed by the family name, e.g. `Jane Doe`.
    pub fn display(&self) -> String {
        self.given
            .iter()
            .map(String::as_str)
            .chain(self.family.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A code drawn from some code system; only its shape is ever checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub system: Option<String>,
    pub value: String,
    pub display: Option<String>,
}

impl Code {
    pub fn new(system: Option<&str>, value: impl Into<String>) -> Self {
        Self {
            system: system.map(str::to_string),
            value: value.into(),
            display: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ObservationValue {
    Quantity { value: f64, unit: Option<String> },
    Coded { code: Code },
    Text { text: String },
    Boolean { value: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub identifier: String,
    pub name: Option<HumanName>,
    pub birth_date: Option<Temporal>,
    pub sex: Option<Sex>,
}

impl Patient {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: None,
            birth_date: None,
            sex: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    pub identifier: String,
    pub patient: Option<Reference>,
    pub class: Option<String>,
    pub start: Option<Temporal>,
    pub end: Option<Temporal>,
}

impl Encounter {
    pub fn new(identifier: impl Into<String>, patient: Option<Reference>) -> Self {
        Self {
            identifier: identifier.into(),
            patient,
            class: None,
            start: None,
            end: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub identifier: String,
    pub subject: Option<Reference>,
    pub encounter: Option<Reference>,
    pub code: Option<Code>,
    pub value: Option<ObservationValue>,
    pub effective: Option<Temporal>,
}

impl Observation {
    pub fn new(identifier: impl Into<String>, subject: Option<Reference>) -> Self {
        Self {
            identifier: identifier.into(),
            subject,
            encounter: None,
            code: None,
            value: None,
            effective: None,
        }
    }
}

/// Output of one parser run.
///
/// `audit` keeps source fields that were not mapped to any entity; it is
/// informational only and never validated. `issues` lists the recoverable
/// anomalies met while decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub source: SourceFormat,
    pub patients: Vec<Patient>,
    pub encounters: Vec<Encounter>,
    pub observations: Vec<Observation>,
    pub audit: BTreeMap<String, String>,
    pub issues: Vec<ParseIssue>,
}

impl NormalizedRecord {
    pub fn new(source: SourceFormat) -> Self {
        Self {
            source,
            patients: Vec::new(),
            encounters: Vec::new(),
            observations: Vec::new(),
            audit: BTreeMap::new(),
            issues: Vec::new(),
        }
    }

    pub fn entity_count(&self) -> usize {
        self.patients.len() + self.encounters.len() + self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_count() == 0
    }

    pub fn patient(&self, identifier: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.identifier == identifier)
    }

    pub fn observation(&self, identifier: &str) -> Option<&Observation> {
        self.observations.iter().find(|o| o.identifier == identifier)
    }
}
