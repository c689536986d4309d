//! Rule steps
//!
//! Each step reads a [`RecordSet`] and appends findings; none of them ever
//! mutates a record. Entities are visited record by record, patients first,
//! then encounters, then observations, so reports are deterministic.

pub mod duplicates;
pub mod quality;
pub mod references;
pub mod required;
pub mod values;

use medbridge_record::{
    EntityKind, EntityRef, Encounter, NormalizedRecord, Observation, Patient,
};
use std::collections::HashSet;
use std::fmt;

/// Where an entity sits in the validated slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub record: usize,
    pub kind: EntityKind,
    pub index: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = match self.kind {
            EntityKind::Patient => "patients",
            EntityKind::Encounter => "encounters",
            EntityKind::Observation => "observations",
        };
        write!(f, "records[{}].{}[{}]", self.record, list, self.index)
    }
}

/// Read-only view over every entity of a record set, with identifier
/// indexes for reference lookups.
pub struct RecordSet<'a> {
    records: &'a [NormalizedRecord],
    patient_ids: HashSet<&'a str>,
    encounter_ids: HashSet<&'a str>,
}

impl<'a> RecordSet<'a> {
    pub fn new(records: &'a [NormalizedRecord]) -> Self {
        let patient_ids = records
            .iter()
            .flat_map(|r| &r.patients)
            .map(|p| p.identifier.as_str())
            .collect();
        let encounter_ids = records
            .iter()
            .flat_map(|r| &r.encounters)
            .map(|e| e.identifier.as_str())
            .collect();
        Self {
            records,
            patient_ids,
            encounter_ids,
        }
    }

    pub fn patients(&self) -> impl Iterator<Item = (Location, &'a Patient)> {
        located(self.records, EntityKind::Patient, |r| &r.patients)
    }

    pub fn encounters(&self) -> impl Iterator<Item = (Location, &'a Encounter)> {
        located(self.records, EntityKind::Encounter, |r| &r.encounters)
    }

    pub fn observations(&self) -> impl Iterator<Item = (Location, &'a Observation)> {
        located(self.records, EntityKind::Observation, |r| &r.observations)
    }

    pub fn has_patient(&self, id: &str) -> bool {
        self.patient_ids.contains(id)
    }

    pub fn has_encounter(&self, id: &str) -> bool {
        self.encounter_ids.contains(id)
    }

    pub fn entity_count(&self) -> usize {
        self.records.iter().map(NormalizedRecord::entity_count).sum()
    }
}

fn located<'a, T: 'a>(
    records: &'a [NormalizedRecord],
    kind: EntityKind,
    list: fn(&'a NormalizedRecord) -> &'a Vec<T>,
) -> impl Iterator<Item = (Location, &'a T)> {
    records.iter().enumerate().flat_map(move |(record, r)| {
        list(r).iter().enumerate().map(move |(index, entity)| {
            (
                Location {
                    record,
                    kind,
                    index,
                },
                entity,
            )
        })
    })
}

pub(crate) fn patient_ref(patient: &Patient) -> EntityRef {
    EntityRef::new(EntityKind::Patient, patient.identifier.as_str())
}

pub(crate) fn encounter_ref(encounter: &Encounter) -> EntityRef {
    EntityRef::new(EntityKind::Encounter, encounter.identifier.as_str())
}

pub(crate) fn observation_ref(observation: &Observation) -> EntityRef {
    EntityRef::new(EntityKind::Observation, observation.identifier.as_str())
}
