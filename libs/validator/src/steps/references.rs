//! Rule 2: reference resolution.
//!
//! A reference resolves when an entity of an acceptable kind with the same
//! identifier exists anywhere in the set. Untyped references (HL7 and DICOM
//! never carry a type) match any acceptable kind.
//!
//! Each reference field is checked on its own: an Observation whose subject
//! and encounter both dangle gets one finding per field, each message naming
//! the field.

use super::{encounter_ref, observation_ref, RecordSet};
use crate::report::{Finding, FindingCode};
use medbridge_record::{EntityKind, Reference};

pub fn check_references(set: &RecordSet<'_>, findings: &mut Vec<Finding>) {
    for (location, encounter) in set.encounters() {
        if let Some(patient) = &encounter.patient {
            if !resolves(set, patient, &[EntityKind::Patient]) {
                findings.push(
                    Finding::error(
                        FindingCode::UnresolvedReference,
                        encounter_ref(encounter),
                        format!("Encounter.patient {patient} does not resolve to a Patient in the set"),
                    )
                    .with_location(location.to_string()),
                );
            }
        }
    }

    for (location, observation) in set.observations() {
        if let Some(subject) = &observation.subject {
            if !resolves(set, subject, &[EntityKind::Patient, EntityKind::Encounter]) {
                findings.push(
                    Finding::error(
                        FindingCode::UnresolvedReference,
                        observation_ref(observation),
                        format!("Observation.subject {subject} does not resolve to an entity in the set"),
                    )
                    .with_location(location.to_string()),
                );
            }
        }
        if let Some(encounter) = &observation.encounter {
            if !resolves(set, encounter, &[EntityKind::Encounter]) {
                findings.push(
                    Finding::error(
                        FindingCode::UnresolvedReference,
                        observation_ref(observation),
                        format!("Observation.encounter {encounter} does not resolve to an Encounter in the set"),
                    )
                    .with_location(location.to_string()),
                );
            }
        }
    }
}

fn resolves(set: &RecordSet<'_>, reference: &Reference, accepted: &[EntityKind]) -> bool {
    match (&reference.target, reference.target_kind()) {
        (None, _) => accepted.iter().any(|kind| exists(set, *kind, &reference.id)),
        (Some(_), Some(kind)) => accepted.contains(&kind) && exists(set, kind, &reference.id),
        // typed at something a record never holds, e.g. `Group/1`
        (Some(_), None) => false,
    }
}

fn exists(set: &RecordSet<'_>, kind: EntityKind, id: &str) -> bool {
    match kind {
        EntityKind::Patient => set.has_patient(id),
        EntityKind::Encounter => set.has_encounter(id),
        EntityKind::Observation => false,
    }
}
