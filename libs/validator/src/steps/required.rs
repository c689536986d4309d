//! Rule 1: required fields.
//!
//! Identifiers of every entity, `Observation.code`, and the patient link of
//! encounters and observations must be present.

use super::{encounter_ref, observation_ref, patient_ref, RecordSet};
use crate::report::{Finding, FindingCode};

pub fn check_required(set: &RecordSet<'_>, findings: &mut Vec<Finding>) {
    for (location, patient) in set.patients() {
        if patient.identifier.trim().is_empty() {
            findings.push(
                Finding::error(
                    FindingCode::RequiredField,
                    patient_ref(patient),
                    "Patient.identifier is missing".to_string(),
                )
                .with_location(location.to_string()),
            );
        }
    }

    for (location, encounter) in set.encounters() {
        let mut missing = Vec::new();
        if encounter.identifier.trim().is_empty() {
            missing.push("Encounter.identifier");
        }
        if encounter.patient.is_none() {
            missing.push("Encounter.patient");
        }
        for field in missing {
            findings.push(
                Finding::error(
                    FindingCode::RequiredField,
                    encounter_ref(encounter),
                    format!("{field} is missing"),
                )
                .with_location(location.to_string()),
            );
        }
    }

    for (location, observation) in set.observations() {
        let mut missing = Vec::new();
        if observation.identifier.trim().is_empty() {
            missing.push("Observation.identifier");
        }
        if observation.subject.is_none() {
            missing.push("Observation.subject");
        }
        match &observation.code {
            None => missing.push("Observation.code"),
            Some(code) if code.value.trim().is_empty() => missing.push("Observation.code"),
            Some(_) => {}
        }
        for field in missing {
            findings.push(
                Finding::error(
                    FindingCode::RequiredField,
                    observation_ref(observation),
                    format!("{field} is missing"),
                )
                .with_location(location.to_string()),
            );
        }
    }
}
