//! Rule 5: recommended fields. Warnings only.

use super::{encounter_ref, observation_ref, patient_ref, Location, RecordSet};
use crate::report::{Finding, FindingCode};
use crate::{QualityPlan, RecommendedField};
use medbridge_record::EntityRef;

pub fn check_quality(set: &RecordSet<'_>, plan: &QualityPlan, findings: &mut Vec<Finding>) {
    let wanted = |field: RecommendedField| plan.fields.contains(&field);

    for (location, patient) in set.patients() {
        let missing = [
            (RecommendedField::PatientName, patient.name.is_none()),
            (RecommendedField::PatientBirthDate, patient.birth_date.is_none()),
            (RecommendedField::PatientSex, patient.sex.is_none()),
        ];
        push(patient_ref(patient), location, &missing, &wanted, findings);
    }

    for (location, encounter) in set.encounters() {
        let missing = [
            (RecommendedField::EncounterClass, encounter.class.is_none()),
            (RecommendedField::EncounterStart, encounter.start.is_none()),
        ];
        push(encounter_ref(encounter), location, &missing, &wanted, findings);
    }

    for (location, observation) in set.observations() {
        let missing = [
            (RecommendedField::ObservationValue, observation.value.is_none()),
            (RecommendedField::ObservationEffective, observation.effective.is_none()),
        ];
        push(observation_ref(observation), location, &missing, &wanted, findings);
    }
}

fn push(
    entity: EntityRef,
    location: Location,
    missing: &[(RecommendedField, bool)],
    wanted: &impl Fn(RecommendedField) -> bool,
    findings: &mut Vec<Finding>,
) {
    for (field, absent) in missing {
        if *absent && wanted(*field) {
            findings.push(
                Finding::warning(
                    FindingCode::RecommendedField,
                    entity.clone(),
                    format!("{field} is recommended but missing"),
                )
                .with_location(location.to_string()),
            );
        }
    }
}
