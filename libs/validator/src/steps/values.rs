//! Rule 3: value ranges and formats.

use super::{encounter_ref, observation_ref, patient_ref, Location, RecordSet};
use crate::report::{Finding, FindingCode};
use chrono::NaiveDate;
use medbridge_record::{EntityRef, ObservationValue, Temporal};

pub fn check_values(set: &RecordSet<'_>, today: NaiveDate, findings: &mut Vec<Finding>) {
    for (location, patient) in set.patients() {
        let entity = patient_ref(patient);
        if let Some(birth_date) = &patient.birth_date {
            check_parsed(&entity, location, "Patient.birthDate", birth_date, findings);
            if let Some(date) = birth_date.date().filter(|date| *date > today) {
                findings.push(
                    Finding::error(
                        FindingCode::FutureDate,
                        entity.clone(),
                        format!("Patient.birthDate {date} is after {today}"),
                    )
                    .with_location(location.to_string()),
                );
            }
        }
    }

    for (location, encounter) in set.encounters() {
        let entity = encounter_ref(encounter);
        for (field, value) in [("Encounter.start", &encounter.start), ("Encounter.end", &encounter.end)] {
            if let Some(value) = value {
                check_parsed(&entity, location, field, value, findings);
            }
        }
        if let (Some(start), Some(end)) = (&encounter.start, &encounter.end) {
            if ends_before(start, end) {
                findings.push(
                    Finding::error(
                        FindingCode::PeriodOrder,
                        entity,
                        format!("Encounter ends ({end}) before it starts ({start})"),
                    )
                    .with_location(location.to_string()),
                );
            }
        }
    }

    for (location, observation) in set.observations() {
        let entity = observation_ref(observation);
        if let Some(effective) = &observation.effective {
            check_parsed(&entity, location, "Observation.effective", effective, findings);
        }
        if let Some(ObservationValue::Quantity { value, .. }) = &observation.value {
            if !value.is_finite() {
                findings.push(
                    Finding::error(
                        FindingCode::NonFiniteValue,
                        entity,
                        format!("Observation.value {value} is not a finite number"),
                    )
                    .with_location(location.to_string()),
                );
            }
        }
    }
}

/// Compared at the coarser precision of the two sides, so a bare date covers
/// its whole day.
fn ends_before(start: &Temporal, end: &Temporal) -> bool {
    match (start, end) {
        (Temporal::DateTime(start), Temporal::DateTime(end)) => end < start,
        _ => match (start.date(), end.date()) {
            (Some(start), Some(end)) => end < start,
            _ => false,
        },
    }
}

fn check_parsed(
    entity: &EntityRef,
    location: Location,
    field: &str,
    value: &Temporal,
    findings: &mut Vec<Finding>,
) {
    if let Temporal::Unparsed(raw) = value {
        findings.push(
            Finding::error(
                FindingCode::InvalidDate,
                entity.clone(),
                format!("{field} {raw:?} is not a valid date or time"),
            )
            .with_location(location.to_string()),
        );
    }
}
