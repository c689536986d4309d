//! Mapping from a decoded message to a [`NormalizedRecord`].
//!
//! PID opens a patient context, PV1 opens a visit inside it, and every OBX
//! is attached to the current patient and visit. OBR-7 supplies the
//! default observation time for the OBX segments that follow it.

use crate::timestamp::parse_timestamp;
use crate::tree::{Message, Repetition, Segment};
use medbridge_record::{
    Code, Encounter, EntityKind, HumanName, NormalizedRecord, Observation, ObservationValue,
    ParseError, ParseIssue, Patient, Reference, Result, Sex, SourceFormat, Temporal,
};
use std::collections::HashMap;

const NUMERIC_TYPES: &[&str] = &["NM", "SN"];
const CODED_TYPES: &[&str] = &["CE", "CWE", "CNE", "CF", "CD"];

pub fn normalize(message: &Message) -> Result<NormalizedRecord> {
    Normalizer::new(message).run()
}

struct Normalizer<'a> {
    message: &'a Message,
    record: NormalizedRecord,
    control_id: String,
    patient: Option<String>,
    visit: Option<String>,
    order_time: Option<Temporal>,
    /// Occurrences seen so far, per segment name.
    occurrences: HashMap<&'a str, usize>,
    observations_seen: usize,
}

impl<'a> Normalizer<'a> {
    fn new(message: &'a Message) -> Self {
        let control_id = message
            .header()
            .and_then(|header| header.value(10, 1))
            .unwrap_or("MSG")
            .to_string();
        Self {
            message,
            record: NormalizedRecord::new(SourceFormat::Hl7v2),
            control_id,
            patient: None,
            visit: None,
            order_time: None,
            occurrences: HashMap::new(),
            observations_seen: 0,
        }
    }

    fn run(mut self) -> Result<NormalizedRecord> {
        let message = self.message;
        for (index, segment) in message.segments.iter().enumerate() {
            let occurrence = self.occurrences.entry(segment.name.as_str()).or_insert(0);
            let location = Location {
                segment: &segment.name,
                occurrence: *occurrence,
            };
            *occurrence += 1;

            match segment.name.as_str() {
                "MSH" => self.msh(segment),
                "PID" => self.pid(segment, location),
                "PV1" => self.pv1(segment, index, location)?,
                "OBR" => {
                    self.order_time = self.timestamp(segment, 7, location);
                }
                "OBX" => self.obx(segment, index, location)?,
                _ => {
                    let key = format!("{}[{}]", segment.name, location.occurrence);
                    let mut text = crate::encode(&Message {
                        delimiters: message.delimiters,
                        segments: vec![segment.clone()],
                    });
                    text.pop();
                    self.record.audit.insert(key, text);
                }
            }
        }

        tracing::debug!(
            control_id = %self.control_id,
            patients = self.record.patients.len(),
            encounters = self.record.encounters.len(),
            observations = self.record.observations.len(),
            issues = self.record.issues.len(),
            "normalized HL7 message"
        );
        Ok(self.record)
    }

    fn msh(&mut self, segment: &Segment) {
        let audit = [
            (3, "MSH-3"),
            (4, "MSH-4"),
            (7, "MSH-7"),
            (10, "MSH-10"),
            (12, "MSH-12"),
        ];
        for (position, key) in audit {
            if let Some(value) = segment.value(position, 1) {
                self.record.audit.insert(key.to_string(), value.to_string());
            }
        }
        if let Some(event) = segment.value(9, 2) {
            let kind = segment.value(9, 1).unwrap_or_default();
            self.record
                .audit
                .insert("MSH-9".to_string(), format!("{kind}^{event}"));
        }
    }

    fn pid(&mut self, segment: &Segment, location: Location<'_>) {
        let identifier = segment.value(3, 1).unwrap_or_default().to_string();
        let name = segment
            .field(5)
            .and_then(|field| field.first())
            .map(person_name)
            .filter(|name| !name.is_empty());
        let birth_date = self.timestamp(segment, 7, location);
        let sex = segment.value(8, 1).map(sex);

        self.patient = Some(identifier.clone());
        self.visit = None;
        self.order_time = None;
        self.record.patients.push(Patient {
            identifier,
            name,
            birth_date,
            sex,
        });
    }

    fn pv1(&mut self, segment: &Segment, index: usize, location: Location<'_>) -> Result<()> {
        let patient = self.require_patient(segment, index)?;
        let identifier = segment
            .value(19, 1)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-visit-{}", self.control_id, location.occurrence + 1));

        let mut encounter = Encounter::new(
            identifier.as_str(),
            Some(Reference::to(EntityKind::Patient, patient)),
        );
        encounter.class = segment.value(2, 1).map(str::to_string);
        encounter.start = self.timestamp(segment, 44, location);
        encounter.end = self.timestamp(segment, 45, location);

        self.visit = Some(identifier);
        self.record.encounters.push(encounter);
        Ok(())
    }

    /// One Observation per OBX-5 repetition.
    fn obx(&mut self, segment: &Segment, index: usize, location: Location<'_>) -> Result<()> {
        let patient = self.require_patient(segment, index)?;
        self.observations_seen += 1;

        let base_id = segment
            .value(21, 1)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-{}", self.control_id, self.observations_seen));
        let code = segment.value(3, 1).map(|value| Code {
            system: segment.value(3, 3).map(str::to_string),
            value: value.to_string(),
            display: segment.value(3, 2).map(str::to_string),
        });
        let value_type = segment.value(2, 1).unwrap_or("ST");
        let unit = segment.value(6, 1).map(str::to_string);
        let effective = self
            .timestamp(segment, 14, location)
            .or_else(|| self.order_time.clone());

        let values: Vec<Option<ObservationValue>> = segment
            .field(5)
            .map(|field| {
                field
                    .repetitions
                    .iter()
                    .map(|repetition| observation_value(repetition, value_type, unit.as_deref()))
                    .collect()
            })
            .unwrap_or_else(|| vec![None]);
        let repeated = values.len() > 1;

        for (n, value) in values.into_iter().enumerate() {
            let identifier = if repeated {
                format!("{base_id}.{}", n + 1)
            } else {
                base_id.clone()
            };
            let mut observation = Observation::new(
                identifier,
                Some(Reference::to(EntityKind::Patient, patient.as_str())),
            );
            observation.encounter = self
                .visit
                .as_deref()
                .map(|visit| Reference::to(EntityKind::Encounter, visit));
            observation.code = code.clone();
            observation.value = value;
            observation.effective = effective.clone();
            self.record.observations.push(observation);
        }
        Ok(())
    }

    fn require_patient(&self, segment: &Segment, index: usize) -> Result<String> {
        self.patient
            .clone()
            .ok_or_else(|| ParseError::MissingRequiredSegment {
                segment: "PID".into(),
                reason: format!("{} segment #{index} has no preceding PID", segment.name),
            })
    }

    fn timestamp(
        &mut self,
        segment: &Segment,
        position: usize,
        location: Location<'_>,
    ) -> Option<Temporal> {
        let raw = segment.value(position, 1)?;
        match parse_timestamp(raw) {
            Some(value) => Some(value),
            None => {
                let location = location.field(position);
                tracing::warn!(%location, value = raw, "malformed HL7 timestamp");
                self.record.issues.push(ParseIssue::MalformedTimestamp {
                    location,
                    value: raw.to_string(),
                });
                Some(Temporal::Unparsed(raw.to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Location<'a> {
    segment: &'a str,
    occurrence: usize,
}

impl Location<'_> {
    /// `PV1-44[0]`: field position, then the segment's zero-based occurrence.
    fn field(&self, position: usize) -> String {
        format!("{}-{}[{}]", self.segment, position, self.occurrence)
    }
}

/// XPN: `family^given^middle^suffix^prefix`.
fn person_name(repetition: &Repetition) -> HumanName {
    HumanName {
        family: repetition.value(1).map(str::to_string),
        given: [2, 3]
            .into_iter()
            .filter_map(|position| repetition.value(position))
            .map(str::to_string)
            .collect(),
    }
}

/// HL7 table 0001.
fn sex(code: &str) -> Sex {
    match code {
        "M" => Sex::Male,
        "F" => Sex::Female,
        "O" | "A" => Sex::Other,
        _ => Sex::Unknown,
    }
}

/// Numeric reading of an NM or SN value. SN is `comparator^num1^separator^num2`;
/// only a plain or `=` comparison with no second number is a single quantity.
fn numeric(repetition: &Repetition, value_type: &str) -> Option<f64> {
    let raw = if value_type == "SN" {
        let comparator = repetition.value(1).map(str::trim);
        match repetition.value(2) {
            Some(number) => {
                let plain = matches!(comparator, None | Some("="));
                let single = repetition.value(3).is_none() && repetition.value(4).is_none();
                if !(plain && single) {
                    return None;
                }
                number
            }
            None => comparator?,
        }
    } else {
        repetition.value(1)?
    };
    raw.trim().parse::<f64>().ok()
}

fn observation_value(
    repetition: &Repetition,
    value_type: &str,
    unit: Option<&str>,
) -> Option<ObservationValue> {
    if repetition.is_empty() {
        return None;
    }
    if NUMERIC_TYPES.contains(&value_type) {
        if let Some(value) = numeric(repetition, value_type) {
            return Some(ObservationValue::Quantity {
                value,
                unit: unit.map(str::to_string),
            });
        }
    }
    if CODED_TYPES.contains(&value_type) {
        if let Some(value) = repetition.value(1) {
            return Some(ObservationValue::Coded {
                code: Code {
                    system: repetition.value(3).map(str::to_string),
                    value: value.to_string(),
                    display: repetition.value(2).map(str::to_string),
                },
            });
        }
    }
    let text = repetition
        .components
        .iter()
        .filter_map(|component| component.subcomponents.first())
        .map(|sub| sub.value.as_str())
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Some(ObservationValue::Text { text })
}
