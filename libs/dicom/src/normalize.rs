//! Mapping from a decoded dataset to a [`NormalizedRecord`].
//!
//! Patient module attributes become the Patient, the study becomes an
//! Encounter, and patient weight/size become Observations. Every other
//! top-level element is kept in the record's audit map.

use crate::dictionary::{keyword, tags};
use crate::tree::{DicomDataset, ElementId, RawElement};
use crate::vr::ValueKind;
use chrono::{NaiveDate, NaiveTime};
use medbridge_record::{
    Code, Encounter, EntityKind, HumanName, NormalizedRecord, Observation, ObservationValue,
    ParseIssue, Patient, Reference, Sex, SourceFormat, Tag, Temporal,
};

const LOINC: &str = "http://loinc.org";
const AUDIT_HEX_PREFIX: usize = 16;

const MAPPED: &[Tag] = &[
    tags::PATIENT_ID,
    tags::PATIENT_NAME,
    tags::PATIENT_BIRTH_DATE,
    tags::PATIENT_SEX,
    tags::PATIENT_SIZE,
    tags::PATIENT_WEIGHT,
    tags::STUDY_INSTANCE_UID,
    tags::ACCESSION_NUMBER,
    tags::STUDY_DATE,
    tags::STUDY_TIME,
];

pub fn normalize(dataset: &DicomDataset) -> NormalizedRecord {
    let mut record = NormalizedRecord::new(SourceFormat::Dicom);
    record.issues.extend(dataset.issues().iter().cloned());

    let text = |tag: Tag| dataset.find(tag).and_then(RawElement::first_text);

    let patient_id = text(tags::PATIENT_ID).unwrap_or_default();
    let patient = Patient {
        identifier: patient_id.clone(),
        name: dataset
            .find(tags::PATIENT_NAME)
            .map(|element| person_name(&element.text()))
            .filter(|name| !name.is_empty()),
        birth_date: text(tags::PATIENT_BIRTH_DATE)
            .map(|raw| temporal(&raw, None, tags::PATIENT_BIRTH_DATE, &mut record.issues)),
        sex: text(tags::PATIENT_SEX).map(|code| sex(&code)),
    };
    record.patients.push(patient);
    let subject = Reference::to(EntityKind::Patient, patient_id.as_str());

    let study_start = text(tags::STUDY_DATE).map(|date| {
        let time = text(tags::STUDY_TIME);
        temporal(&date, time.as_deref(), tags::STUDY_DATE, &mut record.issues)
    });
    let study_id = text(tags::STUDY_INSTANCE_UID).or_else(|| text(tags::ACCESSION_NUMBER));
    if let Some(study_id) = &study_id {
        let mut encounter = Encounter::new(study_id.as_str(), Some(subject.clone()));
        encounter.class = Some("imaging".to_string());
        encounter.start = study_start.clone();
        record.encounters.push(encounter);
    }

    let measurements = [
        (tags::PATIENT_WEIGHT, "29463-7", "Body weight", "kg"),
        (tags::PATIENT_SIZE, "8302-2", "Body height", "m"),
    ];
    let owner = study_id.as_deref().unwrap_or(patient_id.as_str());
    for (tag, loinc, display, unit) in measurements {
        let Some(raw) = text(tag) else { continue };
        let Ok(value) = raw.parse::<f64>() else {
            record.audit.insert(audit_key(tag), raw);
            continue;
        };
        let mut observation =
            Observation::new(format!("{owner}-{loinc}"), Some(subject.clone()));
        observation.encounter = study_id
            .as_deref()
            .map(|id| Reference::to(EntityKind::Encounter, id));
        observation.code = Some(Code {
            display: Some(display.to_string()),
            ..Code::new(Some(LOINC), loinc)
        });
        observation.value = Some(ObservationValue::Quantity {
            value,
            unit: Some(unit.to_string()),
        });
        observation.effective = study_start.clone();
        record.observations.push(observation);
    }

    for id in dataset.roots() {
        let element = dataset.element(*id);
        if MAPPED.contains(&element.tag) {
            continue;
        }
        record
            .audit
            .insert(audit_key(element.tag), render(dataset, *id));
    }

    tracing::debug!(
        patient = %patient_id,
        encounters = record.encounters.len(),
        observations = record.observations.len(),
        audited = record.audit.len(),
        "normalized DICOM dataset"
    );
    record
}

fn audit_key(tag: Tag) -> String {
    keyword(tag).map_or_else(|| tag.key(), str::to_string)
}

/// Human-readable rendering for the audit map.
fn render(dataset: &DicomDataset, id: ElementId) -> String {
    let element = dataset.element(id);
    let children = dataset.children(id);
    if element.tag == tags::PIXEL_DATA {
        let fragment_bytes: usize = children
            .iter()
            .map(|child| dataset.element(*child).value.len())
            .sum();
        return format!("<pixel data: {} bytes>", element.value.len() + fragment_bytes);
    }
    let Some(vr) = element.vr else {
        return String::new();
    };
    match vr.kind() {
        ValueKind::Sequence => format!("<sequence: {} items>", children.len()),
        ValueKind::Text => element.text(),
        ValueKind::Opaque => {
            let prefix = &element.value[..element.value.len().min(AUDIT_HEX_PREFIX)];
            format!("<{} {} bytes: {}>", vr, element.value.len(), hex::encode(prefix))
        }
        _ => element
            .numbers(dataset.transfer_syntax().endian())
            .unwrap_or_default()
            .join("\\"),
    }
}

/// `family^given^middle^prefix^suffix`, alphabetic representation only.
fn person_name(raw: &str) -> HumanName {
    let alphabetic = raw.split('\\').next().unwrap_or_default();
    let alphabetic = alphabetic.split('=').next().unwrap_or_default();
    let mut parts = alphabetic.split('^').map(str::trim);
    let family = parts
        .next()
        .filter(|family| !family.is_empty())
        .map(str::to_string);
    let given = parts
        .take(2)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect();
    HumanName { family, given }
}

fn sex(code: &str) -> Sex {
    match code {
        "M" => Sex::Male,
        "F" => Sex::Female,
        "O" => Sex::Other,
        _ => Sex::Unknown,
    }
}

/// `DA` (`YYYYMMDD`, legacy `YYYY.MM.DD`) with an optional `TM`
/// (`HH[MM[SS[.FFFFFF]]]`, legacy `HH:MM:SS`).
fn temporal(date: &str, time: Option<&str>, tag: Tag, issues: &mut Vec<ParseIssue>) -> Temporal {
    let parsed_date = NaiveDate::parse_from_str(date, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(date, "%Y.%m.%d"));
    let Ok(parsed_date) = parsed_date else {
        return malformed(tag, date, issues);
    };
    let Some(time) = time else {
        return Temporal::Date(parsed_date);
    };
    match parse_time(time) {
        Some(parsed_time) => Temporal::DateTime(parsed_date.and_time(parsed_time)),
        None => {
            malformed(tags::STUDY_TIME, time, issues);
            Temporal::Date(parsed_date)
        }
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let compact: String = raw.chars().filter(|c| *c != ':').collect();
    let (main, fraction) = compact
        .split_once('.')
        .map_or((compact.as_str(), None), |(main, fraction)| (main, Some(fraction)));
    if main.len() % 2 != 0 || main.len() > 6 || !main.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let field = |index: usize| -> Option<u32> {
        main.get(index * 2..index * 2 + 2)
            .map_or(Some(0), |digits| digits.parse().ok())
    };
    let micros = match fraction {
        Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
            format!("{:0<6}", &digits[..digits.len().min(6)]).parse().ok()?
        }
        Some(_) => return None,
        None => 0,
    };
    NaiveTime::from_hms_micro_opt(field(0)?, field(1)?, field(2)?, micros)
}

fn malformed(tag: Tag, raw: &str, issues: &mut Vec<ParseIssue>) -> Temporal {
    tracing::warn!(%tag, value = raw, "malformed DICOM date/time");
    issues.push(ParseIssue::MalformedTimestamp {
        location: tag.to_string(),
        value: raw.to_string(),
    });
    Temporal::Unparsed(raw.to_string())
}
