//! Mapping from decoded resources to a [`NormalizedRecord`].
//!
//! References stay unresolved; only references naming a bundle entry by its
//! `fullUrl` are rewritten to that entry's `Type/id`. Resources of unmapped
//! types are left out of the record.

use crate::resource::{FhirDocument, FhirResource, FhirValue, ResourceKind};
use crate::temporal::parse_fhir_temporal;
use medbridge_record::{
    Code, Encounter, HumanName, NormalizedRecord, Observation, ObservationValue, ParseError,
    ParseIssue, Patient, Reference, Result, Sex, SourceFormat, Temporal,
};
use std::collections::HashMap;

pub fn normalize(document: &FhirDocument) -> Result<NormalizedRecord> {
    let mut mapper = Mapper {
        record: NormalizedRecord::new(SourceFormat::Fhir),
        full_urls: document
            .resources
            .iter()
            .filter_map(|resource| {
                let url = resource.full_url.as_deref()?;
                let id = resource.id.as_deref()?;
                Some((url, Reference::new(Some(resource.kind.as_str()), id)))
            })
            .collect(),
    };

    for resource in &document.resources {
        match resource.kind {
            ResourceKind::Patient => mapper.patient(resource),
            ResourceKind::Encounter => mapper.encounter(resource),
            ResourceKind::Observation => mapper.observation(resource)?,
            ResourceKind::Bundle | ResourceKind::Unknown(_) => {}
        }
    }

    let record = mapper.record;
    tracing::debug!(
        patients = record.patients.len(),
        encounters = record.encounters.len(),
        observations = record.observations.len(),
        "normalized FHIR document"
    );
    Ok(record)
}

struct Mapper<'a> {
    record: NormalizedRecord,
    full_urls: HashMap<&'a str, Reference>,
}

impl Mapper<'_> {
    fn patient(&mut self, resource: &FhirResource) {
        let identifier = resource
            .id
            .clone()
            .or_else(|| text(resource, "identifier.value"))
            .unwrap_or_default();
        let name = resource
            .get("name")
            .and_then(FhirValue::first)
            .map(human_name)
            .filter(|name| !name.is_empty());
        let birth_date = self.temporal(resource, "birthDate");
        let sex = text(resource, "gender").map(|gender| match gender.as_str() {
            "male" => Sex::Male,
            "female" => Sex::Female,
            "other" => Sex::Other,
            _ => Sex::Unknown,
        });
        self.record.patients.push(Patient {
            identifier,
            name,
            birth_date,
            sex,
        });
    }

    fn encounter(&mut self, resource: &FhirResource) {
        let patient = self
            .reference(resource, "subject")
            .or_else(|| self.reference(resource, "patient"));
        let mut encounter = Encounter::new(resource.id.clone().unwrap_or_default(), patient);
        // R4 `class` is a Coding, R5 a list of CodeableConcept
        encounter.class = match resource.get("class").and_then(FhirValue::first) {
            Some(FhirValue::Code(coding)) => Some(coding.code.clone()),
            Some(other) => other
                .get("coding")
                .and_then(FhirValue::first)
                .or(Some(other))
                .and_then(code_of),
            None => None,
        };
        encounter.start = self.temporal(resource, "period.start");
        encounter.end = self.temporal(resource, "period.end");
        self.record.encounters.push(encounter);
    }

    fn observation(&mut self, resource: &FhirResource) -> Result<()> {
        let mut observation = Observation::new(
            resource.id.clone().unwrap_or_default(),
            self.reference(resource, "subject"),
        );
        observation.encounter = self.reference(resource, "encounter");
        observation.code = resource.path("code.coding").and_then(coding);
        observation.value = observation_value(resource)?;
        observation.effective = ["effectiveDateTime", "effectivePeriod.start", "effectiveInstant", "issued"]
            .into_iter()
            .find(|path| resource.path(path).is_some())
            .and_then(|path| self.temporal(resource, path));
        self.record.observations.push(observation);
        Ok(())
    }

    fn reference(&self, resource: &FhirResource, path: &str) -> Option<Reference> {
        let reference = resource.path(path)?.as_reference()?;
        if reference.target.is_none() {
            if let Some(resolved) = self.full_urls.get(reference.id.as_str()) {
                return Some(resolved.clone());
            }
        }
        Some(reference.clone())
    }

    fn temporal(&mut self, resource: &FhirResource, path: &str) -> Option<Temporal> {
        let raw = text(resource, path)?;
        if let Some(value) = parse_fhir_temporal(&raw) {
            return Some(value);
        }
        let location = format!("{}.{path}", resource.label());
        tracing::warn!(%location, value = %raw, "malformed FHIR date/time");
        self.record.issues.push(ParseIssue::MalformedTimestamp {
            location,
            value: raw.clone(),
        });
        Some(Temporal::Unparsed(raw))
    }
}

fn text(resource: &FhirResource, path: &str) -> Option<String> {
    resource
        .path(path)
        .and_then(FhirValue::as_text)
        .map(str::to_string)
}

fn human_name(value: &FhirValue) -> HumanName {
    let family = value.get("family").and_then(FhirValue::as_text);
    let given: Vec<String> = match value.get("given") {
        Some(FhirValue::List(items)) => items
            .iter()
            .filter_map(FhirValue::as_text)
            .map(str::to_string)
            .collect(),
        Some(FhirValue::Text(single)) => vec![single.clone()],
        _ => Vec::new(),
    };
    if family.is_none() && given.is_empty() {
        // only `text` present: last word is the family name
        if let Some(full) = value.get("text").and_then(FhirValue::as_text) {
            let mut words: Vec<String> = full.split_whitespace().map(str::to_string).collect();
            let family = words.pop();
            return HumanName {
                family,
                given: words,
            };
        }
    }
    HumanName {
        family: family.map(str::to_string),
        given,
    }
}

fn code_of(value: &FhirValue) -> Option<String> {
    match value {
        FhirValue::Code(coding) => Some(coding.code.clone()),
        other => other.get("code").and_then(FhirValue::as_text).map(str::to_string),
    }
}

fn coding(value: &FhirValue) -> Option<Code> {
    match value {
        FhirValue::Code(coding) => Some(Code {
            system: coding.system.clone(),
            value: coding.code.clone(),
            display: coding.display.clone(),
        }),
        // coding without a system
        other => {
            let text = |key: &str| other.get(key).and_then(FhirValue::as_text).map(str::to_string);
            Some(Code {
                system: text("system"),
                value: text("code")?,
                display: text("display"),
            })
        }
    }
}

fn observation_value(resource: &FhirResource) -> Result<Option<ObservationValue>> {
    if let Some(quantity) = resource.get("valueQuantity") {
        let Some(value) = quantity.get("value") else {
            return Ok(None);
        };
        let unit = quantity
            .get("unit")
            .or_else(|| quantity.get("code"))
            .and_then(FhirValue::as_text)
            .map(str::to_string);
        return Ok(Some(ObservationValue::Quantity {
            value: number(resource, "valueQuantity.value", value)?,
            unit,
        }));
    }
    if let Some(value) = resource.get("valueInteger") {
        return Ok(Some(ObservationValue::Quantity {
            value: number(resource, "valueInteger", value)?,
            unit: None,
        }));
    }
    if let Some(concept) = resource.path("valueCodeableConcept.coding") {
        return Ok(coding(concept).map(|code| ObservationValue::Coded { code }));
    }
    if let Some(text) = resource.get("valueString").and_then(FhirValue::as_text) {
        return Ok(Some(ObservationValue::Text {
            text: text.to_string(),
        }));
    }
    match resource.get("valueBoolean") {
        Some(FhirValue::Boolean(value)) => Ok(Some(ObservationValue::Boolean { value: *value })),
        _ => Ok(None),
    }
}

/// A JSON number, or a string that reads as one.
fn number(resource: &FhirResource, field: &str, value: &FhirValue) -> Result<f64> {
    match value {
        FhirValue::Number(number) => Ok(*number),
        FhirValue::Text(text) => text.trim().parse::<f64>().map_err(|_| mismatch(resource, field)),
        _ => Err(mismatch(resource, field)),
    }
}

fn mismatch(resource: &FhirResource, field: &str) -> ParseError {
    ParseError::TypeMismatch {
        resource: resource.label(),
        field: field.to_string(),
        expected: "number",
    }
}
