use chrono::NaiveDate;
use medbridge_fhir::{decode, parse_fhir, parse_fhir_with_limits, ResourceKind};
use medbridge_record::{
    Code, EntityKind, ObservationValue, ParseError, ParseIssue, ParseLimits, Reference, Sex,
    SourceFormat, Temporal,
};
use serde_json::{json, Value};

fn date(y: i32, m: u32, d: u32) -> Temporal {
    Temporal::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn at(y: i32, m: u32, d: u32, h: u32, mi: u32) -> Temporal {
    Temporal::DateTime(
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap(),
    )
}

fn bundle(resources: Vec<Value>) -> Value {
    let entry: Vec<Value> = resources
        .into_iter()
        .map(|resource| json!({ "resource": resource }))
        .collect();
    json!({ "resourceType": "Bundle", "type": "collection", "entry": entry })
}

fn weight(id: &str, subject: &str) -> Value {
    json!({
        "resourceType": "Observation",
        "id": id,
        "status": "final",
        "subject": { "reference": subject },
        "code": { "coding": [{ "system": "http://loinc.org", "code": "29463-7", "display": "Body weight" }] },
        "valueQuantity": { "value": 72.5, "unit": "kg", "system": "http://unitsofmeasure.org", "code": "kg" },
        "effectiveDateTime": "2024-03-15T09:30:00+01:00"
    })
}

#[test]
fn observation_with_dangling_subject_is_kept_intact() {
    let record = parse_fhir(&bundle(vec![weight("obs-1", "Patient/999")])).unwrap();

    assert_eq!(record.source, SourceFormat::Fhir);
    assert!(record.patients.is_empty());
    let observation = record.observation("obs-1").unwrap();
    assert_eq!(observation.subject, Some(Reference::to(EntityKind::Patient, "999")));
    assert_eq!(
        observation.code,
        Some(Code {
            system: Some("http://loinc.org".into()),
            value: "29463-7".into(),
            display: Some("Body weight".into()),
        })
    );
    assert_eq!(
        observation.value,
        Some(ObservationValue::Quantity {
            value: 72.5,
            unit: Some("kg".into())
        })
    );
    assert_eq!(observation.effective, Some(at(2024, 3, 15, 8, 30)));
}

#[test]
fn patient_encounter_and_observation() {
    let record = parse_fhir(&bundle(vec![
        json!({
            "resourceType": "Patient",
            "id": "p1",
            "identifier": [{ "system": "urn:mrn", "value": "MRN-1" }],
            "name": [{ "family": "Doe", "given": ["Jane", "Q"] }, { "family": "Roe" }],
            "birthDate": "1980-07",
            "gender": "female"
        }),
        json!({
            "resourceType": "Encounter",
            "id": "e1",
            "status": "finished",
            "subject": { "reference": "Patient/p1" },
            "class": { "system": "http://terminology.hl7.org/CodeSystem/v3-ActCode", "code": "AMB" },
            "period": { "start": "2024-03-15T09:00:00Z", "end": "2024-03-15T10:15:00Z" }
        }),
        json!({
            "resourceType": "Observation",
            "id": "o1",
            "subject": { "reference": "Patient/p1" },
            "encounter": { "reference": "Encounter/e1" },
            "code": { "coding": [{ "system": "http://loinc.org", "code": "8867-4" }] },
            "valueInteger": 64,
            "effectivePeriod": { "start": "2024-03-15T09:10:00Z" }
        }),
    ]))
    .unwrap();

    assert_eq!(record.entity_count(), 3);
    let patient = record.patient("p1").unwrap();
    assert_eq!(patient.name.as_ref().unwrap().display(), "Jane Q Doe");
    assert_eq!(patient.birth_date, Some(date(1980, 7, 1)));
    assert_eq!(patient.sex, Some(Sex::Female));

    let encounter = &record.encounters[0];
    assert_eq!(encounter.patient, Some(Reference::to(EntityKind::Patient, "p1")));
    assert_eq!(encounter.class.as_deref(), Some("AMB"));
    assert_eq!(encounter.start, Some(at(2024, 3, 15, 9, 0)));
    assert_eq!(encounter.end, Some(at(2024, 3, 15, 10, 15)));

    let observation = record.observation("o1").unwrap();
    assert_eq!(observation.encounter, Some(Reference::to(EntityKind::Encounter, "e1")));
    assert_eq!(
        observation.value,
        Some(ObservationValue::Quantity {
            value: 64.0,
            unit: None
        })
    );
    assert_eq!(observation.effective, Some(at(2024, 3, 15, 9, 10)));
}

#[test]
fn other_value_types() {
    let record = parse_fhir(&bundle(vec![
        json!({
            "resourceType": "Observation", "id": "coded",
            "valueCodeableConcept": { "coding": [{ "system": "http://snomed.info/sct", "code": "260385009", "display": "Negative" }] }
        }),
        json!({ "resourceType": "Observation", "id": "text", "valueString": "clear" }),
        json!({ "resourceType": "Observation", "id": "flag", "valueBoolean": true, "issued": "2024-03-15T12:00:00Z" }),
    ]))
    .unwrap();

    assert!(matches!(
        &record.observation("coded").unwrap().value,
        Some(ObservationValue::Coded { code }) if code.value == "260385009"
    ));
    assert_eq!(
        record.observation("text").unwrap().value,
        Some(ObservationValue::Text { text: "clear".into() })
    );
    let flag = record.observation("flag").unwrap();
    assert_eq!(flag.value, Some(ObservationValue::Boolean { value: true }));
    assert_eq!(flag.effective, Some(at(2024, 3, 15, 12, 0)));
}

#[test]
fn non_numeric_quantity_is_a_type_mismatch() {
    let mut observation = weight("obs-1", "Patient/1");
    observation["valueQuantity"]["value"] = json!("heavy");
    assert_eq!(
        parse_fhir(&observation),
        Err(ParseError::TypeMismatch {
            resource: "Observation/obs-1".into(),
            field: "valueQuantity.value".into(),
            expected: "number",
        })
    );
}

#[test]
fn missing_resource_type_fails_the_whole_call() {
    let json = bundle(vec![json!({ "resourceType": "Patient", "id": "p1" }), json!({ "id": "x" })]);
    assert_eq!(
        parse_fhir(&json),
        Err(ParseError::MissingRequiredField {
            resource: "$.entry[1]".into(),
            field: "resourceType".into(),
        })
    );
}

#[test]
fn unknown_resources_pass_through_but_are_not_mapped() {
    let json = bundle(vec![
        json!({ "resourceType": "Medication", "id": "m1", "code": { "text": "aspirin" } }),
        json!({ "resourceType": "Patient", "id": "p1" }),
    ]);

    let document = decode(&json, &ParseLimits::default()).unwrap();
    let unknown: Vec<_> = document.unknown().collect();
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].kind, ResourceKind::Unknown("Medication".into()));

    let record = parse_fhir(&json).unwrap();
    assert_eq!(record.entity_count(), 1);
    assert!(record.issues.is_empty());
}

#[test]
fn malformed_dates_become_issues() {
    let record = parse_fhir(&json!({
        "resourceType": "Patient",
        "id": "p1",
        "birthDate": "15/03/1980"
    }))
    .unwrap();

    assert_eq!(
        record.patients[0].birth_date,
        Some(Temporal::Unparsed("15/03/1980".into()))
    );
    assert_eq!(
        record.issues,
        vec![ParseIssue::MalformedTimestamp {
            location: "Patient/p1.birthDate".into(),
            value: "15/03/1980".into(),
        }]
    );
}

#[test]
fn resource_cap() {
    let json = bundle(
        (0..5)
            .map(|n| json!({ "resourceType": "Patient", "id": format!("p{n}") }))
            .collect(),
    );
    let limits = ParseLimits {
        max_elements: 4,
        ..ParseLimits::default()
    };
    assert_eq!(
        parse_fhir_with_limits(&json, &limits),
        Err(ParseError::ResourceLimitExceeded {
            limit: "elements",
            max: 4
        })
    );
}
