mod support;

use chrono::NaiveDate;
use medbridge_dicom::parse_dicom;
use medbridge_record::{
    EntityKind, ObservationValue, ParseIssue, Reference, Sex, SourceFormat, Temporal,
};
use support::{part10, patient_header, DicomWriter};

fn study_file() -> Vec<u8> {
    let mut writer = DicomWriter::explicit_le();
    writer
        .text(0x0008, 0x0020, "DA", "20240315")
        .text(0x0008, 0x0030, "TM", "093000")
        .text(0x0008, 0x0060, "CS", "CT")
        .text(0x0008, 0x1030, "LO", "Chest");
    patient_header(&mut writer);
    writer
        .text(0x0010, 0x1020, "DS", "1.68")
        .text(0x0010, 0x1030, "DS", "72.5")
        .text(0x0020, 0x000D, "UI", "1.2.3.4");
    part10("1.2.840.10008.1.2.1", &writer.bytes())
}

#[test]
fn patient_study_and_measurements() {
    let record = parse_dicom(&study_file()).unwrap();
    assert_eq!(record.source, SourceFormat::Dicom);
    assert!(record.issues.is_empty());

    let patient = record.patient("PAT-001").unwrap();
    assert_eq!(patient.name.as_ref().unwrap().display(), "Jane Doe");
    assert_eq!(
        patient.birth_date,
        Some(Temporal::Date(NaiveDate::from_ymd_opt(1980, 1, 1).unwrap()))
    );
    assert_eq!(patient.sex, Some(Sex::Female));

    assert_eq!(record.encounters.len(), 1);
    let study = &record.encounters[0];
    assert_eq!(study.identifier, "1.2.3.4");
    assert_eq!(study.class.as_deref(), Some("imaging"));
    assert_eq!(
        study.patient,
        Some(Reference::to(EntityKind::Patient, "PAT-001"))
    );
    let start = NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    assert_eq!(study.start, Some(Temporal::DateTime(start)));

    let weight = record.observation("1.2.3.4-29463-7").unwrap();
    assert_eq!(
        weight.value,
        Some(ObservationValue::Quantity {
            value: 72.5,
            unit: Some("kg".into())
        })
    );
    assert_eq!(
        weight.encounter,
        Some(Reference::to(EntityKind::Encounter, "1.2.3.4"))
    );
    let height = record.observation("1.2.3.4-8302-2").unwrap();
    assert_eq!(height.code.as_ref().unwrap().value, "8302-2");

    assert_eq!(record.audit.get("Modality").map(String::as_str), Some("CT"));
    assert_eq!(
        record.audit.get("StudyDescription").map(String::as_str),
        Some("Chest")
    );
    assert!(!record.audit.contains_key("PatientID"));
    assert_eq!(record.entity_count(), 4);
}

#[test]
fn accession_number_stands_in_for_missing_study_uid() {
    let mut writer = DicomWriter::explicit_le();
    writer.text(0x0008, 0x0050, "SH", "ACC-9");
    patient_header(&mut writer);

    let record = parse_dicom(&writer.bytes()).unwrap();
    assert_eq!(record.encounters[0].identifier, "ACC-9");
    assert!(record.encounters[0].start.is_none());
}

#[test]
fn no_study_means_no_encounter() {
    let mut writer = DicomWriter::explicit_le();
    patient_header(&mut writer);
    writer.text(0x0010, 0x1030, "DS", "80");

    let record = parse_dicom(&writer.bytes()).unwrap();
    assert!(record.encounters.is_empty());
    let weight = record.observation("PAT-001-29463-7").unwrap();
    assert!(weight.encounter.is_none());
}

#[test]
fn malformed_birth_date_is_kept_verbatim() {
    let mut writer = DicomWriter::explicit_le();
    writer
        .text(0x0010, 0x0020, "LO", "PAT-002")
        .text(0x0010, 0x0030, "DA", "1980XX01");

    let record = parse_dicom(&writer.bytes()).unwrap();
    assert_eq!(
        record.patients[0].birth_date,
        Some(Temporal::Unparsed("1980XX01".into()))
    );
    assert_eq!(
        record.issues,
        vec![ParseIssue::MalformedTimestamp {
            location: "(0010,0030)".into(),
            value: "1980XX01".into()
        }]
    );
}

#[test]
fn non_numeric_weight_goes_to_audit() {
    let mut writer = DicomWriter::explicit_le();
    writer
        .text(0x0010, 0x0020, "LO", "PAT-003")
        .text(0x0010, 0x1030, "DS", "heavy");

    let record = parse_dicom(&writer.bytes()).unwrap();
    assert!(record.observations.is_empty());
    assert_eq!(
        record.audit.get("PatientWeight").map(String::as_str),
        Some("heavy")
    );
}
