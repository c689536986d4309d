mod support;

use medbridge_dicom::dictionary::tags;
use medbridge_dicom::transfer::{
    DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN, EXPLICIT_VR_BIG_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN,
};
use medbridge_dicom::{decode, parse_dicom, TransferSyntax, Vr};
use medbridge_record::{ParseError, ParseIssue, ParseLimits, Tag};
use support::{part10, patient_header, DicomWriter, Syntax, UNDEFINED};

const CONTENT_SEQUENCE: (u16, u16) = (0x0040, 0xA730);

fn limits() -> ParseLimits {
    ParseLimits::default()
}

#[test]
fn bare_dataset_decodes_in_stream_order() {
    let mut writer = DicomWriter::explicit_le();
    patient_header(&mut writer);
    let dataset = decode(&writer.bytes(), &limits()).unwrap();

    assert_eq!(dataset.transfer_syntax(), TransferSyntax::ExplicitVrLittleEndian);
    let tags: Vec<Tag> = dataset
        .roots()
        .iter()
        .map(|id| dataset.element(*id).tag)
        .collect();
    assert_eq!(
        tags,
        vec![
            tags::PATIENT_NAME,
            tags::PATIENT_ID,
            tags::PATIENT_BIRTH_DATE,
            tags::PATIENT_SEX
        ]
    );
    let id = dataset.find(tags::PATIENT_ID).unwrap();
    assert_eq!(id.offset, 16);
    assert_eq!(id.vr, Some(Vr(*b"LO")));
    assert_eq!(id.text(), "PAT-001");
    assert!(dataset.issues().is_empty());
}

#[test]
fn undefined_length_sequence_consumes_each_delimiter_once() {
    let mut writer = DicomWriter::explicit_le();
    writer.text(0x0010, 0x0020, "LO", "PAT-001");
    let (group, element) = CONTENT_SEQUENCE;
    writer
        .sequence_start(group, element, UNDEFINED)
        .item_start(UNDEFINED)
        .text(0x0040, 0xA040, "CS", "TEXT")
        .item_end()
        .sequence_end();
    let sibling_offset = writer.len();
    writer.text(0x0010, 0x0040, "CS", "F");

    let dataset = decode(&writer.bytes(), &limits()).unwrap();

    // patient id, sequence, item, value type, sex; no delimiter nodes
    assert_eq!(dataset.node_count(), 5);
    assert_eq!(dataset.roots().len(), 3);

    let sequence = dataset.find_id(Tag(group, element)).unwrap();
    assert!(dataset.element(sequence).has_undefined_length());
    let items = dataset.children(sequence);
    assert_eq!(items.len(), 1);
    assert_eq!(dataset.element(items[0]).tag, tags::ITEM);
    let inner = dataset.children(items[0]);
    assert_eq!(inner.len(), 1);
    assert_eq!(dataset.element(inner[0]).text(), "TEXT");
    assert_eq!(dataset.depth(inner[0]), 2);

    let sex = dataset.find(tags::PATIENT_SEX).unwrap();
    assert_eq!(sex.offset, sibling_offset);
    assert_eq!(sex.text(), "F");
    assert!(dataset.issues().is_empty());
}

#[test]
fn defined_length_sequence_closes_at_declared_end() {
    let mut first = DicomWriter::explicit_le();
    first.text(0x0008, 0x1150, "UI", "1.2.3");
    let mut second = DicomWriter::explicit_le();
    second.text(0x0008, 0x1155, "UI", "1.2.3.4");

    let mut writer = DicomWriter::explicit_le();
    writer.sequence_defined(0x0008, 0x1110, &[first.bytes(), second.bytes()]);
    writer.text(0x0010, 0x0020, "LO", "PAT-001");

    let dataset = decode(&writer.bytes(), &limits()).unwrap();
    let sequence = dataset.find_id(Tag(0x0008, 0x1110)).unwrap();
    assert_eq!(dataset.children(sequence).len(), 2);
    assert_eq!(dataset.roots().len(), 2);
    assert_eq!(dataset.find(tags::PATIENT_ID).unwrap().text(), "PAT-001");
}

#[test]
fn part10_implicit_little_endian() {
    let mut writer = DicomWriter::new(Syntax::ImplicitLittle);
    patient_header(&mut writer);
    // ContentSequence resolved as SQ from the dictionary
    writer
        .sequence_start(0x0040, 0xA730, UNDEFINED)
        .item_start(UNDEFINED)
        .element(0x0009, 0x1001, "UN", &[0xAA, 0xBB])
        .item_end()
        .sequence_end();
    let bytes = part10(IMPLICIT_VR_LITTLE_ENDIAN, &writer.bytes());

    let dataset = decode(&bytes, &limits()).unwrap();
    assert_eq!(dataset.transfer_syntax(), TransferSyntax::ImplicitVrLittleEndian);
    assert_eq!(dataset.find(tags::PATIENT_NAME).unwrap().text(), "Doe^Jane");
    assert_eq!(
        dataset.find(tags::PATIENT_BIRTH_DATE).unwrap().vr,
        Some(Vr(*b"DA"))
    );
    let sequence = dataset.find_id(Tag(0x0040, 0xA730)).unwrap();
    let item = dataset.children(sequence)[0];
    let private = dataset.element(dataset.children(item)[0]);
    assert_eq!(private.vr, Some(Vr::UN));
    assert_eq!(private.value, vec![0xAA, 0xBB]);
}

#[test]
fn part10_explicit_big_endian() {
    let mut writer = DicomWriter::new(Syntax::ExplicitBig);
    patient_header(&mut writer);
    writer.us(0x0028, 0x0010, 512);
    let bytes = part10("1.2.840.10008.1.2.2", &writer.bytes());

    let record = parse_dicom(&bytes).unwrap();
    assert_eq!(record.patients[0].identifier, "PAT-001");
    assert_eq!(record.audit.get("0028,0010").map(String::as_str), Some("512"));
    assert_eq!(
        record.audit.get("TransferSyntaxUID").map(String::as_str),
        Some("1.2.840.10008.1.2.2")
    );
}

/// The items of an undefined-length UN value are implicit VR little endian
/// even inside a big endian dataset; the dataset's own encoding resumes
/// after the sequence delimiter.
#[test]
fn undefined_length_un_is_read_as_implicit_little_endian() {
    let mut content = DicomWriter::new(Syntax::ImplicitLittle);
    content
        .item_start(UNDEFINED)
        .text(0x0040, 0xA040, "CS", "TEXT")
        .item_end()
        .sequence_end();

    let mut writer = DicomWriter::new(Syntax::ExplicitBig);
    writer.text(0x0010, 0x0020, "LO", "PAT-001");
    writer.undefined(0x0009, 0x1010, "UN").raw(&content.bytes());
    writer.text(0x0010, 0x0040, "CS", "F");
    let bytes = part10(EXPLICIT_VR_BIG_ENDIAN, &writer.bytes());

    let dataset = decode(&bytes, &limits()).unwrap();
    let sequence = dataset.find_id(Tag(0x0009, 0x1010)).unwrap();
    let items = dataset.children(sequence);
    assert_eq!(items.len(), 1);
    let inner = dataset.children(items[0]);
    assert_eq!(inner.len(), 1);
    let value_type = dataset.element(inner[0]);
    assert_eq!(value_type.tag, Tag(0x0040, 0xA040));
    assert_eq!(value_type.value, b"TEXT".to_vec());

    assert_eq!(dataset.find(tags::PATIENT_SEX).unwrap().text(), "F");
    assert!(dataset.issues().is_empty());
}

#[test]
fn magic_without_preamble() {
    let mut writer = DicomWriter::explicit_le();
    patient_header(&mut writer);
    let full = part10("1.2.840.10008.1.2.1", &writer.bytes());
    let stripped = &full[128..];

    let dataset = decode(stripped, &limits()).unwrap();
    assert_eq!(dataset.find(tags::PATIENT_ID).unwrap().text(), "PAT-001");
    assert!(dataset.find(tags::TRANSFER_SYNTAX_UID).is_some());
}

#[test]
fn truncation_anywhere_reports_buffer_length() {
    let mut writer = DicomWriter::explicit_le();
    let mut boundaries = vec![0];
    writer.text(0x0010, 0x0010, "PN", "Doe^Jane");
    boundaries.push(writer.len());
    writer.text(0x0010, 0x0020, "LO", "PAT-001");
    boundaries.push(writer.len());
    writer.element(0x0009, 0x1010, "OB", &[1, 2, 3, 4, 5, 6]);
    boundaries.push(writer.len());
    writer.us(0x0028, 0x0010, 512);
    let full = writer.bytes();

    for cut in 1..full.len() {
        if boundaries.contains(&cut) {
            assert!(decode(&full[..cut], &limits()).is_ok(), "cut at {cut}");
            continue;
        }
        match decode(&full[..cut], &limits()) {
            Err(ParseError::UnexpectedEndOfInput { offset, .. }) => {
                assert_eq!(offset, cut, "cut at {cut}")
            }
            other => panic!("cut at {cut}: {other:?}"),
        }
    }
}

#[test]
fn defined_length_past_end_of_buffer() {
    let mut writer = DicomWriter::explicit_le();
    writer.sequence_start(0x0040, 0xA730, 100);
    let bytes = writer.bytes();
    assert_eq!(
        decode(&bytes, &limits()),
        Err(ParseError::UnexpectedEndOfInput {
            offset: bytes.len(),
            needed: 100
        })
    );
}

#[test]
fn huge_declared_length_is_truncation_not_overflow() {
    let mut writer = DicomWriter::explicit_le();
    writer.text(0x0010, 0x0020, "LO", "PAT-001");
    writer.sequence_start(0x0040, 0xA730, 0xFFFF_FFFE);
    let bytes = writer.bytes();
    assert!(matches!(
        decode(&bytes, &limits()),
        Err(ParseError::UnexpectedEndOfInput { offset, .. }) if offset == bytes.len()
    ));
}

#[test]
fn unknown_vr_is_recorded_and_decoding_continues() {
    let mut writer = DicomWriter::explicit_le();
    writer.element(0x0009, 0x1010, "ZZ", &[1, 2, 3, 4]);
    writer.text(0x0010, 0x0020, "LO", "PAT-001");

    let record = parse_dicom(&writer.bytes()).unwrap();
    assert_eq!(
        record.issues,
        vec![ParseIssue::UnknownValueRepresentation {
            tag: Tag(0x0009, 0x1010),
            vr: "ZZ".into(),
            offset: 0
        }]
    );
    assert_eq!(record.patients[0].identifier, "PAT-001");
    assert_eq!(
        record.audit.get("0009,1010").map(String::as_str),
        Some("<ZZ 4 bytes: 01020304>")
    );
}

#[test]
fn unterminated_sequence_is_dropped_and_siblings_kept() {
    let mut writer = DicomWriter::explicit_le();
    writer.text(0x0010, 0x0020, "LO", "PAT-001");
    let sequence_offset = writer.len();
    writer
        .sequence_start(0x0040, 0xA730, UNDEFINED)
        .item_start(UNDEFINED)
        .text(0x0040, 0xA040, "CS", "TEXT");

    let dataset = decode(&writer.bytes(), &limits()).unwrap();
    assert_eq!(dataset.node_count(), 1);
    assert_eq!(dataset.roots().len(), 1);
    assert_eq!(dataset.find(tags::PATIENT_ID).unwrap().text(), "PAT-001");
    assert_eq!(
        dataset.issues(),
        &[ParseIssue::MalformedSequence {
            tag: Tag(0x0040, 0xA730),
            offset: sequence_offset
        }]
    );
}

#[test]
fn nesting_beyond_max_depth_is_rejected() {
    let mut writer = DicomWriter::explicit_le();
    for _ in 0..3 {
        writer
            .sequence_start(0x0040, 0xA730, UNDEFINED)
            .item_start(UNDEFINED);
    }
    let limits = ParseLimits {
        max_depth: 2,
        ..ParseLimits::default()
    };
    assert_eq!(
        decode(&writer.bytes(), &limits),
        Err(ParseError::ResourceLimitExceeded {
            limit: "nesting levels",
            max: 2
        })
    );
}

#[test]
fn items_count_toward_max_depth() {
    let mut writer = DicomWriter::explicit_le();
    for _ in 0..2 {
        writer
            .sequence_start(0x0040, 0xA730, UNDEFINED)
            .item_start(UNDEFINED);
    }
    for _ in 0..2 {
        writer.item_end().sequence_end();
    }
    let bytes = writer.bytes();

    let shallow = ParseLimits {
        max_depth: 2,
        ..ParseLimits::default()
    };
    assert_eq!(
        decode(&bytes, &shallow),
        Err(ParseError::ResourceLimitExceeded {
            limit: "nesting levels",
            max: 2
        })
    );

    let enough = ParseLimits {
        max_depth: 4,
        ..ParseLimits::default()
    };
    let dataset = decode(&bytes, &enough).unwrap();
    assert_eq!(dataset.node_count(), 4);
    assert!(dataset.issues().is_empty());
}

#[test]
fn element_count_is_capped() {
    let mut writer = DicomWriter::explicit_le();
    patient_header(&mut writer);
    let limits = ParseLimits {
        max_elements: 3,
        ..ParseLimits::default()
    };
    assert!(matches!(
        decode(&writer.bytes(), &limits),
        Err(ParseError::ResourceLimitExceeded { limit: "elements", max: 3 })
    ));
}

#[test]
fn delimiter_outside_sequence_is_fatal() {
    let mut writer = DicomWriter::explicit_le();
    writer.text(0x0010, 0x0020, "LO", "PAT-001");
    writer.sequence_end();
    assert!(matches!(
        decode(&writer.bytes(), &limits()),
        Err(ParseError::MalformedSequence { tag, offset: 16, .. }) if tag == tags::SEQUENCE_DELIMITATION
    ));
}

#[test]
fn non_item_inside_sequence_is_fatal() {
    let mut writer = DicomWriter::explicit_le();
    writer
        .sequence_start(0x0040, 0xA730, UNDEFINED)
        .text(0x0010, 0x0020, "LO", "PAT-001");
    assert!(matches!(
        decode(&writer.bytes(), &limits()),
        Err(ParseError::MalformedSequence { tag: Tag(0x0040, 0xA730), offset: 12, .. })
    ));
}

#[test]
fn encapsulated_pixel_data_fragments() {
    let mut writer = DicomWriter::explicit_le();
    patient_header(&mut writer);
    writer
        .undefined(0x7FE0, 0x0010, "OB")
        .item_start(0)
        .item_start(4)
        .raw(&[1, 2, 3, 4])
        .sequence_end();
    let bytes = part10("1.2.840.10008.1.2.4.50", &writer.bytes());

    let dataset = decode(&bytes, &limits()).unwrap();
    assert_eq!(dataset.transfer_syntax(), TransferSyntax::Encapsulated);
    let pixels = dataset.find_id(tags::PIXEL_DATA).unwrap();
    let fragments = dataset.children(pixels);
    assert_eq!(fragments.len(), 2);
    assert_eq!(dataset.element(fragments[1]).value, vec![1, 2, 3, 4]);

    let record = parse_dicom(&bytes).unwrap();
    assert_eq!(
        record.audit.get("PixelData").map(String::as_str),
        Some("<pixel data: 4 bytes>")
    );
}

#[test]
fn deflate_is_rejected() {
    let mut writer = DicomWriter::explicit_le();
    patient_header(&mut writer);
    let bytes = part10(DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN, &writer.bytes());
    assert_eq!(
        decode(&bytes, &limits()),
        Err(ParseError::UnsupportedTransferSyntax {
            uid: DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN.to_string()
        })
    );
}

#[test]
fn sequence_in_file_meta_is_fatal() {
    let mut meta = DicomWriter::explicit_le();
    meta.sequence_start(0x0002, 0x0100, UNDEFINED);
    let mut bytes = vec![0u8; 128];
    bytes.extend_from_slice(b"DICM");
    bytes.extend_from_slice(&meta.bytes());
    assert!(matches!(
        decode(&bytes, &limits()),
        Err(ParseError::MalformedSequence { tag: Tag(0x0002, 0x0100), offset: 132, .. })
    ));
}
