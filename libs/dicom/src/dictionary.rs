//! Tags this crate knows by name.
//!
//! Only covers the attributes mapped into normalized records plus the
//! sequences commonly met in patient/study headers; implicit VR streams use
//! it to recover value representations.

use crate::vr::Vr;
use medbridge_record::Tag;
use phf::phf_map;

pub mod tags {
    use medbridge_record::Tag;

    pub const TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);
    pub const STUDY_DATE: Tag = Tag(0x0008, 0x0020);
    pub const STUDY_TIME: Tag = Tag(0x0008, 0x0030);
    pub const ACCESSION_NUMBER: Tag = Tag(0x0008, 0x0050);
    pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
    pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
    pub const PATIENT_BIRTH_DATE: Tag = Tag(0x0010, 0x0030);
    pub const PATIENT_SEX: Tag = Tag(0x0010, 0x0040);
    pub const PATIENT_SIZE: Tag = Tag(0x0010, 0x1020);
    pub const PATIENT_WEIGHT: Tag = Tag(0x0010, 0x1030);
    pub const STUDY_INSTANCE_UID: Tag = Tag(0x0020, 0x000D);
    pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

    pub const ITEM: Tag = Tag(0xFFFE, 0xE000);
    pub const ITEM_DELIMITATION: Tag = Tag(0xFFFE, 0xE00D);
    pub const SEQUENCE_DELIMITATION: Tag = Tag(0xFFFE, 0xE0DD);
}

struct Entry {
    vr: [u8; 2],
    keyword: &'static str,
}

static DICTIONARY: phf::Map<u32, Entry> = phf_map! {
    0x0002_0000u32 => Entry { vr: *b"UL", keyword: "FileMetaInformationGroupLength" },
    0x0002_0001u32 => Entry { vr: *b"OB", keyword: "FileMetaInformationVersion" },
    0x0002_0002u32 => Entry { vr: *b"UI", keyword: "MediaStorageSOPClassUID" },
    0x0002_0003u32 => Entry { vr: *b"UI", keyword: "MediaStorageSOPInstanceUID" },
    0x0002_0010u32 => Entry { vr: *b"UI", keyword: "TransferSyntaxUID" },
    0x0008_0016u32 => Entry { vr: *b"UI", keyword: "SOPClassUID" },
    0x0008_0018u32 => Entry { vr: *b"UI", keyword: "SOPInstanceUID" },
    0x0008_0020u32 => Entry { vr: *b"DA", keyword: "StudyDate" },
    0x0008_0030u32 => Entry { vr: *b"TM", keyword: "StudyTime" },
    0x0008_0050u32 => Entry { vr: *b"SH", keyword: "AccessionNumber" },
    0x0008_0060u32 => Entry { vr: *b"CS", keyword: "Modality" },
    0x0008_1030u32 => Entry { vr: *b"LO", keyword: "StudyDescription" },
    0x0008_1110u32 => Entry { vr: *b"SQ", keyword: "ReferencedStudySequence" },
    0x0008_1115u32 => Entry { vr: *b"SQ", keyword: "ReferencedSeriesSequence" },
    0x0010_0010u32 => Entry { vr: *b"PN", keyword: "PatientName" },
    0x0010_0020u32 => Entry { vr: *b"LO", keyword: "PatientID" },
    0x0010_0030u32 => Entry { vr: *b"DA", keyword: "PatientBirthDate" },
    0x0010_0040u32 => Entry { vr: *b"CS", keyword: "PatientSex" },
    0x0010_1020u32 => Entry { vr: *b"DS", keyword: "PatientSize" },
    0x0010_1030u32 => Entry { vr: *b"DS", keyword: "PatientWeight" },
    0x0020_000Du32 => Entry { vr: *b"UI", keyword: "StudyInstanceUID" },
    0x0020_000Eu32 => Entry { vr: *b"UI", keyword: "SeriesInstanceUID" },
    0x0040_0275u32 => Entry { vr: *b"SQ", keyword: "RequestAttributesSequence" },
    0x0040_A730u32 => Entry { vr: *b"SQ", keyword: "ContentSequence" },
    0x7FE0_0010u32 => Entry { vr: *b"OW", keyword: "PixelData" },
};

fn key(tag: Tag) -> u32 {
    (u32::from(tag.group()) << 16) | u32::from(tag.element())
}

/// VR used when the stream does not carry one. Unlisted tags read as `UN`.
pub fn implicit_vr(tag: Tag) -> Vr {
    if tag.element() == 0x0000 {
        // group length
        return Vr(*b"UL");
    }
    DICTIONARY.get(&key(tag)).map_or(Vr::UN, |entry| Vr(entry.vr))
}

pub fn keyword(tag: Tag) -> Option<&'static str> {
    DICTIONARY.get(&key(tag)).map(|entry| entry.keyword)
}
