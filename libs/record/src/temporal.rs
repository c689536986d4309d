//! Dates and timestamps as decoded from any source format.
//!
//! Every parser converts its own temporal grammar (HL7 `TS`, DICOM `DA`/`TM`,
//! FHIR `date`/`dateTime`) into a [`Temporal`]. Timestamps carrying a zone
//! offset are shifted to UTC before they are stored. Text that could not be
//! parsed survives as [`Temporal::Unparsed`] so the validator can report it.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Temporal {
    /// Calendar date; year- or month-precision inputs are pinned to the first day.
    Date(NaiveDate),
    /// Date and time of day, in UTC when the source carried an offset.
    DateTime(NaiveDateTime),
    /// Source text that did not match the format's grammar.
    Unparsed(String),
}

impl Temporal {
    /// Point in time for ordering; dates start at midnight.
    pub fn instant(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(date) => date.and_hms_opt(0, 0, 0),
            Self::DateTime(dt) => Some(*dt),
            Self::Unparsed(_) => None,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            Self::DateTime(dt) => Some(dt.date()),
            Self::Unparsed(_) => None,
        }
    }

    pub fn is_unparsed(&self) -> bool {
        matches!(self, Self::Unparsed(_))
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Self::Unparsed(raw) => write!(f, "{raw}"),
        }
    }
}
