use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use medbridge_record::Temporal;

/// FHIR `date` / `dateTime` / `instant`.
///
/// Partial dates (`YYYY`, `YYYY-MM`) become the first day of the period.
/// Date-times with a zone are converted to UTC.
pub fn parse_fhir_temporal(input: &str) -> Option<Temporal> {
    let raw = input.trim();
    match raw.split_once('T') {
        None => parse_date(raw).map(Temporal::Date),
        Some((date, rest)) => {
            let date = parse_date(date)?;
            let (time, offset) = split_zone(rest)?;
            let time = parse_time(time)?;
            let local = NaiveDateTime::new(date, time);
            let utc = match offset {
                Some(seconds) => FixedOffset::east_opt(seconds)?
                    .from_local_datetime(&local)
                    .single()?
                    .naive_utc(),
                None => local,
            };
            Some(Temporal::DateTime(utc))
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    match raw.len() {
        4 if raw.bytes().all(|b| b.is_ascii_digit()) => {
            NaiveDate::parse_from_str(&format!("{raw}-01-01"), "%Y-%m-%d").ok()
        }
        7 => NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok(),
        10 => NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok(),
        _ => None,
    }
}

fn split_zone(rest: &str) -> Option<(&str, Option<i32>)> {
    if let Some(time) = rest.strip_suffix('Z') {
        return Some((time, Some(0)));
    }
    let Some(pos) = rest.rfind(['+', '-']) else {
        return Some((rest, None));
    };
    let (time, zone) = rest.split_at(pos);
    if zone.len() != 6 || zone.as_bytes()[3] != b':' {
        return None;
    }
    let sign = if zone.starts_with('-') { -1 } else { 1 };
    let hours: i32 = zone[1..3].parse().ok()?;
    let minutes: i32 = zone[4..6].parse().ok()?;
    Some((time, Some(sign * (hours * 3600 + minutes * 60))))
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}
