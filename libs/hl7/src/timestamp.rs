use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use medbridge_record::Temporal;

/// Parse `YYYY[MM[DD[HH[MM[SS[.S+]]]]]][+/-ZZZZ]`.
///
/// Values without an hour are dates (missing month/day default to 1).
/// Times with an offset are converted to UTC; times without one are kept
/// as written.
pub fn parse_timestamp(raw: &str) -> Option<Temporal> {
    let (body, offset) = split_offset(raw)?;
    let (main, fraction) = match body.split_once('.') {
        Some((main, fraction)) => (main, Some(fraction)),
        None => (body, None),
    };
    if !main.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !matches!(main.len(), 4 | 6 | 8 | 10 | 12 | 14) {
        return None;
    }
    if fraction.is_some() && main.len() != 14 {
        return None;
    }

    let number = |range: std::ops::Range<usize>| main.get(range).map(str::parse::<u32>);
    let year = main.get(0..4)?.parse::<i32>().ok()?;
    let month = number(4..6).transpose().ok()?.unwrap_or(1);
    let day = number(6..8).transpose().ok()?.unwrap_or(1);
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    if main.len() <= 8 {
        return Some(Temporal::Date(date));
    }

    let hour = number(8..10).transpose().ok()??;
    let minute = number(10..12).transpose().ok()?.unwrap_or(0);
    let second = number(12..14).transpose().ok()?.unwrap_or(0);
    let nanos = match fraction {
        Some(digits) => parse_fraction(digits)?,
        None => 0,
    };
    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?;
    let local = NaiveDateTime::new(date, time);
    Some(Temporal::DateTime(local - offset))
}

fn split_offset(raw: &str) -> Option<(&str, Duration)> {
    let Some(index) = raw.find(['+', '-']) else {
        return Some((raw, Duration::zero()));
    };
    let (body, zone) = raw.split_at(index);
    let digits = &zone[1..];
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i64 = digits[..2].parse().ok()?;
    let minutes: i64 = digits[2..].parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    let magnitude = Duration::minutes(hours * 60 + minutes);
    let offset = if zone.starts_with('-') {
        -magnitude
    } else {
        magnitude
    };
    Some((body, offset))
}

fn parse_fraction(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let padded = format!("{:0<9}", &digits[..digits.len().min(9)]);
    padded.parse().ok()
}
