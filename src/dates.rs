//! French date phrases as printed by the publisher ("lundi 17 juin 2013",
//! "1er juillet 2014", "15 mai 2013 à 14 heures 30", "24/03/2015").

use crate::sources::common::fold;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

const MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

static LONG_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d{1,2})(?:er)?\s+(janvier|fevrier|mars|avril|mai|juin|juillet|aout|septembre|octobre|novembre|decembre)\s+(\d{4})(?:\s+a\s+(\d{1,2})\s*(?:heures?|h)(?:\s*(\d{1,2}))?)?",
    )
    .unwrap()
});
static NUMERIC_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());

fn month_number(folded_name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|month| fold(month) == folded_name)
        .map(|index| index as u32 + 1)
}

/// First date (with optional time of day) found in `text`.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let folded = fold(text);

    if let Some(captures) = LONG_DATE_RE.captures(&folded) {
        let day = captures[1].parse::<u32>().ok()?;
        let month = month_number(&captures[2])?;
        let year = captures[3].parse::<i32>().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let hour = captures
            .get(4)
            .and_then(|value| value.as_str().parse::<u32>().ok())
            .unwrap_or(0);
        let minute = captures
            .get(5)
            .and_then(|value| value.as_str().parse::<u32>().ok())
            .unwrap_or(0);
        let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
        return Some(date.and_time(time));
    }

    let captures = NUMERIC_DATE_RE.captures(&folded)?;
    let day = captures[1].parse::<u32>().ok()?;
    let month = captures[2].parse::<u32>().ok()?;
    let year = captures[3].parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day).and_then(|date| date.and_hms_opt(0, 0, 0))
}

pub fn extract_date(text: &str) -> Option<NaiveDate> {
    parse_datetime(text).map(|datetime| datetime.date())
}

/// Inverse of [`extract_date`] for the publisher's long form.
pub fn format_date(date: NaiveDate) -> String {
    let day = if date.day() == 1 {
        "1er".to_string()
    } else {
        date.day().to_string()
    };
    format!(
        "{day} {} {}",
        MONTHS[date.month0() as usize],
        date.year()
    )
}
