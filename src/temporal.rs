//! Date-time formatting and parsing.
//!
//! Formatting uses the `date()` token language (`Y-m-d H:i:s`, ...), the
//! syntax `DateTimeFormat` annotations are written in. Parsing ignores any
//! format annotation and always applies the same dual rule: an all-digit
//! string form is a Unix epoch, anything else goes to a general parser.

use std::fmt::Write;

use chrono::{
    DateTime, Datelike, FixedOffset, Months, NaiveDate, NaiveDateTime, Offset, TimeDelta, TimeZone,
    Timelike, Utc,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Longer digit runs are truncated to this many leading digits before being
/// read as epoch seconds (millisecond timestamps and the like).
const EPOCH_SECONDS_DIGITS: usize = 10;

static ALL_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

/// `+1 day`, `-2 hours`, `3 weeks ago`, ...
static RELATIVE_OFFSET: Lazy<Regex> = Lazy::new(|| {
    let units = "second|sec|minute|min|hour|day|week|month|year";
    Regex::new(&format!(r"^([+-]?)\s*([0-9]+)\s*({units})s?(\s+ago)?$")).unwrap()
});

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y/%m/%d %H:%M:%S%.f%:z",
];

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%d-%m-%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S%.f",
];

const NAIVE_DATE_FORMATS: &[&str] =
    &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y", "%d %B %Y", "%B %d, %Y"];

pub fn utc() -> FixedOffset {
    Utc.fix()
}

pub fn from_epoch(seconds: i64) -> Option<DateTime<FixedOffset>> {
    Utc.timestamp_opt(seconds, 0).single().map(|dt| dt.with_timezone(&utc()))
}

/// String form of a decoded JSON scalar, the way it would be interpolated
/// into text. Structures have none.
fn string_form(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(true) => Some("1".to_owned()),
        Value::Bool(false) => Some(String::new()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Dual rule: digits only → epoch of the first ten digits, otherwise the
/// general parser.
pub fn parse_value(value: &Value) -> Option<DateTime<FixedOffset>> {
    let text = string_form(value)?;
    if ALL_DIGITS.is_match(&text) {
        let digits = &text[..text.len().min(EPOCH_SECONDS_DIGITS)];
        return from_epoch(digits.parse().ok()?);
    }
    parse_text(&text)
}

/// General parser for common textual formats. Values without an offset are
/// taken as UTC. Relative phrases (`now`, `tomorrow`, `+1 day`) count from
/// the current time.
pub fn parse_text(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(seconds) = text.strip_prefix('@') {
        return from_epoch(seconds.parse().ok()?);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt);
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    // trailing `Z` on an otherwise naive value
    let naive_text = text.strip_suffix('Z').unwrap_or(text);
    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(naive_text, format) {
            return Some(naive.and_utc().with_timezone(&utc()));
        }
    }
    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(naive_text, format) {
            return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc().with_timezone(&utc()));
        }
    }
    parse_relative(text, Utc::now())
}

/// Relative phrases anchored at `now`. Day keywords land on midnight UTC.
fn parse_relative(text: &str, now: DateTime<Utc>) -> Option<DateTime<FixedOffset>> {
    let text = text.to_ascii_lowercase();
    let midnight = now.date_naive().and_hms_opt(0, 0, 0)?.and_utc();
    let dt = match text.as_str() {
        "now" => now,
        "today" | "midnight" => midnight,
        "tomorrow" => midnight.checked_add_signed(TimeDelta::try_days(1)?)?,
        "yesterday" => midnight.checked_sub_signed(TimeDelta::try_days(1)?)?,
        _ => {
            let caps = RELATIVE_OFFSET.captures(&text)?;
            let amount: i64 = caps[2].parse().ok()?;
            let backwards = (&caps[1] == "-") != caps.get(4).is_some();
            shift(now, &caps[3], if backwards { -amount } else { amount })?
        }
    };
    Some(dt.with_timezone(&utc()))
}

fn shift(from: DateTime<Utc>, unit: &str, amount: i64) -> Option<DateTime<Utc>> {
    let by_months = |count: i64| -> Option<DateTime<Utc>> {
        let months = Months::new(u32::try_from(count.unsigned_abs()).ok()?);
        if count < 0 {
            from.checked_sub_months(months)
        } else {
            from.checked_add_months(months)
        }
    };
    let delta = match unit {
        "second" | "sec" => TimeDelta::try_seconds(amount)?,
        "minute" | "min" => TimeDelta::try_minutes(amount)?,
        "hour" => TimeDelta::try_hours(amount)?,
        "day" => TimeDelta::try_days(amount)?,
        "week" => TimeDelta::try_weeks(amount)?,
        "month" => return by_months(amount),
        "year" => return by_months(amount.checked_mul(12)?),
        _ => return None,
    };
    from.checked_add_signed(delta)
}

/// Renders `dt` with a `date()` style pattern. Unknown letters are copied
/// through; a backslash escapes the next character.
pub fn format(dt: &DateTime<FixedOffset>, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
            continue;
        }
        push_token(&mut out, dt, c);
    }
    out
}

fn push_token(out: &mut String, dt: &DateTime<FixedOffset>, token: char) {
    // Writing to a String cannot fail.
    let _ = match token {
        // day
        'd' => write!(out, "{:02}", dt.day()),
        'D' => write!(out, "{}", dt.format("%a")),
        'j' => write!(out, "{}", dt.day()),
        'l' => write!(out, "{}", dt.format("%A")),
        'N' => write!(out, "{}", dt.weekday().number_from_monday()),
        'S' => write!(out, "{}", ordinal_suffix(dt.day())),
        'w' => write!(out, "{}", dt.weekday().num_days_from_sunday()),
        'z' => write!(out, "{}", dt.ordinal0()),
        // week / month
        'W' => write!(out, "{:02}", dt.iso_week().week()),
        'F' => write!(out, "{}", dt.format("%B")),
        'm' => write!(out, "{:02}", dt.month()),
        'M' => write!(out, "{}", dt.format("%b")),
        'n' => write!(out, "{}", dt.month()),
        't' => write!(out, "{}", days_in_month(dt.year(), dt.month())),
        // year
        'L' => write!(out, "{}", u8::from(is_leap_year(dt.year()))),
        'o' => write!(out, "{}", dt.iso_week().year()),
        'Y' => write!(out, "{:04}", dt.year()),
        'y' => write!(out, "{:02}", dt.year().rem_euclid(100)),
        // time
        'a' => write!(out, "{}", if dt.hour() < 12 { "am" } else { "pm" }),
        'A' => write!(out, "{}", if dt.hour() < 12 { "AM" } else { "PM" }),
        'g' => write!(out, "{}", dt.hour12().1),
        'G' => write!(out, "{}", dt.hour()),
        'h' => write!(out, "{:02}", dt.hour12().1),
        'H' => write!(out, "{:02}", dt.hour()),
        'i' => write!(out, "{:02}", dt.minute()),
        's' => write!(out, "{:02}", dt.second()),
        'u' => write!(out, "{:06}", dt.timestamp_subsec_micros()),
        'v' => write!(out, "{:03}", dt.timestamp_subsec_millis()),
        // timezone
        // fixed offsets carry no zone name, so `e` and `T` print the offset
        'e' | 'P' | 'T' => write!(out, "{}", dt.format("%:z")),
        'O' => write!(out, "{}", dt.format("%z")),
        'p' if dt.offset().local_minus_utc() == 0 => write!(out, "Z"),
        'p' => write!(out, "{}", dt.format("%:z")),
        'Z' => write!(out, "{}", dt.offset().local_minus_utc()),
        // full
        'c' => write!(out, "{}", dt.format("%Y-%m-%dT%H:%M:%S%:z")),
        'r' => write!(out, "{}", dt.format("%a, %d %b %Y %H:%M:%S %z")),
        'U' => write!(out, "{}", dt.timestamp()),
        other => write!(out, "{other}"),
    };
}

fn ordinal_suffix(day: u32) -> &'static str {
    match day {
        11..=13 => "th",
        _ if day % 10 == 1 => "st",
        _ if day % 10 == 2 => "nd",
        _ if day % 10 == 3 => "rd",
        _ => "th",
    }
}

fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (y, m) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2023-07-29T06:59:39.123456+00:00").unwrap()
    }

    #[test]
    fn default_pattern() {
        assert_eq!(format(&sample(), "Y-m-d H:i:s"), "2023-07-29 06:59:39");
    }

    #[test]
    fn names_escapes_and_offsets() {
        let dt = sample();
        assert_eq!(format(&dt, "D, d M Y"), "Sat, 29 Jul 2023");
        assert_eq!(format(&dt, "l jS F"), "Saturday 29th July");
        assert_eq!(format(&dt, "\\Y\\-Y"), "Y-2023");
        assert_eq!(format(&dt, "g:i A"), "6:59 AM");
        assert_eq!(format(&dt, "u v"), "123456 123");
        assert_eq!(format(&dt, "P p O"), "+00:00 Z +0000");
        assert_eq!(format(&dt, "t L"), "31 0");
        assert_eq!(format(&dt, "U"), "1690613979");
        assert_eq!(format(&dt, "c"), "2023-07-29T06:59:39+00:00");
    }

    #[test]
    fn digits_are_epoch_seconds() {
        let dt = parse_value(&json!(1690613979)).unwrap();
        assert_eq!(dt.timestamp(), 1690613979);
        assert_eq!(dt.offset().local_minus_utc(), 0);

        let dt = parse_value(&json!("1690613979")).unwrap();
        assert_eq!(dt.timestamp(), 1690613979);
    }

    #[test]
    fn long_digit_runs_keep_first_ten_digits() {
        let dt = parse_value(&json!(1690613979123_i64)).unwrap();
        assert_eq!(dt.timestamp(), 1690613979);
    }

    #[test]
    fn general_formats() {
        let expected = 1690613979;
        for text in [
            "2023-07-29 06:59:39",
            "2023-07-29T06:59:39Z",
            "2023-07-29T06:59:39+00:00",
            "2023-07-29T08:59:39+02:00",
            "Sat, 29 Jul 2023 06:59:39 +0000",
            "@1690613979",
        ] {
            let dt = parse_value(&json!(text)).unwrap_or_else(|| panic!("{text}"));
            assert_eq!(dt.timestamp(), expected, "{text}");
        }
        let date = parse_value(&json!("2023-07-29")).unwrap();
        assert_eq!(format(&date, "Y-m-d H:i:s"), "2023-07-29 00:00:00");
    }

    #[test]
    fn offsets_survive_parsing() {
        let dt = parse_value(&json!("2023-07-29T08:59:39+02:00")).unwrap();
        assert_eq!(format(&dt, "H P"), "08 +02:00");
    }

    #[test]
    fn zone_tokens_print_the_offset() {
        let dt = parse_value(&json!("2023-07-29T08:59:39+02:00")).unwrap();
        assert_eq!(format(&dt, "e|T|P|O|Z"), "+02:00|+02:00|+02:00|+0200|7200");
        assert_eq!(format(&sample(), "e T"), "+00:00 +00:00");
    }

    #[test]
    fn relative_keywords() {
        let now = sample().with_timezone(&Utc);
        let at = |text: &str| {
            let dt = parse_relative(text, now).unwrap_or_else(|| panic!("{text}"));
            format(&dt, "Y-m-d H:i:s")
        };
        assert_eq!(at("now"), "2023-07-29 06:59:39");
        assert_eq!(at("Today"), "2023-07-29 00:00:00");
        assert_eq!(at("midnight"), "2023-07-29 00:00:00");
        assert_eq!(at("tomorrow"), "2023-07-30 00:00:00");
        assert_eq!(at("yesterday"), "2023-07-28 00:00:00");
    }

    #[test]
    fn relative_offsets() {
        let now = sample().with_timezone(&Utc);
        let at = |text: &str| {
            let dt = parse_relative(text, now).unwrap_or_else(|| panic!("{text}"));
            format(&dt, "Y-m-d H:i:s")
        };
        assert_eq!(at("+1 day"), "2023-07-30 06:59:39");
        assert_eq!(at("-2 hours"), "2023-07-29 04:59:39");
        assert_eq!(at("3 weeks ago"), "2023-07-08 06:59:39");
        assert_eq!(at("+30 sec"), "2023-07-29 07:00:09");
        assert_eq!(at("+1 month"), "2023-08-29 06:59:39");
        assert_eq!(at("-1 year"), "2022-07-29 06:59:39");
        assert!(parse_relative("+1 fortnights", now).is_none());
        assert!(parse_relative("soon", now).is_none());
    }

    #[test]
    fn relative_values_count_from_the_clock() {
        let before = Utc::now().timestamp();
        let dt = parse_value(&json!("now")).unwrap();
        let after = Utc::now().timestamp();
        assert!((before..=after).contains(&dt.timestamp()));

        let tomorrow = parse_value(&json!("tomorrow")).unwrap();
        assert_eq!(format(&tomorrow, "H:i:s"), "00:00:00");
        assert!(tomorrow.timestamp() > before);
        assert!(parse_value(&json!("+1 day")).is_some());
    }

    #[test]
    fn rejects_garbage_and_structures() {
        assert!(parse_value(&json!("not a date")).is_none());
        assert!(parse_value(&json!("")).is_none());
        assert!(parse_value(&json!(null)).is_none());
        assert!(parse_value(&json!(1.5)).is_none());
        assert!(parse_value(&json!([1690613979])).is_none());
        assert!(parse_value(&json!({"t": 1})).is_none());
    }
}
