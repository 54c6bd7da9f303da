use std::{borrow::Cow, fmt};

use anyhow::{Result, anyhow};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Serial numbers below this value sit before Excel's phantom 1900-02-29.
const EXCEL_LEAP_BUG_SERIAL: f64 = 60.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Scalar value of one worksheet cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
}

impl CellValue {
    /// Builds a value from raw text, mapping the empty string to [`CellValue::Empty`].
    pub fn from_text(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Canonical textual form used for equality and key extraction.
    pub fn canonical(&self) -> Cow<'_, str> {
        match self {
            CellValue::Empty => Cow::Borrowed(""),
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
            CellValue::Number(n) => Cow::Owned(format_number(*n)),
            CellValue::Date(dt) => Cow::Owned(format_datetime(dt)),
        }
    }

    /// Cross-type equality: both empty, or identical canonical strings.
    ///
    /// With `blank_equals_zero` an empty cell also matches any value whose
    /// canonical form is `0`.
    pub fn equivalent(&self, other: &CellValue, blank_equals_zero: bool) -> bool {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => true,
            (true, false) => blank_equals_zero && other.canonical() == "0",
            (false, true) => blank_equals_zero && self.canonical() == "0",
            (false, false) => self.canonical() == other.canonical(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

pub fn format_datetime(value: &NaiveDateTime) -> String {
    if value.time() == NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn excel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
}

/// Converts a 1900-system Excel serial number into a timestamp.
pub fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let mut days = serial.trunc() as i64;
    if serial < EXCEL_LEAP_BUG_SERIAL {
        days += 1;
    }
    let seconds = (serial.fract() * SECONDS_PER_DAY).round() as i64;
    excel_epoch()
        .checked_add_signed(Duration::try_days(days)?)?
        .checked_add_signed(Duration::try_seconds(seconds)?)
}

/// Inverse of [`from_excel_serial`], used when writing dates back out.
pub fn to_excel_serial(value: &NaiveDateTime) -> f64 {
    let delta = *value - excel_epoch();
    let mut days = delta.num_days() as f64;
    if days < EXCEL_LEAP_BUG_SERIAL + 1.0 {
        days -= 1.0;
    }
    let seconds = value.time().num_seconds_from_midnight() as f64;
    days + seconds / SECONDS_PER_DAY
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn integral_numbers_drop_fraction() {
        assert_eq!(CellValue::Number(5.0).canonical(), "5");
        assert_eq!(CellValue::Number(-0.0).canonical(), "0");
        assert_eq!(CellValue::Number(2.5).canonical(), "2.5");
        assert_eq!(CellValue::Number(1e20).canonical(), "100000000000000000000");
    }

    #[test]
    fn equivalence_crosses_representations() {
        assert!(CellValue::Number(5.0).equivalent(&CellValue::Text("5".into()), false));
        assert!(CellValue::Empty.equivalent(&CellValue::Text(String::new()), false));
        assert!(!CellValue::Text("B".into()).equivalent(&CellValue::Text("B2".into()), false));
        assert!(
            CellValue::Date(date(2024, 5, 6)).equivalent(&CellValue::Text("2024-05-06".into()), false)
        );
    }

    #[test]
    fn blank_versus_zero_follows_policy() {
        let zero = CellValue::Number(0.0);
        assert!(!CellValue::Empty.equivalent(&zero, false));
        assert!(CellValue::Empty.equivalent(&zero, true));
        assert!(zero.equivalent(&CellValue::Empty, true));
        assert!(!CellValue::Empty.equivalent(&CellValue::Number(1.0), true));
    }

    #[test]
    fn excel_serials_round_trip() {
        assert_eq!(from_excel_serial(45418.0), Some(date(2024, 5, 6)));
        assert_eq!(from_excel_serial(1.0), Some(date(1900, 1, 1)));
        let noon = from_excel_serial(45418.5).unwrap();
        assert_eq!(noon.format("%H:%M").to_string(), "12:00");
        assert_eq!(to_excel_serial(&date(2024, 5, 6)), 45418.0);
        assert_eq!(to_excel_serial(&date(1900, 1, 1)), 1.0);
        assert!(from_excel_serial(f64::NAN).is_none());
        assert!(from_excel_serial(1e300).is_none());
    }

    #[test]
    fn datetimes_display_without_midnight() {
        assert_eq!(CellValue::Date(date(2024, 1, 3)).to_string(), "2024-01-03");
        let stamped = parse_naive_datetime("2024-01-03T14:30:00").unwrap();
        assert_eq!(CellValue::Date(stamped).to_string(), "2024-01-03 14:30:00");
        assert_eq!(parse_naive_datetime("2024-01-03").unwrap(), date(2024, 1, 3));
        assert!(parse_naive_datetime("yesterday").is_err());
    }
}
