//! `YYYYMMDDHH` timestamps as used on the wire and in the time slider.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Hourly model timestamp.
///
/// The month is the calendar month (1-12). The string form round-trips
/// unchanged through [`Timestamp::parse`] and [`Timestamp::to_wire`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(NaiveDateTime);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    Length(usize),
    NotNumeric(String),
    OutOfRange { field: &'static str, value: u32 },
}

impl std::fmt::Display for TimestampError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimestampError::Length(len) => {
                write!(f, "timestamp must be 10 characters (YYYYMMDDHH), got {len}")
            }
            TimestampError::NotNumeric(s) => write!(f, "timestamp is not numeric: {s:?}"),
            TimestampError::OutOfRange { field, value } => {
                write!(f, "timestamp {field} out of range: {value}")
            }
        }
    }
}

impl std::error::Error for TimestampError {}

impl Timestamp {
    pub fn new(year: u16, month: u8, day: u8, hour: u8) -> Result<Self, TimestampError> {
        if !(1..=12).contains(&month) {
            return Err(TimestampError::OutOfRange {
                field: "month",
                value: month as u32,
            });
        }
        if hour > 23 {
            return Err(TimestampError::OutOfRange {
                field: "hour",
                value: hour as u32,
            });
        }
        NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
            .and_then(|d| d.and_hms_opt(hour as u32, 0, 0))
            .map(Timestamp)
            .ok_or(TimestampError::OutOfRange {
                field: "day",
                value: day as u32,
            })
    }

    /// Parses by fixed-offset slicing: year `0..4`, month `4..6`, day `6..8`, hour `8..10`.
    pub fn parse(s: &str) -> Result<Self, TimestampError> {
        if s.len() != 10 {
            return Err(TimestampError::Length(s.len()));
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimestampError::NotNumeric(s.to_string()));
        }
        let field = |r: std::ops::Range<usize>| -> u32 {
            s[r].bytes().fold(0u32, |acc, b| acc * 10 + (b - b'0') as u32)
        };
        Self::new(
            field(0..4) as u16,
            field(4..6) as u8,
            field(6..8) as u8,
            field(8..10) as u8,
        )
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.0
    }

    pub fn to_wire(&self) -> String {
        self.0.format("%Y%m%d%H").to_string()
    }

    /// Slider read-out, e.g. `2019/06/01 : 05 Hrs`.
    pub fn display_label(&self) -> String {
        self.0.format("%Y/%m/%d : %H Hrs").to_string()
    }

    /// Hours since 1970-01-01T00, UTC.
    pub fn hours_since_epoch(&self) -> i64 {
        self.0.and_utc().timestamp().div_euclid(3600)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl TryFrom<String> for Timestamp {
    type Error = TimestampError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Timestamp::parse(&value)
    }
}

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> Self {
        value.to_wire()
    }
}

#[cfg(test)]
mod tests {
    use super::{Timestamp, TimestampError};

    #[test]
    fn parses_fixed_offsets() {
        let t = Timestamp::parse("2019061805").unwrap();
        assert_eq!((t.year(), t.month(), t.day(), t.hour()), (2019, 6, 18, 5));
        assert_eq!(t.to_wire(), "2019061805");
        assert_eq!(t.display_label(), "2019/06/18 : 05 Hrs");
    }

    #[test]
    fn december_stays_in_its_year() {
        let t = Timestamp::parse("2018123123").unwrap();
        assert_eq!(t.month(), 12);
        assert_eq!(t.to_wire(), "2018123123");
        let next = Timestamp::parse("2019010100").unwrap();
        assert_eq!(next.hours_since_epoch() - t.hours_since_epoch(), 1);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(Timestamp::parse("201906"), Err(TimestampError::Length(6)));
        assert!(matches!(
            Timestamp::parse("20190a1805"),
            Err(TimestampError::NotNumeric(_))
        ));
        assert!(matches!(
            Timestamp::parse("2019131805"),
            Err(TimestampError::OutOfRange { field: "month", .. })
        ));
        assert!(matches!(
            Timestamp::parse("2019023000"),
            Err(TimestampError::OutOfRange { field: "day", .. })
        ));
        assert!(matches!(
            Timestamp::parse("2019022924"),
            Err(TimestampError::OutOfRange { field: "hour", .. })
        ));
    }

    #[test]
    fn epoch_hours() {
        assert_eq!(Timestamp::parse("1970010100").unwrap().hours_since_epoch(), 0);
        assert_eq!(Timestamp::parse("1970010203").unwrap().hours_since_epoch(), 27);
        assert_eq!(Timestamp::parse("1969123123").unwrap().hours_since_epoch(), -1);
    }

    #[test]
    fn serde_uses_wire_string() {
        let t: Timestamp = serde_json::from_str("\"2020022912\"").unwrap();
        assert_eq!(t.day(), 29);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"2020022912\"");
    }

    #[test]
    fn orders_chronologically() {
        let a = Timestamp::parse("2019053123").unwrap();
        let b = Timestamp::parse("2019060100").unwrap();
        assert!(a < b);
    }
}
