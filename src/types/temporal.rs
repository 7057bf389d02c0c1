//! Date, timestamp and interval storage types
//!
//! Dates count days from 1970-01-01, timestamps count units (micros unless the
//! type says otherwise) from the Unix epoch in UTC. Parsing and formatting go
//! through chrono.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::common::error::{KuzuError, Result};
use crate::types::physical_type::PhysicalTypeID;
use crate::types::physical_value::{PhysicalValue, ScalarValue};
use crate::types::value::Val;

pub const MICROS_PER_SEC: i64 = 1_000_000;
pub const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SEC;
pub const DAYS_PER_MONTH: i64 = 30;
pub const MICROS_PER_MONTH: i64 = DAYS_PER_MONTH * MICROS_PER_DAY;

// Days from 0001-01-01 to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Date {
    pub days: i32,
}

impl Date {
    pub fn new(days: i32) -> Self {
        Self { days }
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self::from_naive_date)
            .ok_or_else(|| {
                KuzuError::Conversion(format!("Date out of range: {}-{}-{}.", year, month, day))
            })
    }

    pub fn from_naive_date(date: NaiveDate) -> Self {
        Self {
            days: date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE,
        }
    }

    pub fn to_naive_date(self) -> Option<NaiveDate> {
        self.days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
    }
}

impl FromStr for Date {
    type Err = KuzuError;

    fn from_str(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self::from_naive_date)
            .map_err(|_| {
                KuzuError::Conversion(format!(
                    "Error occurred during parsing date. Given: \"{}\". Expected format: (YYYY-MM-DD)",
                    s
                ))
            })
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_naive_date() {
            Some(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            None => write!(f, "{} days", self.days),
        }
    }
}

/// Microseconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    pub value: i64,
}

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self { value }
    }

    pub fn from_naive(datetime: NaiveDateTime) -> Self {
        Self {
            value: datetime.and_utc().timestamp_micros(),
        }
    }

    pub fn to_naive(self) -> Option<NaiveDateTime> {
        DateTime::from_timestamp_micros(self.value).map(|dt| dt.naive_utc())
    }

    pub fn from_date(date: Date) -> Self {
        Self {
            value: date.days as i64 * MICROS_PER_DAY,
        }
    }

    pub fn date(self) -> Date {
        Date::new(self.value.div_euclid(MICROS_PER_DAY) as i32)
    }

    fn format_naive(datetime: NaiveDateTime, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if datetime.nanosecond() == 0 {
            write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S"))
        } else {
            write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S%.6f"))
        }
    }
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

impl FromStr for Timestamp {
    type Err = KuzuError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        for format in TIMESTAMP_FORMATS {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(Self::from_naive(datetime));
            }
        }
        if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::new(datetime.timestamp_micros()));
        }
        if let Ok(date) = trimmed.parse::<Date>() {
            return Ok(Self::from_date(date));
        }
        Err(KuzuError::Conversion(format!(
            "Error occurred during parsing timestamp. Given: \"{}\". Expected format: (YYYY-MM-DD hh:mm:ss[.zzzzzz][+-TT[:tt]])",
            s
        )))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_naive() {
            Some(datetime) => Self::format_naive(datetime, f),
            None => write!(f, "{} us", self.value),
        }
    }
}

macro_rules! timestamp_variant {
    ($(#[$doc:meta])* $name:ident, $to_micros:expr, $from_micros:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name {
            pub value: i64,
        }

        impl $name {
            pub fn new(value: i64) -> Self {
                Self { value }
            }

            pub fn to_timestamp(self) -> Timestamp {
                let convert: fn(i64) -> i64 = $to_micros;
                Timestamp::new(convert(self.value))
            }

            pub fn from_timestamp(timestamp: Timestamp) -> Self {
                let convert: fn(i64) -> i64 = $from_micros;
                Self::new(convert(timestamp.value))
            }
        }

        impl FromStr for $name {
            type Err = KuzuError;

            fn from_str(s: &str) -> Result<Self> {
                s.parse::<Timestamp>().map(Self::from_timestamp)
            }
        }

        impl PhysicalValue for $name {
            const PHYSICAL_TYPE: PhysicalTypeID = PhysicalTypeID::Int64;

            fn read_from(bytes: &[u8]) -> Self {
                Self::new(i64::read_from(bytes))
            }

            fn write_to(&self, bytes: &mut [u8]) {
                self.value.write_to(bytes);
            }
        }

        impl ScalarValue for $name {
            fn into_val(self) -> Val {
                Val::Int64(self.value)
            }

            fn from_val(val: &Val) -> Option<Self> {
                match val {
                    Val::Int64(v) => Some(Self::new(*v)),
                    _ => None,
                }
            }
        }
    };
}

timestamp_variant!(
    /// Seconds since the Unix epoch
    TimestampSec,
    |v| v.saturating_mul(MICROS_PER_SEC),
    |v| v.div_euclid(MICROS_PER_SEC)
);
timestamp_variant!(
    /// Milliseconds since the Unix epoch
    TimestampMs,
    |v| v.saturating_mul(1_000),
    |v| v.div_euclid(1_000)
);
timestamp_variant!(
    /// Nanoseconds since the Unix epoch
    TimestampNs,
    |v| v.div_euclid(1_000),
    |v| v.saturating_mul(1_000)
);
timestamp_variant!(
    /// Microseconds since the Unix epoch, rendered with a UTC offset
    TimestampTz,
    |v| v,
    |v| v
);

impl fmt::Display for TimestampSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_timestamp())
    }
}

impl fmt::Display for TimestampMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_timestamp())
    }
}

impl fmt::Display for TimestampNs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_timestamp())
    }
}

impl fmt::Display for TimestampTz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+00", self.to_timestamp())
    }
}

/// Calendar interval; months and days are kept apart from the micro component
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub micros: i64,
}

impl Interval {
    pub fn new(months: i32, days: i32, micros: i64) -> Self {
        Self {
            months,
            days,
            micros,
        }
    }

    /// Fold days into months and micros into days, treating a month as 30 days
    pub fn normalize(&self) -> (i64, i64, i64) {
        let days = self.days as i64;
        let months = self.months as i64 + days / DAYS_PER_MONTH + self.micros / MICROS_PER_MONTH;
        let micros = self.micros % MICROS_PER_MONTH;
        let days = days % DAYS_PER_MONTH + micros / MICROS_PER_DAY;
        (months, days, micros % MICROS_PER_DAY)
    }
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        self.normalize() == other.normalize()
    }
}

impl Eq for Interval {}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Interval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalize().cmp(&other.normalize())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        let years = self.months / 12;
        let months = self.months % 12;
        for (amount, unit) in [(years, "year"), (months, "month"), (self.days, "day")] {
            if amount != 0 {
                let plural = if amount.abs() == 1 { "" } else { "s" };
                parts.push(format!("{} {}{}", amount, unit, plural));
            }
        }
        if self.micros != 0 || parts.is_empty() {
            let sign = if self.micros < 0 { "-" } else { "" };
            let micros = self.micros.unsigned_abs();
            let secs = micros / MICROS_PER_SEC as u64;
            let frac = micros % MICROS_PER_SEC as u64;
            let mut time = format!(
                "{}{:02}:{:02}:{:02}",
                sign,
                secs / 3600,
                (secs / 60) % 60,
                secs % 60
            );
            if frac != 0 {
                time.push_str(&format!(".{:06}", frac));
            }
            parts.push(time);
        }
        write!(f, "{}", parts.join(" "))
    }
}

impl PhysicalValue for Interval {
    const PHYSICAL_TYPE: PhysicalTypeID = PhysicalTypeID::Interval;

    fn read_from(bytes: &[u8]) -> Self {
        Self {
            months: i32::read_from(&bytes[..4]),
            days: i32::read_from(&bytes[4..8]),
            micros: i64::read_from(&bytes[8..16]),
        }
    }

    fn write_to(&self, bytes: &mut [u8]) {
        self.months.write_to(&mut bytes[..4]);
        self.days.write_to(&mut bytes[4..8]);
        self.micros.write_to(&mut bytes[8..16]);
    }
}

impl ScalarValue for Interval {
    fn into_val(self) -> Val {
        Val::Interval(self)
    }

    fn from_val(val: &Val) -> Option<Self> {
        match val {
            Val::Interval(v) => Some(*v),
            _ => None,
        }
    }
}

impl PhysicalValue for Date {
    const PHYSICAL_TYPE: PhysicalTypeID = PhysicalTypeID::Int32;

    fn read_from(bytes: &[u8]) -> Self {
        Self::new(i32::read_from(bytes))
    }

    fn write_to(&self, bytes: &mut [u8]) {
        self.days.write_to(bytes);
    }
}

impl ScalarValue for Date {
    fn into_val(self) -> Val {
        Val::Int32(self.days)
    }

    fn from_val(val: &Val) -> Option<Self> {
        match val {
            Val::Int32(v) => Some(Self::new(*v)),
            _ => None,
        }
    }
}

impl PhysicalValue for Timestamp {
    const PHYSICAL_TYPE: PhysicalTypeID = PhysicalTypeID::Int64;

    fn read_from(bytes: &[u8]) -> Self {
        Self::new(i64::read_from(bytes))
    }

    fn write_to(&self, bytes: &mut [u8]) {
        self.value.write_to(bytes);
    }
}

impl ScalarValue for Timestamp {
    fn into_val(self) -> Val {
        Val::Int64(self.value)
    }

    fn from_val(val: &Val) -> Option<Self> {
        match val {
            Val::Int64(v) => Some(Self::new(*v)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_parse_and_format() {
        let date: Date = "1970-01-02".parse().unwrap();
        assert_eq!(date.days, 1);
        let date: Date = "1969-12-31".parse().unwrap();
        assert_eq!(date.days, -1);
        assert_eq!(Date::from_ymd(2022, 6, 30).unwrap().to_string(), "2022-06-30");
        assert!("2022-13-01".parse::<Date>().is_err());
    }

    #[test]
    fn test_timestamp_parse_and_format() {
        let ts: Timestamp = "1970-01-01 00:00:01".parse().unwrap();
        assert_eq!(ts.value, MICROS_PER_SEC);
        assert_eq!(ts.to_string(), "1970-01-01 00:00:01");

        let ts: Timestamp = "2011-08-20T11:25:30.5".parse().unwrap();
        assert_eq!(ts.to_string(), "2011-08-20 11:25:30.500000");

        let ts: Timestamp = "2011-08-20".parse().unwrap();
        assert_eq!(ts.date(), Date::from_ymd(2011, 8, 20).unwrap());
    }

    #[test]
    fn test_timestamp_variants_convert_units() {
        let ts: TimestampNs = "1970-01-01 00:00:02".parse().unwrap();
        assert_eq!(ts.value, 2_000_000_000);
        assert_eq!(TimestampSec::new(3).to_timestamp().value, 3 * MICROS_PER_SEC);
        assert_eq!(TimestampMs::new(1500).to_string(), "1970-01-01 00:00:01.500000");
        assert_eq!(TimestampTz::new(0).to_string(), "1970-01-01 00:00:00+00");
    }

    #[test]
    fn test_interval_normalized_comparison() {
        assert_eq!(Interval::new(1, 0, 0), Interval::new(0, 30, 0));
        assert_eq!(Interval::new(0, 1, 0), Interval::new(0, 0, MICROS_PER_DAY));
        assert!(Interval::new(0, 29, 0) < Interval::new(1, 0, 0));
    }

    #[test]
    fn test_interval_display() {
        assert_eq!(Interval::default().to_string(), "00:00:00");
        assert_eq!(
            Interval::new(14, 3, 3_723_000_007).to_string(),
            "1 year 2 months 3 days 01:02:03.000007"
        );
    }
}
