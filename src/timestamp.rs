/*!
 * Exact timeline positions and offsets.
 *
 * Every value is held in integer milliseconds. Decimal seconds are parsed
 * digit by digit, so no binary floating point ever touches a timestamp and
 * chained shifts cannot accumulate rounding drift.
 */

use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::TimeError;

// @const: Native cue timestamp, HH:MM:SS.mmm with open-ended hours
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{2,}):([0-9]{2}):([0-9]{2})\.([0-9]{3})$").expect("timestamp pattern is valid")
});

// @const: Signed decimal seconds, e.g. "-1.25", "+10", ".5"
static DECIMAL_SECONDS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?)([0-9]*)(?:\.([0-9]*))?$").expect("decimal pattern is valid")
});

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// A non-negative position on a media timeline, exact to the millisecond
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    millis: u64,
}

impl Timestamp {
    /// Start of the timeline
    pub const ZERO: Timestamp = Timestamp { millis: 0 };

    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Build a timestamp from components, rejecting minutes/seconds/millis out of range
    pub fn from_components(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Result<Self, TimeError> {
        let error = |reason: &str| {
            let text = format!("{}:{}:{}.{}", hours, minutes, seconds, millis);
            TimeError::format(&text, reason)
        };

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(error("component out of range"));
        }

        hours
            .checked_mul(MS_PER_HOUR)
            .and_then(|ms| ms.checked_add(minutes * MS_PER_MINUTE + seconds * MS_PER_SECOND + millis))
            .map(Self::from_millis)
            .ok_or_else(|| error("hours too large"))
    }

    /// Parse `HH:MM:SS.mmm` (hours at least two digits)
    pub fn parse(text: &str) -> Result<Self, TimeError> {
        let caps = TIMESTAMP_REGEX
            .captures(text)
            .ok_or_else(|| TimeError::format(text, "expected HH:MM:SS.mmm"))?;

        // The pattern guarantees digits, only the hour field can overflow
        let hours: u64 = caps[1]
            .parse()
            .map_err(|_| TimeError::format(text, "hours too large"))?;
        let minutes: u64 = caps[2].parse().unwrap_or_default();
        let seconds: u64 = caps[3].parse().unwrap_or_default();
        let millis: u64 = caps[4].parse().unwrap_or_default();

        if minutes >= 60 {
            return Err(TimeError::format(text, "minutes must be below 60"));
        }
        if seconds >= 60 {
            return Err(TimeError::format(text, "seconds must be below 60"));
        }

        Self::from_components(hours, minutes, seconds, millis)
            .map_err(|_| TimeError::format(text, "hours too large"))
    }

    /// Build a timestamp from a decimal seconds string such as `"83.5"`.
    ///
    /// Digits past the third decimal are truncated. Negative values have no
    /// place on the timeline and are rejected.
    pub fn from_seconds(value: &str) -> Result<Self, TimeError> {
        let offset: Offset = value.parse()?;
        Self::ZERO.add(offset)
    }

    /// Shift by a signed offset, failing instead of clamping when the result would be negative
    pub fn add(self, offset: Offset) -> Result<Self, TimeError> {
        let shifted = self.millis as i128 + offset.millis as i128;
        u64::try_from(shifted)
            .map(Self::from_millis)
            .map_err(|_| TimeError::Range {
                base_ms: self.millis as i128,
                offset_ms: offset.millis as i128,
            })
    }

    pub fn as_millis(&self) -> u64 {
        self.millis
    }

    pub fn hours(&self) -> u64 {
        self.millis / MS_PER_HOUR
    }

    pub fn minutes(&self) -> u64 {
        (self.millis % MS_PER_HOUR) / MS_PER_MINUTE
    }

    pub fn seconds(&self) -> u64 {
        (self.millis % MS_PER_MINUTE) / MS_PER_SECOND
    }

    pub fn millis(&self) -> u64 {
        self.millis % MS_PER_SECOND
    }

    /// Render as `HH:MM:SS.mmm`
    pub fn format(&self) -> String {
        format!(
            "{:02}:{:02}:{:02}.{:03}",
            self.hours(),
            self.minutes(),
            self.seconds(),
            self.millis()
        )
    }

    /// Render as `H:MM:SS.cc`, the centisecond resolution of overlay scripts.
    /// The third millisecond digit is truncated.
    pub fn format_short_hours(&self) -> String {
        format!(
            "{}:{:02}:{:02}.{:02}",
            self.hours(),
            self.minutes(),
            self.seconds(),
            self.millis() / 10
        )
    }

    /// Offset that moves the start of the timeline onto this timestamp.
    /// Fails for positions beyond the signed offset range.
    pub fn as_offset(&self) -> Result<Offset, TimeError> {
        i64::try_from(self.millis)
            .map(Offset::from_millis)
            .map_err(|_| TimeError::Range {
                base_ms: self.millis as i128,
                offset_ms: 0,
            })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromStr for Timestamp {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A signed, exact time offset in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Offset {
    millis: i64,
}

impl Offset {
    pub const ZERO: Offset = Offset { millis: 0 };

    pub fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    pub fn as_millis(&self) -> i64 {
        self.millis
    }

    pub fn is_zero(&self) -> bool {
        self.millis == 0
    }
}

/// Negation saturates, so `i64::MIN` milliseconds maps to `i64::MAX`
impl Neg for Offset {
    type Output = Offset;

    fn neg(self) -> Offset {
        Offset::from_millis(self.millis.saturating_neg())
    }
}

impl FromStr for Offset {
    type Err = TimeError;

    /// Parse decimal seconds, truncating toward zero after the third fractional digit
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let caps = DECIMAL_SECONDS_REGEX
            .captures(text)
            .ok_or_else(|| TimeError::format(text, "expected decimal seconds"))?;

        let whole = caps.get(2).map_or("", |m| m.as_str());
        let fraction = caps.get(3).map_or("", |m| m.as_str());
        if whole.is_empty() && fraction.is_empty() {
            return Err(TimeError::format(text, "expected decimal seconds"));
        }

        let whole_secs: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| TimeError::format(text, "value too large"))?
        };

        let frac_ms = fraction
            .chars()
            .chain(std::iter::repeat('0'))
            .take(3)
            .fold(0i64, |acc, c| acc * 10 + c.to_digit(10).unwrap_or(0) as i64);

        let magnitude = whole_secs
            .checked_mul(MS_PER_SECOND as i64)
            .and_then(|ms| ms.checked_add(frac_ms))
            .ok_or_else(|| TimeError::format(text, "value too large"))?;

        let millis = if &caps[1] == "-" { -magnitude } else { magnitude };
        Ok(Self::from_millis(millis))
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.millis < 0 { "-" } else { "" };
        let magnitude = self.millis.unsigned_abs();
        write!(
            f,
            "{}{}.{:03}",
            sign,
            magnitude / MS_PER_SECOND,
            magnitude % MS_PER_SECOND
        )
    }
}
