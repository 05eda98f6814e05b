//! # Durations
//!
//! The backend speaks ISO-8601 style durations: an optional sign, the `P` designator, date
//! components (`Y`, `M`, `D`), then an optional `T` section with time components (`H`, `M`, `S`).
//! Seconds may be fractional.  A duration with no non-zero component renders as `PT0S`
//! (or `-PT0S` when negative) so the field is never empty on the wire.
//!
//! ```rust
//! use wise_builder::WiseDuration;
//!
//! let interval: WiseDuration = "PT1H30M".parse().unwrap();
//! assert_eq!(interval.hours(), 1);
//! assert_eq!(interval.minutes(), 30);
//! assert_eq!(interval.to_string(), "PT1H30M");
//! assert_eq!(WiseDuration::zero().to_string(), "PT0S");
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult, Write};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::DurationParseError;

const SECONDS_PER_MINUTE: f64 = 60.0;
const SECONDS_PER_HOUR: f64 = 3_600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;
const DAYS_PER_MONTH: f64 = 30.0;
const DAYS_PER_YEAR: f64 = 365.0;

/// A signed, component-wise duration.
///
/// Components that were never set are distinct from components set to zero internally, but the
/// accessors report both as `0` and neither is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WiseDuration {
    years: Option<u32>,
    months: Option<u32>,
    days: Option<u32>,
    hours: Option<u32>,
    minutes: Option<u32>,
    seconds: Option<f64>,
    negative: bool,
}

impl WiseDuration {
    /// A duration with no components set.
    pub fn zero() -> Self {
        Self::default()
    }

    /// A duration of `hours` hours.
    pub fn from_hours(hours: u32) -> Self {
        Self::zero().with_hours(hours)
    }

    /// A duration of `minutes` minutes.
    pub fn from_minutes(minutes: u32) -> Self {
        Self::zero().with_minutes(minutes)
    }

    /// A duration of `seconds` seconds.
    pub fn from_seconds(seconds: f64) -> Self {
        Self::zero().with_seconds(seconds)
    }

    /// A duration of `days` days.
    pub fn from_days(days: u32) -> Self {
        Self::zero().with_days(days)
    }

    /// Sets the years component.
    pub fn with_years(mut self, years: u32) -> Self {
        self.years = Some(years);
        self
    }

    /// Sets the months component.
    pub fn with_months(mut self, months: u32) -> Self {
        self.months = Some(months);
        self
    }

    /// Sets the days component.
    pub fn with_days(mut self, days: u32) -> Self {
        self.days = Some(days);
        self
    }

    /// Sets the hours component.
    pub fn with_hours(mut self, hours: u32) -> Self {
        self.hours = Some(hours);
        self
    }

    /// Sets the minutes component.
    pub fn with_minutes(mut self, minutes: u32) -> Self {
        self.minutes = Some(minutes);
        self
    }

    /// Sets the seconds component.  Negative or non-finite values are stored as their
    /// absolute value or zero respectively; the sign lives in [`Self::negated`].
    pub fn with_seconds(mut self, seconds: f64) -> Self {
        self.seconds = Some(if seconds.is_finite() { seconds.abs() } else { 0.0 });
        self
    }

    /// Returns the same components with the sign flipped.
    pub fn negated(mut self) -> Self {
        self.negative = !self.negative;
        self
    }

    /// Years component (0 when unset).
    pub fn years(&self) -> u32 {
        self.years.unwrap_or(0)
    }

    /// Months component (0 when unset).
    pub fn months(&self) -> u32 {
        self.months.unwrap_or(0)
    }

    /// Days component (0 when unset).
    pub fn days(&self) -> u32 {
        self.days.unwrap_or(0)
    }

    /// Hours component (0 when unset).
    pub fn hours(&self) -> u32 {
        self.hours.unwrap_or(0)
    }

    /// Minutes component (0 when unset).
    pub fn minutes(&self) -> u32 {
        self.minutes.unwrap_or(0)
    }

    /// Seconds component (0 when unset).
    pub fn seconds(&self) -> f64 {
        self.seconds.unwrap_or(0.0)
    }

    /// Whether the duration is negative.
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Whether every component is zero or unset.
    pub fn is_zero(&self) -> bool {
        self.years() == 0
            && self.months() == 0
            && self.days() == 0
            && self.hours() == 0
            && self.minutes() == 0
            && self.seconds() == 0.0
    }

    /// Approximate signed length in seconds, counting a month as 30 days and a year as 365.
    ///
    /// Used for range checks; calendar-exact arithmetic is the backend's concern.
    pub fn total_seconds(&self) -> f64 {
        let days = f64::from(self.years()) * DAYS_PER_YEAR
            + f64::from(self.months()) * DAYS_PER_MONTH
            + f64::from(self.days());
        let total = days * SECONDS_PER_DAY
            + f64::from(self.hours()) * SECONDS_PER_HOUR
            + f64::from(self.minutes()) * SECONDS_PER_MINUTE
            + self.seconds();
        if self.negative { -total } else { total }
    }
}

/////////////////////////////////////////// Display and FromStr ///////////////////////////////////////

fn push_component(out: &mut String, value: Option<u32>, unit: char) -> bool {
    match value {
        Some(v) if v > 0 => {
            let _ = write!(out, "{}{}", v, unit);
            true
        }
        _ => false,
    }
}

impl Display for WiseDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut date = String::new();
        push_component(&mut date, self.years, 'Y');
        push_component(&mut date, self.months, 'M');
        push_component(&mut date, self.days, 'D');

        let mut time = String::new();
        push_component(&mut time, self.hours, 'H');
        push_component(&mut time, self.minutes, 'M');
        if let Some(s) = self.seconds.filter(|s| *s > 0.0) {
            let _ = write!(time, "{}S", s);
        }

        if self.negative {
            f.write_str("-")?;
        }
        f.write_str("P")?;
        f.write_str(&date)?;
        if !time.is_empty() {
            write!(f, "T{}", time)
        } else if date.is_empty() {
            f.write_str("T0S")
        } else {
            Ok(())
        }
    }
}

impl FromStr for WiseDuration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DurationParseError::Empty);
        }

        let (negative, rest) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };
        let rest = rest
            .strip_prefix('P')
            .ok_or(DurationParseError::MissingDesignator)?;

        let mut duration = WiseDuration {
            negative,
            ..WiseDuration::default()
        };
        let mut in_time = false;
        let mut components = 0;
        let mut time_components = 0;
        let mut weeks_seen = false;
        let mut days_seen = false;
        let mut number = String::new();

        for c in rest.chars() {
            if c.is_ascii_digit() || c == '.' {
                number.push(c);
                continue;
            }
            if c == 'T' {
                if in_time || !number.is_empty() {
                    return Err(DurationParseError::UnexpectedUnit(c));
                }
                in_time = true;
                continue;
            }

            if number.is_empty() {
                return Err(DurationParseError::UnexpectedUnit(c));
            }
            let value = std::mem::take(&mut number);
            match (in_time, c) {
                (false, 'Y') => set_whole(&mut duration.years, &value, c)?,
                (false, 'M') => set_whole(&mut duration.months, &value, c)?,
                (false, 'W') => {
                    if std::mem::replace(&mut weeks_seen, true) {
                        return Err(DurationParseError::DuplicateUnit(c));
                    }
                    let days = parse_whole(&value)?
                        .checked_mul(7)
                        .ok_or_else(|| DurationParseError::InvalidNumber(value.clone()))?;
                    add_days(&mut duration.days, days, &value)?;
                }
                (false, 'D') => {
                    if std::mem::replace(&mut days_seen, true) {
                        return Err(DurationParseError::DuplicateUnit(c));
                    }
                    add_days(&mut duration.days, parse_whole(&value)?, &value)?;
                }
                (true, 'H') => set_whole(&mut duration.hours, &value, c)?,
                (true, 'M') => set_whole(&mut duration.minutes, &value, c)?,
                (true, 'S') => {
                    if duration.seconds.is_some() {
                        return Err(DurationParseError::DuplicateUnit(c));
                    }
                    let seconds: f64 = value
                        .parse()
                        .map_err(|_| DurationParseError::InvalidNumber(value.clone()))?;
                    duration.seconds = Some(seconds);
                }
                _ => return Err(DurationParseError::UnexpectedUnit(c)),
            }
            components += 1;
            if in_time {
                time_components += 1;
            }
        }

        if !number.is_empty() {
            return Err(DurationParseError::DanglingNumber);
        }
        if in_time && time_components == 0 {
            return Err(DurationParseError::EmptyTimeSection);
        }
        if components == 0 {
            return Err(DurationParseError::NoComponents);
        }
        Ok(duration)
    }
}

fn parse_whole(value: &str) -> Result<u32, DurationParseError> {
    if value.contains('.') {
        return Err(DurationParseError::FractionalComponent);
    }
    value
        .parse()
        .map_err(|_| DurationParseError::InvalidNumber(value.to_string()))
}

/// Weeks and days share the days slot.
fn add_days(slot: &mut Option<u32>, days: u32, value: &str) -> Result<(), DurationParseError> {
    let total = slot
        .unwrap_or(0)
        .checked_add(days)
        .ok_or_else(|| DurationParseError::InvalidNumber(value.to_string()))?;
    *slot = Some(total);
    Ok(())
}

fn set_whole(slot: &mut Option<u32>, value: &str, unit: char) -> Result<(), DurationParseError> {
    if slot.is_some() {
        return Err(DurationParseError::DuplicateUnit(unit));
    }
    *slot = Some(parse_whole(value)?);
    Ok(())
}

/////////////////////////////////////////////////// serde //////////////////////////////////////////////

impl Serialize for WiseDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for WiseDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
