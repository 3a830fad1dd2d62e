//! Interval records and the clock they are measured on.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::ParseError;

pub const SECONDS_PER_DAY: u32 = 86_400;

/// Time of day in seconds since midnight.
///
/// Unlike [`chrono::NaiveTime`] this can hold `24:00:00`, which is how the
/// exclusive end of the last interval of a day is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u32);

impl ClockTime {
    pub const MIDNIGHT: Self = Self(0);
    pub const END_OF_DAY: Self = Self(SECONDS_PER_DAY);

    /// Returns `None` for anything past `24:00:00` or with out-of-range
    /// minutes or seconds.
    #[must_use]
    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Option<Self> {
        if hours > 24 || minutes >= 60 || seconds >= 60 {
            return None;
        }
        let total = hours * 3600 + minutes * 60 + seconds;
        if total > SECONDS_PER_DAY { None } else { Some(Self(total)) }
    }

    pub(crate) const fn at_hour(hours: u32) -> Self {
        Self(hours * 3600)
    }

    #[must_use]
    pub const fn seconds_since_midnight(self) -> u32 {
        self.0
    }
}

impl FromStr for ClockTime {
    type Err = ParseError;

    /// Parses `HH:MM:SS`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidTime(s.to_string());
        let field = |part: &str| part.parse::<u32>().map_err(|_| invalid());

        let mut parts = s.trim().split(':');
        let (Some(hours), Some(minutes), Some(seconds), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        Self::from_hms(field(hours)?, field(minutes)?, field(seconds)?).ok_or_else(invalid)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hours, rest) = (self.0 / 3600, self.0 % 3600);
        write!(f, "{hours:02}:{:02}:{:02}", rest / 60, rest % 60)
    }
}

/// Billing period assigned to an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodLabel {
    Peak,
    MidPeak,
    OffPeak,
    /// Fell through every window. Not a billing tier.
    Unclassified,
}

impl PeriodLabel {
    /// The labels that carry a rate, in report order.
    pub const PRICED: [Self; 3] = [Self::Peak, Self::MidPeak, Self::OffPeak];
}

impl fmt::Display for PeriodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Peak => "Peak",
            Self::MidPeak => "Mid-peak",
            Self::OffPeak => "Off-peak",
            Self::Unclassified => "Unclassified",
        })
    }
}

/// One metered reading covering `[start_time, end_time)` on `date`.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub energy_kwh: f64,
    /// `None` until the classifier has run.
    pub period_label: Option<PeriodLabel>,
}

impl Interval {
    /// # Errors
    ///
    /// Rejects intervals that do not move forward within the day and
    /// negative or non-finite energy.
    pub fn try_new(
        date: NaiveDate,
        start_time: ClockTime,
        end_time: ClockTime,
        energy_kwh: f64,
    ) -> Result<Self, ParseError> {
        if start_time >= end_time {
            return Err(ParseError::EmptyInterval { start: start_time, end: end_time });
        }
        if !energy_kwh.is_finite() || energy_kwh < 0.0 {
            return Err(ParseError::InvalidEnergy(energy_kwh.to_string()));
        }
        Ok(Self { date, start_time, end_time, energy_kwh, period_label: None })
    }

    /// Whether the whole interval fits inside the half-open window `[from, to)`.
    #[must_use]
    pub fn lies_within(&self, from: ClockTime, to: ClockTime) -> bool {
        self.start_time >= from && self.end_time <= to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_clock_times() {
        assert_eq!("00:00:00".parse::<ClockTime>().unwrap(), ClockTime::MIDNIGHT);
        assert_eq!("24:00:00".parse::<ClockTime>().unwrap(), ClockTime::END_OF_DAY);
        assert_eq!("17:30:15".parse::<ClockTime>().unwrap().seconds_since_midnight(), 63_015);
        assert_eq!(" 06:00:00 ".parse::<ClockTime>().unwrap(), ClockTime::at_hour(6));
    }

    #[test]
    fn rejects_bad_clock_times() {
        for raw in ["24:00:01", "25:00:00", "10:60:00", "10:00", "10:00:00:00", "ab:cd:ef", ""] {
            assert!(raw.parse::<ClockTime>().is_err(), "{raw} should not parse");
        }
    }

    #[test]
    fn displays_end_of_day() {
        assert_eq!(ClockTime::END_OF_DAY.to_string(), "24:00:00");
        assert_eq!(ClockTime::from_hms(9, 5, 7).unwrap().to_string(), "09:05:07");
    }

    #[test]
    fn rejects_backwards_interval() {
        let start = ClockTime::at_hour(10);
        let result = Interval::try_new(date(2024, 6, 10), start, start, 1.0);
        assert!(matches!(result, Err(ParseError::EmptyInterval { .. })));
    }

    #[test]
    fn rejects_negative_energy() {
        let result = Interval::try_new(
            date(2024, 6, 10),
            ClockTime::at_hour(10),
            ClockTime::at_hour(11),
            -0.1,
        );
        assert!(matches!(result, Err(ParseError::InvalidEnergy(_))));
    }

    #[test]
    fn lies_within_is_half_open() {
        let interval = Interval::try_new(
            date(2024, 6, 10),
            ClockTime::from_hms(5, 30, 0).unwrap(),
            ClockTime::at_hour(6),
            0.2,
        )
        .unwrap();
        assert!(interval.lies_within(ClockTime::MIDNIGHT, ClockTime::at_hour(6)));
        assert!(!interval.lies_within(ClockTime::at_hour(6), ClockTime::END_OF_DAY));
    }
}
