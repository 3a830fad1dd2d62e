//! Holiday calendar: dates billed as if they were Sundays.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, Weekday};

/// Holidays of the reference tariff, `(year, [(month, day)])`.
pub const REFERENCE_HOLIDAYS: &[(i32, &[(u32, u32)])] = &[
    (
        2024,
        &[
            (1, 1),
            (1, 15),
            (2, 19),
            (5, 27),
            (6, 19),
            (7, 4),
            (9, 2),
            (10, 14),
            (11, 11),
            (11, 28),
            (11, 29),
            (12, 25),
        ],
    ),
    (
        2025,
        &[
            (1, 1),
            (1, 20),
            (2, 17),
            (5, 26),
            (6, 19),
            (7, 4),
            (9, 1),
            (10, 13),
            (11, 11),
            (11, 27),
            (11, 28),
            (12, 25),
        ],
    ),
];

/// Set of holiday dates, grouped by year so that adding a year never touches
/// the others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayCalendar {
    by_year: BTreeMap<i32, BTreeSet<NaiveDate>>,
}

impl HolidayCalendar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calendar built from [`REFERENCE_HOLIDAYS`].
    #[must_use]
    pub fn reference() -> Self {
        REFERENCE_HOLIDAYS
            .iter()
            .flat_map(|(year, days)| {
                days.iter()
                    .filter_map(|&(month, day)| NaiveDate::from_ymd_opt(*year, month, day))
            })
            .collect()
    }

    pub fn insert(&mut self, date: NaiveDate) {
        self.by_year.entry(date.year()).or_default().insert(date);
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.by_year.get(&date.year()).is_some_and(|dates| dates.contains(&date))
    }

    /// Sundays and holidays share one tariff.
    #[must_use]
    pub fn is_sunday_or_holiday(&self, date: NaiveDate) -> bool {
        date.weekday() == Weekday::Sun || self.contains(date)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.by_year.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_year.values().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_year.is_empty()
    }
}

impl FromIterator<NaiveDate> for HolidayCalendar {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        let mut calendar = Self::new();
        iter.into_iter().for_each(|date| calendar.insert(date));
        calendar
    }
}

impl Extend<NaiveDate> for HolidayCalendar {
    fn extend<I: IntoIterator<Item = NaiveDate>>(&mut self, iter: I) {
        iter.into_iter().for_each(|date| self.insert(date));
    }
}
