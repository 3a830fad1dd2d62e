//! Time-of-use classification.
//!
//! Rules are checked in order and the first match wins:
//!
//! 1. Sunday or holiday, inside `[06:00, 24:00)`: mid-peak.
//! 2. Inside `[00:00, 06:00)`: off-peak, on every day.
//! 3. Inside `[17:00, 21:00)`: peak.
//! 4. Inside `[06:00, 17:00)` or `[21:00, 24:00)`: mid-peak.
//! 5. Anything else, such as an interval straddling a boundary: unclassified.

use tracing::debug;

use crate::{
    calendar::HolidayCalendar,
    interval::{ClockTime, Interval, PeriodLabel},
};

const OFF_PEAK_END: ClockTime = ClockTime::at_hour(6);
const PEAK_START: ClockTime = ClockTime::at_hour(17);
const PEAK_END: ClockTime = ClockTime::at_hour(21);

#[must_use]
pub fn classify(interval: &Interval, calendar: &HolidayCalendar) -> PeriodLabel {
    let within = |from, to| interval.lies_within(from, to);

    if calendar.is_sunday_or_holiday(interval.date) && within(OFF_PEAK_END, ClockTime::END_OF_DAY) {
        PeriodLabel::MidPeak
    } else if within(ClockTime::MIDNIGHT, OFF_PEAK_END) {
        PeriodLabel::OffPeak
    } else if within(PEAK_START, PEAK_END) {
        PeriodLabel::Peak
    } else if within(OFF_PEAK_END, PEAK_START) || within(PEAK_END, ClockTime::END_OF_DAY) {
        PeriodLabel::MidPeak
    } else {
        debug!(
            date = %interval.date,
            start = %interval.start_time,
            end = %interval.end_time,
            "interval matches no tariff window"
        );
        PeriodLabel::Unclassified
    }
}

/// Labels every interval in place. Existing labels are overwritten.
pub fn classify_all(intervals: &mut [Interval], calendar: &HolidayCalendar) {
    for interval in intervals {
        interval.period_label = Some(classify(interval, calendar));
    }
}
