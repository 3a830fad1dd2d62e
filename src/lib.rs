//! Time-of-use savings estimate for interval meter exports.
//!
//! Readings are loaded from the utility's spreadsheet export, labeled with a
//! billing period and priced against both a flat and a time-of-use plan.

pub mod calendar;
pub mod classify;
pub mod config;
pub mod error;
pub mod interval;
pub mod loader;
pub mod report;

use crate::{
    calendar::HolidayCalendar,
    classify::classify_all,
    config::{RatePlan, UnclassifiedPolicy},
    interval::Interval,
    report::UsageReport,
};

/// Classifies `intervals` in place and prices them.
#[must_use]
pub fn evaluate(
    intervals: &mut [Interval],
    calendar: &HolidayCalendar,
    rates: &RatePlan,
    policy: UnclassifiedPolicy,
) -> UsageReport {
    classify_all(intervals, calendar);
    UsageReport::from_intervals(intervals, rates, policy)
}
