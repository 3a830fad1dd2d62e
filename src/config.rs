//! TOML configuration: rates, holidays and the export format.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::{
    calendar::{HolidayCalendar, REFERENCE_HOLIDAYS},
    error::ConfigError,
    interval::PeriodLabel,
};

/// Lines before the header in the utility's spreadsheet export.
///
/// This matches one known export layout. It is not derived from the file.
pub const DEFAULT_PREAMBLE_LINES: usize = 6;

/// Formats tried for the `DATE` column: ISO first, then US month/day/year.
pub const DEFAULT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

#[must_use]
pub fn default_date_formats() -> Vec<String> {
    DEFAULT_DATE_FORMATS.iter().map(ToString::to_string).collect()
}

/// Top-level configuration.
///
/// Every field has a default matching the reference tariff, so an empty file
/// is a valid configuration. A `[holidays]` table replaces the built-in one
/// as a whole.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub preamble_lines: usize,
    /// `chrono` format strings tried in order for the `DATE` column.
    pub date_formats: Vec<String>,
    pub unclassified: UnclassifiedPolicy,
    pub rates: RatePlan,
    /// Year → quoted `YYYY-MM-DD` dates.
    pub holidays: BTreeMap<String, Vec<NaiveDate>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preamble_lines: DEFAULT_PREAMBLE_LINES,
            date_formats: default_date_formats(),
            unclassified: UnclassifiedPolicy::default(),
            rates: RatePlan::default(),
            holidays: reference_holidays(),
        }
    }
}

/// Prices per kWh.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RatePlan {
    /// Pre-TOU price applied to all usage.
    pub flat: f64,
    pub peak: f64,
    pub mid_peak: f64,
    pub off_peak: f64,
}

impl Default for RatePlan {
    fn default() -> Self {
        Self { flat: 0.1375, peak: 0.1656, mid_peak: 0.1449, off_peak: 0.0828 }
    }
}

impl RatePlan {
    /// `None` for [`PeriodLabel::Unclassified`], which has no price of its own.
    #[must_use]
    pub const fn rate(&self, label: PeriodLabel) -> Option<f64> {
        match label {
            PeriodLabel::Peak => Some(self.peak),
            PeriodLabel::MidPeak => Some(self.mid_peak),
            PeriodLabel::OffPeak => Some(self.off_peak),
            PeriodLabel::Unclassified => None,
        }
    }
}

/// What to do with energy that no tariff window claimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnclassifiedPolicy {
    /// Leave it out of the TOU cost.
    #[default]
    Exclude,
    /// Charge it at the flat rate.
    Flat,
}

fn reference_holidays() -> BTreeMap<String, Vec<NaiveDate>> {
    REFERENCE_HOLIDAYS
        .iter()
        .map(|(year, days)| {
            let dates = days
                .iter()
                .filter_map(|&(month, day)| NaiveDate::from_ymd_opt(*year, month, day))
                .collect();
            (year.to_string(), dates)
        })
        .collect()
}

impl Config {
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&content)
    }

    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Checks constraints serde cannot express. Empty when valid.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let rates = [
            ("rates.flat", self.rates.flat),
            ("rates.peak", self.rates.peak),
            ("rates.mid_peak", self.rates.mid_peak),
            ("rates.off_peak", self.rates.off_peak),
        ];
        for (field, rate) in rates {
            if !rate.is_finite() || rate < 0.0 {
                errors.push(ConfigError::invalid(field, format!("must be >= 0, got {rate}")));
            }
        }

        if self.date_formats.is_empty() {
            errors.push(ConfigError::invalid("date_formats", "must list at least one format"));
        }

        for (year, dates) in &self.holidays {
            let field = format!("holidays.{year}");
            match year.parse::<i32>() {
                Ok(year) => {
                    for date in dates.iter().filter(|date| date.year() != year) {
                        errors.push(ConfigError::invalid(
                            field.clone(),
                            format!("{date} is not in {year}"),
                        ));
                    }
                }
                Err(_) => errors.push(ConfigError::invalid(field, "key must be a year")),
            }
        }

        errors
    }

    #[must_use]
    pub fn holiday_calendar(&self) -> HolidayCalendar {
        self.holidays.values().flatten().copied().collect()
    }
}
