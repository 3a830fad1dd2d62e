//! Reads interval rows out of the utility's spreadsheet export.
//!
//! The export starts with a fixed number of non-data lines, then a header,
//! then one row per interval. Only four columns matter:
//! `DATE`, `START TIME`, `END TIME` and `IMPORT (KWH)`.

use std::io::{BufRead, BufReader, Read};

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};
use tracing::{debug, info, warn};

use crate::{
    config::{Config, DEFAULT_PREAMBLE_LINES, default_date_formats},
    error::{LoadError, ParseError},
    interval::{ClockTime, Interval},
};

const DATE: &str = "DATE";
const START_TIME: &str = "START TIME";
const END_TIME: &str = "END TIME";
const IMPORT_KWH: &str = "IMPORT (KWH)";

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Positions of the required columns in a data row.
///
/// A column absent from the header stays `None`; every row then fails to
/// parse on it and is skipped like any other malformed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    date: Option<usize>,
    start_time: Option<usize>,
    end_time: Option<usize>,
    import_kwh: Option<usize>,
}

impl Columns {
    /// Looks the required columns up by name, ignoring case, surrounding
    /// whitespace and a stray byte-order mark.
    #[must_use]
    pub fn from_headers(headers: &StringRecord) -> Self {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |name: &str| normalized.iter().position(|header| header == name);
        Self {
            date: find(DATE),
            start_time: find(START_TIME),
            end_time: find(END_TIME),
            import_kwh: find(IMPORT_KWH),
        }
    }

    /// Names of the required columns the header does not have.
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (DATE, self.date),
            (START_TIME, self.start_time),
            (END_TIME, self.end_time),
            (IMPORT_KWH, self.import_kwh),
        ]
        .into_iter()
        .filter_map(|(name, index)| index.is_none().then_some(name))
        .collect()
    }
}

fn normalize_header(raw: &str) -> String {
    raw.replace(BYTE_ORDER_MARK, "").trim().to_uppercase()
}

/// Appends `:00` to `HH:MM` values; leaves `HH:MM:SS` alone.
fn with_seconds(raw: &str) -> String {
    if raw.matches(':').count() == 1 { format!("{raw}:00") } else { raw.to_string() }
}

fn field<'r>(
    record: &'r StringRecord,
    index: Option<usize>,
    name: &'static str,
) -> Result<&'r str, ParseError> {
    let index = index.ok_or(ParseError::MissingColumn(name))?;
    record
        .get(index)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ParseError::MissingValue(name))
}

fn parse_date(raw: &str, formats: &[String]) -> Result<NaiveDate, ParseError> {
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .ok_or_else(|| ParseError::InvalidDate(raw.to_string()))
}

/// Turns one data row into an [`Interval`].
///
/// An end time of `00:00` after a non-midnight start closes the day and is
/// read as `24:00:00`.
///
/// # Errors
///
/// A required column absent from the header, any missing or unparseable
/// value, or an interval that violates
/// [`Interval::try_new`].
pub fn parse_row(
    record: &StringRecord,
    columns: &Columns,
    date_formats: &[String],
) -> Result<Interval, ParseError> {
    let date = parse_date(field(record, columns.date, DATE)?, date_formats)?;
    let start_time: ClockTime = with_seconds(field(record, columns.start_time, START_TIME)?).parse()?;
    let mut end_time: ClockTime = with_seconds(field(record, columns.end_time, END_TIME)?).parse()?;
    if end_time == ClockTime::MIDNIGHT && start_time > ClockTime::MIDNIGHT {
        end_time = ClockTime::END_OF_DAY;
    }

    let raw_kwh = field(record, columns.import_kwh, IMPORT_KWH)?;
    let energy_kwh = raw_kwh
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidEnergy(raw_kwh.to_string()))?;

    Interval::try_new(date, start_time, end_time, energy_kwh)
}

/// A row that was skipped, with its 1-based line number in the source.
#[derive(Debug)]
pub struct RowError {
    pub line: u64,
    pub error: ParseError,
}

/// Loader settings for one export layout.
#[derive(Debug, Clone)]
pub struct IntervalLoader {
    preamble_lines: usize,
    date_formats: Vec<String>,
}

impl Default for IntervalLoader {
    fn default() -> Self {
        Self::new(DEFAULT_PREAMBLE_LINES)
    }
}

impl From<&Config> for IntervalLoader {
    fn from(config: &Config) -> Self {
        Self { preamble_lines: config.preamble_lines, date_formats: config.date_formats.clone() }
    }
}

impl IntervalLoader {
    #[must_use]
    pub fn new(preamble_lines: usize) -> Self {
        Self { preamble_lines, date_formats: default_date_formats() }
    }

    #[must_use]
    pub fn with_date_formats(mut self, date_formats: Vec<String>) -> Self {
        self.date_formats = date_formats;
        self
    }

    /// Skips the preamble, reads the header and returns a lazy row iterator.
    ///
    /// A source that ends before the header yields no rows.
    ///
    /// # Errors
    ///
    /// I/O failures while skipping the preamble or an unreadable header.
    pub fn open<R: Read>(&self, source: R) -> Result<IntervalReader<BufReader<R>>, LoadError> {
        let mut reader = BufReader::new(source);
        let mut skipped = Vec::new();
        for _ in 0..self.preamble_lines {
            skipped.clear();
            if reader.read_until(b'\n', &mut skipped)? == 0 {
                break;
            }
        }

        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers().map_err(LoadError::Header)?;
        let columns = if headers.iter().all(|header| normalize_header(header).is_empty()) {
            debug!("no header line, treating input as empty");
            None
        } else {
            let columns = Columns::from_headers(headers);
            for column in columns.missing() {
                warn!(column, "header lacks a required column, every row will be skipped");
            }
            Some(columns)
        };

        Ok(IntervalReader {
            records: csv_reader.into_records(),
            columns,
            date_formats: self.date_formats.clone(),
            line_offset: self.preamble_lines as u64,
        })
    }

    /// Reads every row, logging and counting the ones that fail to parse.
    ///
    /// # Errors
    ///
    /// See [`IntervalLoader::open`]. Row failures are not errors.
    pub fn load<R: Read>(&self, source: R) -> Result<LoadOutcome, LoadError> {
        let mut outcome = LoadOutcome::default();
        for row in self.open(source)? {
            match row {
                Ok(interval) => outcome.intervals.push(interval),
                Err(RowError { line, error }) => {
                    warn!(line, %error, "skipping row");
                    outcome.skipped += 1;
                }
            }
        }
        info!(loaded = outcome.intervals.len(), skipped = outcome.skipped, "read intervals");
        Ok(outcome)
    }
}

#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub intervals: Vec<Interval>,
    pub skipped: usize,
}

/// Lazily parses data rows. Blank rows are passed over silently.
pub struct IntervalReader<R> {
    records: StringRecordsIntoIter<R>,
    columns: Option<Columns>,
    date_formats: Vec<String>,
    line_offset: u64,
}

impl<R: Read> Iterator for IntervalReader<R> {
    type Item = Result<Interval, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        let columns = self.columns?;
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(error) => {
                    let line = error.position().map_or(0, csv::Position::line) + self.line_offset;
                    return Some(Err(RowError { line, error: error.into() }));
                }
            };
            if record.iter().all(str::is_empty) {
                continue;
            }
            let line = record.position().map_or(0, csv::Position::line) + self.line_offset;
            return Some(
                parse_row(&record, &columns, &self.date_formats)
                    .map_err(|error| RowError { line, error }),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREAMBLE: &str = "Account,123\nMeter,456\nName,Someone\nAddress,Somewhere\nFrom,2024-06-01\nTo,2024-06-30\n";

    fn load(body: &str) -> LoadOutcome {
        IntervalLoader::default().load(format!("{PREAMBLE}{body}").as_bytes()).unwrap()
    }

    #[test]
    fn reads_rows_after_preamble() {
        let outcome = load(
            "DATE,START TIME,END TIME,IMPORT (KWH),EXPORT (KWH)\n\
             2024-06-10,18:00,18:30,2.0,0\n\
             2024-06-10,02:00,02:30,0.5,0\n",
        );
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.intervals.len(), 2);
        let first = &outcome.intervals[0];
        assert_eq!(first.start_time.to_string(), "18:00:00");
        assert_eq!(first.end_time.to_string(), "18:30:00");
        assert_eq!(first.energy_kwh, 2.0);
        assert_eq!(first.period_label, None);
    }

    #[test]
    fn header_lookup_ignores_case_whitespace_and_bom() {
        let outcome = load(
            "\u{feff}date , Start Time,end time,  import (kWh)\n\
             2024-06-10,18:00,18:30,2.0\n",
        );
        assert_eq!(outcome.intervals.len(), 1);
    }

    #[test]
    fn bom_without_preamble() {
        let input = "\u{feff}DATE,START TIME,END TIME,IMPORT (KWH)\n06/10/2024,18:00,18:30,2.0\n";
        let outcome = IntervalLoader::new(0).load(input.as_bytes()).unwrap();
        assert_eq!(outcome.intervals.len(), 1);
        assert_eq!(outcome.intervals[0].date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
    }

    #[test]
    fn non_numeric_energy_is_skipped() {
        let outcome = load(
            "DATE,START TIME,END TIME,IMPORT (KWH)\n\
             2024-06-10,18:00,18:30,n/a\n\
             2024-06-10,18:30,19:00,1.5\n",
        );
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.intervals.len(), 1);
        assert_eq!(outcome.intervals[0].energy_kwh, 1.5);
    }

    #[test]
    fn row_errors_carry_source_line() {
        let input = format!(
            "{PREAMBLE}DATE,START TIME,END TIME,IMPORT (KWH)\n2024-06-10,18:00,18:30,1\n2024-13-40,18:30,19:00,1\n"
        );
        let rows: Vec<_> = IntervalLoader::default().open(input.as_bytes()).unwrap().collect();
        assert!(rows[0].is_ok());
        let error = rows[1].as_ref().unwrap_err();
        assert_eq!(error.line, 9);
        assert!(matches!(error.error, ParseError::InvalidDate(_)));
    }

    #[test]
    fn short_row_is_a_missing_value() {
        let outcome = load("DATE,START TIME,END TIME,IMPORT (KWH)\n2024-06-10,18:00\n");
        assert_eq!(outcome.skipped, 1);
        assert!(outcome.intervals.is_empty());
    }

    #[test]
    fn missing_header_column_skips_every_row() {
        let outcome = load(
            "DATE,START TIME,END TIME\n\
             2024-06-10,18:00,18:30\n\
             2024-06-10,18:30,19:00\n",
        );
        assert!(outcome.intervals.is_empty());
        assert_eq!(outcome.skipped, 2);
    }

    #[test]
    fn missing_header_column_is_reported_per_row() {
        let input = format!("{PREAMBLE}DATE,START TIME,END TIME\n2024-06-10,18:00,18:30\n");
        let rows: Vec<_> = IntervalLoader::default().open(input.as_bytes()).unwrap().collect();
        assert_eq!(rows.len(), 1);
        let error = rows[0].as_ref().unwrap_err();
        assert_eq!(error.line, 8);
        assert!(matches!(error.error, ParseError::MissingColumn(IMPORT_KWH)));
    }

    #[test]
    fn lists_missing_columns() {
        let headers = StringRecord::from(vec!["Date", "Import (kWh)"]);
        assert_eq!(Columns::from_headers(&headers).missing(), vec![START_TIME, END_TIME]);
    }

    #[test]
    fn new_uses_default_date_formats() {
        let input = "DATE,START TIME,END TIME,IMPORT (KWH)\n06/10/2024,18:00,18:30,1\n";
        let outcome = IntervalLoader::new(0).load(input.as_bytes()).unwrap();
        assert_eq!(outcome.intervals.len(), 1);
    }

    #[test]
    fn header_only_is_empty() {
        let outcome = load("DATE,START TIME,END TIME,IMPORT (KWH)\n");
        assert!(outcome.intervals.is_empty());
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn truncated_source_is_empty() {
        let outcome = IntervalLoader::default().load("Account,123\n".as_bytes()).unwrap();
        assert!(outcome.intervals.is_empty());
    }

    #[test]
    fn blank_rows_are_ignored() {
        let outcome = load(
            "DATE,START TIME,END TIME,IMPORT (KWH)\n\
             2024-06-10,23:30,00:00,0.4\n\
             ,,,\n",
        );
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.intervals.len(), 1);
        assert_eq!(outcome.intervals[0].end_time, ClockTime::END_OF_DAY);
    }

    #[test]
    fn keeps_existing_seconds() {
        assert_eq!(with_seconds("10:00"), "10:00:00");
        assert_eq!(with_seconds("10:00:30"), "10:00:30");
    }

    #[test]
    fn custom_date_formats() {
        let loader = IntervalLoader::new(0).with_date_formats(vec!["%d.%m.%Y".to_string()]);
        let input = "DATE,START TIME,END TIME,IMPORT (KWH)\n10.06.2024,18:00,18:30,1\n2024-06-10,18:00,18:30,1\n";
        let outcome = loader.load(input.as_bytes()).unwrap();
        assert_eq!(outcome.intervals.len(), 1);
        assert_eq!(outcome.skipped, 1);
    }
}
