//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

/// The six non-data lines the utility export starts with.
pub const PREAMBLE: &str = "\
Name,Jane Doe
Address,1 Main St
Account Number,0000000000
Meter Number,000000
Report Period,2024-01-01 to 2024-12-31
Unit,kWh
";

pub const HEADER: &str = "\u{feff}DATE,START TIME,END TIME,IMPORT (KWH),EXPORT (KWH),NOTES";

/// Builds a full export from `(date, start, end, import)` rows.
pub fn export(rows: &[(&str, &str, &str, &str)]) -> String {
    let mut text = format!("{PREAMBLE}{HEADER}\n");
    for (date, start, end, kwh) in rows {
        text.push_str(&format!("{date},{start},{end},{kwh},0.00,\n"));
    }
    text
}

pub fn write_export(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

/// Every half hour of `date`, each importing `kwh`.
pub fn full_day(date: &'static str, kwh: &'static str) -> Vec<(String, String, String, &'static str)> {
    (0..48u32)
        .map(|slot| {
            let start = format!("{:02}:{:02}", slot / 2, (slot % 2) * 30);
            let end = format!("{:02}:{:02}", (slot + 1) / 2 % 24, ((slot + 1) % 2) * 30);
            (date.to_string(), start, end, kwh)
        })
        .collect()
}
