use std::path::PathBuf;

use thiserror::Error;

use crate::interval::ClockTime;

/// Why a single data row could not become an [`Interval`](crate::interval::Interval).
///
/// Row failures are recoverable: the loader logs them and moves on.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing value for column `{0}`")]
    MissingValue(&'static str),

    #[error("header has no `{0}` column")]
    MissingColumn(&'static str),

    #[error("invalid date `{0}`")]
    InvalidDate(String),

    #[error("invalid time `{0}`")]
    InvalidTime(String),

    #[error("invalid energy value `{0}`")]
    InvalidEnergy(String),

    #[error("interval {start}..{end} is empty or runs backwards")]
    EmptyInterval { start: ClockTime, end: ClockTime },

    #[error("unreadable record")]
    Csv(#[from] csv::Error),
}

/// Fatal problems with the input source as a whole.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read the preamble")]
    Io(#[from] std::io::Error),

    #[error("failed to read the header line")]
    Header(#[source] csv::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML")]
    Toml(#[from] toml::de::Error),

    /// A field that parsed but violates a constraint, e.g. `rates.peak`.
    #[error("{field}: {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid { field: field.into(), message: message.into() }
    }
}
