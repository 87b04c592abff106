//! Core error types for casewatch.
//!
//! Validation problems are collected rather than short-circuited so a caller
//! can show every issue with a query at once.

use thiserror::Error;

/// Earliest filing year accepted by the court lookup.
pub const MIN_FILING_YEAR: i32 = 2000;

/// Maximum number of digits in a case number.
pub const MAX_CASE_NUMBER_LEN: usize = 10;

/// A single problem with a case query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Case type is not one of the fixed codes
    #[error("invalid case type: '{0}'")]
    InvalidCaseType(String),

    /// Case number is empty
    #[error("case number is required")]
    EmptyCaseNumber,

    /// Case number contains something other than ASCII digits
    #[error("case number must contain only digits")]
    NonNumericCaseNumber,

    /// Case number has more than [`MAX_CASE_NUMBER_LEN`] digits
    #[error("case number too long: {len} digits (max {MAX_CASE_NUMBER_LEN})")]
    CaseNumberTooLong {
        /// Number of characters supplied
        len: usize,
    },

    /// Filing year could not be read as an integer
    #[error("invalid filing year: '{0}'")]
    InvalidFilingYear(String),

    /// Filing year falls outside the accepted range
    #[error("filing year must be between {min} and {max}, got {year}")]
    FilingYearOutOfRange {
        /// Year supplied
        year: i32,
        /// Lower bound (inclusive)
        min: i32,
        /// Upper bound (inclusive), the current year
        max: i32,
    },
}

/// Every problem found while validating a query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", join_messages(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    /// Iterate over the individual errors.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// Number of problems found.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no problems were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Config file not found
    #[error("config file not found at {path}")]
    NotFound {
        /// Path where config was expected
        path: String,
    },

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Central error type for core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Query validation errors
    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
