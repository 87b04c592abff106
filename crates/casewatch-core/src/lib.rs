//! Casewatch Core - Foundation crate for the court case lookup pipeline.
//!
//! This crate provides the shared case types, query validation, record model
//! and configuration that the other casewatch crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Validation and configuration errors using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - The case-type enumeration and validated [`CaseQuery`]
//! - [`record`] - [`CaseRecord`] and its order/history entries
//!
//! # Example
//!
//! ```rust
//! use casewatch_core::{list_case_types, CaseQuery};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! assert_eq!(list_case_types().len(), 17);
//!
//! let query = CaseQuery::parse("W.P.(C)", "1234", "2023")?;
//! assert_eq!(query.display_number(), "W.P.(C) 1234/2023");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
#[allow(missing_docs)]
pub mod record;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BrowserConfig, FetchConfig, FetchMode, DEFAULT_REQUEST_TIMEOUT_MS};
pub use error::{
    ConfigError, ConfigResult, CoreError, Result, ValidationError, ValidationErrors,
    MAX_CASE_NUMBER_LEN, MIN_FILING_YEAR,
};
pub use record::{CaseRecord, DataSource, HistoryEvent, OrderRecord, RecordViolation, Urgency};
pub use types::{list_case_types, CaseQuery, CaseType, CaseTypeOption};
