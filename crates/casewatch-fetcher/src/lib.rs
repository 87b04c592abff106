//! Casewatch Fetcher - Case lookup pipeline for the Delhi High Court.
//!
//! This crate turns a validated [`casewatch_core::CaseQuery`] into a
//! [`FetchOutcome`]: it opens a browser and HTTP session, fills the
//! case-status form, resolves the CAPTCHA, and parses the results page. A
//! synthetic mode produces plausible records without any network access.
//!
//! # Features
//!
//! - Explicit lookup state machine recorded on every outcome
//! - CAPTCHA resolution by local OCR with an optional solving service
//! - Site layout described by a replaceable TOML site definition
//! - Typed failures; no placeholder data is ever reported as live
//! - Optional retry of network and timeout failures with linear backoff
//!
//! # Example
//!
//! ```rust,ignore
//! use casewatch_core::{AppConfig, CaseQuery, FetchMode};
//! use casewatch_fetcher::FetchOrchestrator;
//!
//! let config = AppConfig::load()?;
//! let orchestrator = FetchOrchestrator::from_app_config(&config)?;
//!
//! let query = CaseQuery::parse("W.P.(C)", "1234", "2023")?;
//! let outcome = orchestrator.fetch_case(&query, FetchMode::Live).await;
//! println!("{}", serde_json::to_string_pretty(&outcome)?);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod captcha;
#[allow(missing_docs)]
pub mod error;
#[allow(missing_docs)]
pub mod navigator;
pub mod orchestrator;
#[allow(missing_docs)]
pub mod outcome;
pub mod parser;
#[allow(missing_docs)]
pub mod retry;
#[allow(missing_docs)]
pub mod session;
pub mod site;
#[allow(missing_docs)]
pub mod state;
pub mod synthetic;

// Re-export commonly used types
pub use captcha::{CaptchaError, CaptchaResolver, CaptchaStrategy, ExternalService, LocalOcr};
pub use error::{FailureKind, FailureReason, FetchError, Result};
pub use navigator::{FormNavigator, LoadedPage};
pub use orchestrator::FetchOrchestrator;
pub use outcome::{FetchOutcome, FetchResult};
pub use parser::ResultParser;
pub use retry::RetryPolicy;
pub use session::{HttpSession, SessionManager};
pub use site::{FormSelectors, ResultSelectors, SiteDefinition};
pub use state::{FetchProgress, FetchState};
pub use synthetic::SyntheticGenerator;
