//! Browser automation engine for the court case-status form.
//!
//! Provides headless browser control behind the [`BrowserActions`] trait,
//! with per-session fingerprints and bounded waits.

pub mod actions;
pub mod engine;
pub mod error;
pub mod fingerprint;

pub use actions::{extract_domain, resolve_url, BrowserActions, PageCookie};
pub use engine::{BrowserEngine, BrowserLauncher, ChromiumLauncher, LaunchOptions};
pub use error::{BrowserError, Result};
pub use fingerprint::FingerprintConfig;
