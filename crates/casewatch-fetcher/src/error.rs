use casewatch_browser::BrowserError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("navigation error: {0}")]
    Navigation(String),

    #[error("CAPTCHA unsolved after trying: {}", .strategies.join(", "))]
    CaptchaUnsolved { strategies: Vec<String> },

    #[error("parse error in {field}: {reason}")]
    Parse { field: String, reason: String },

    #[error("no case found for {0}")]
    CaseNotFound(String),

    #[error("browser session unavailable: {0}")]
    SessionUnavailable(String),

    #[error("site definition error in {path}: {reason}")]
    SiteDefinition { path: String, reason: String },
}

impl FetchError {
    pub(crate) fn parse(field: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network(_) => FailureKind::Network,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::Navigation(_) => FailureKind::Navigation,
            Self::CaptchaUnsolved { .. } => FailureKind::CaptchaUnsolved,
            Self::Parse { .. } => FailureKind::Parse,
            Self::CaseNotFound(_) => FailureKind::NotFound,
            Self::SessionUnavailable(_) => FailureKind::SessionUnavailable,
            Self::SiteDefinition { .. } => FailureKind::Configuration,
        }
    }

    /// Transient failures a calling policy may retry with backoff.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl From<BrowserError> for FetchError {
    fn from(err: BrowserError) -> Self {
        if err.is_missing_element() {
            return Self::Navigation(err.to_string());
        }
        match err {
            BrowserError::LaunchError(msg) => Self::SessionUnavailable(msg),
            BrowserError::Timeout(msg) => Self::Timeout(msg),
            BrowserError::NavigationError(msg) | BrowserError::ChromiumError(msg) => {
                Self::Network(msg)
            }
            e => Self::Navigation(e.to_string()),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Category of a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    Timeout,
    Navigation,
    CaptchaUnsolved,
    Parse,
    NotFound,
    SessionUnavailable,
    Configuration,
}

impl FailureKind {
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Timeout)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Navigation => "navigation",
            Self::CaptchaUnsolved => "captcha_unsolved",
            Self::Parse => "parse",
            Self::NotFound => "not_found",
            Self::SessionUnavailable => "session_unavailable",
            Self::Configuration => "configuration",
        };
        f.write_str(name)
    }
}

/// Serializable summary of a [`FetchError`] carried by an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&FetchError> for FailureReason {
    fn from(err: &FetchError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
