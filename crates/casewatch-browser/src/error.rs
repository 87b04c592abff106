use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    LaunchError(String),

    #[error("chromium error: {0}")]
    ChromiumError(String),

    #[error("navigation failed: {0}")]
    NavigationError(String),

    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    #[error("option '{value}' not available in {selector}")]
    OptionNotFound { selector: String, value: String },

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("script evaluation failed: {0}")]
    ScriptError(String),
}

impl BrowserError {
    /// True when the page is missing something the caller expected to be there.
    #[must_use]
    pub fn is_missing_element(&self) -> bool {
        matches!(
            self,
            Self::SelectorNotFound(_) | Self::OptionNotFound { .. }
        )
    }
}
