//! Lookup state machine.
//!
//! `Idle → SessionOpen → FormSubmitted → (CaptchaPending →)? ResultsLoaded →
//! Parsed → Done`, with `Failed` reachable from every non-terminal state.
//! Synthetic lookups go straight from `Idle` to `Done`.

use crate::error::FailureKind;
use serde::Serialize;
use std::fmt;

/// A step of a single lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum FetchState {
    /// Nothing started
    Idle,
    /// Browser and HTTP sessions acquired
    SessionOpen,
    /// Query fields entered into the search form
    FormSubmitted,
    /// A CAPTCHA challenge is being resolved
    CaptchaPending,
    /// The results (or not-found) page has rendered
    ResultsLoaded,
    /// A record was extracted from the page
    Parsed,
    /// Finished successfully
    Done,
    /// Finished with a failure
    Failed(FailureKind),
}

impl FetchState {
    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_advance_to(self, next: FetchState) -> bool {
        use FetchState::{
            CaptchaPending, Done, Failed, FormSubmitted, Idle, Parsed, ResultsLoaded, SessionOpen,
        };

        match (self, next) {
            (Done | Failed(_), _) => false,
            (_, Failed(_)) => true,
            (Idle, SessionOpen | Done)
            | (SessionOpen, FormSubmitted)
            | (FormSubmitted, CaptchaPending | ResultsLoaded)
            | (CaptchaPending, ResultsLoaded)
            | (ResultsLoaded, Parsed)
            | (Parsed, Done) => true,
            _ => false,
        }
    }

    /// True for `Done` and `Failed`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::SessionOpen => f.write_str("session_open"),
            Self::FormSubmitted => f.write_str("form_submitted"),
            Self::CaptchaPending => f.write_str("captcha_pending"),
            Self::ResultsLoaded => f.write_str("results_loaded"),
            Self::Parsed => f.write_str("parsed"),
            Self::Done => f.write_str("done"),
            Self::Failed(kind) => write!(f, "failed({kind})"),
        }
    }
}

/// Records the path a lookup takes through [`FetchState`].
#[derive(Debug, Clone)]
pub struct FetchProgress {
    trail: Vec<FetchState>,
}

impl Default for FetchProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchProgress {
    #[must_use]
    pub fn new() -> Self {
        Self {
            trail: vec![FetchState::Idle],
        }
    }

    #[must_use]
    pub fn current(&self) -> FetchState {
        self.trail.last().copied().unwrap_or(FetchState::Idle)
    }

    /// Move to `next`. Illegal transitions are a bug in the caller.
    pub fn advance(&mut self, next: FetchState) {
        let current = self.current();
        debug_assert!(
            current.can_advance_to(next),
            "illegal transition {current} -> {next}"
        );
        if !current.can_advance_to(next) {
            tracing::error!(from = %current, to = %next, "illegal fetch state transition");
        }
        tracing::debug!(from = %current, to = %next, "fetch state");
        self.trail.push(next);
    }

    /// Move to `Failed(kind)` unless already terminal.
    pub fn fail(&mut self, kind: FailureKind) {
        if !self.current().is_terminal() {
            self.advance(FetchState::Failed(kind));
        }
    }

    #[must_use]
    pub fn trail(&self) -> &[FetchState] {
        &self.trail
    }

    #[must_use]
    pub fn into_trail(self) -> Vec<FetchState> {
        self.trail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_path_with_captcha() {
        let mut progress = FetchProgress::new();
        for state in [
            FetchState::SessionOpen,
            FetchState::FormSubmitted,
            FetchState::CaptchaPending,
            FetchState::ResultsLoaded,
            FetchState::Parsed,
            FetchState::Done,
        ] {
            progress.advance(state);
        }
        assert_eq!(progress.current(), FetchState::Done);
        assert_eq!(progress.trail().len(), 7);
    }

    #[test]
    fn test_transitions() {
        assert!(FetchState::FormSubmitted.can_advance_to(FetchState::ResultsLoaded));
        assert!(FetchState::Idle.can_advance_to(FetchState::Done));
        assert!(!FetchState::Idle.can_advance_to(FetchState::Parsed));
        assert!(!FetchState::CaptchaPending.can_advance_to(FetchState::FormSubmitted));
        assert!(FetchState::CaptchaPending
            .can_advance_to(FetchState::Failed(FailureKind::CaptchaUnsolved)));
        assert!(!FetchState::Done.can_advance_to(FetchState::Failed(FailureKind::Parse)));
    }

    #[test]
    fn test_fail_is_idempotent() {
        let mut progress = FetchProgress::new();
        progress.advance(FetchState::SessionOpen);
        progress.fail(FailureKind::Timeout);
        progress.fail(FailureKind::Network);
        assert_eq!(
            progress.into_trail(),
            vec![
                FetchState::Idle,
                FetchState::SessionOpen,
                FetchState::Failed(FailureKind::Timeout)
            ]
        );
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_value(FetchState::Failed(FailureKind::Parse)).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["reason"], "parse");
        let json = serde_json::to_value(FetchState::ResultsLoaded).unwrap();
        assert_eq!(json["state"], "results_loaded");
    }
}
