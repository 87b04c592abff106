//! Result of one lookup.

use crate::error::FailureReason;
use crate::state::FetchState;
use casewatch_core::{CaseRecord, DataSource};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Success with a complete record, or failure with a reason. Never partial.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "data", rename_all = "snake_case")]
pub enum FetchResult {
    Success(CaseRecord),
    Failure(FailureReason),
}

/// A finished lookup, tagged with where its data came from.
#[derive(Debug, Clone, Serialize)]
pub struct FetchOutcome {
    source: DataSource,
    fetched_at: DateTime<Utc>,
    #[serde(flatten)]
    result: FetchResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_reason: Option<FailureReason>,
    states: Vec<FetchState>,
}

impl FetchOutcome {
    pub(crate) fn live_success(record: CaseRecord, states: Vec<FetchState>) -> Self {
        Self::new(DataSource::Live, FetchResult::Success(record), None, states)
    }

    pub(crate) fn live_failure(reason: FailureReason, states: Vec<FetchState>) -> Self {
        Self::new(DataSource::Live, FetchResult::Failure(reason), None, states)
    }

    /// A synthetic record, optionally standing in for a failed live lookup.
    pub(crate) fn synthetic(
        record: CaseRecord,
        fallback_reason: Option<FailureReason>,
        states: Vec<FetchState>,
    ) -> Self {
        Self::new(
            DataSource::Synthetic,
            FetchResult::Success(record),
            fallback_reason,
            states,
        )
    }

    fn new(
        source: DataSource,
        result: FetchResult,
        fallback_reason: Option<FailureReason>,
        states: Vec<FetchState>,
    ) -> Self {
        Self {
            source,
            fetched_at: Utc::now(),
            result,
            fallback_reason,
            states,
        }
    }

    #[must_use]
    pub fn source(&self) -> DataSource {
        self.source
    }

    #[must_use]
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    #[must_use]
    pub fn result(&self) -> &FetchResult {
        &self.result
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.result, FetchResult::Success(_))
    }

    #[must_use]
    pub fn record(&self) -> Option<&CaseRecord> {
        match &self.result {
            FetchResult::Success(record) => Some(record),
            FetchResult::Failure(_) => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.result {
            FetchResult::Success(_) => None,
            FetchResult::Failure(reason) => Some(reason),
        }
    }

    /// The live failure a fallback record replaced.
    #[must_use]
    pub fn fallback_reason(&self) -> Option<&FailureReason> {
        self.fallback_reason.as_ref()
    }

    /// States the lookup passed through, starting at `Idle`.
    ///
    /// A fallback record keeps the trail of the live attempt it replaced,
    /// so that trail ends in `Failed` while the result is a success. The
    /// substitution itself is recorded by [`FetchOutcome::fallback_reason`].
    #[must_use]
    pub fn states(&self) -> &[FetchState] {
        &self.states
    }

    #[must_use]
    pub fn into_result(self) -> FetchResult {
        self.result
    }
}
