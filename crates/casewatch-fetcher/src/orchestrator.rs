//! Fetch orchestrator.
//!
//! Runs one lookup end to end: session, form, CAPTCHA, parse. Each live
//! lookup owns its browser and HTTP session for the duration of the call and
//! closes the browser on every exit path.

use crate::captcha::CaptchaResolver;
use crate::error::{FailureReason, FetchError, Result};
use crate::navigator::FormNavigator;
use crate::outcome::FetchOutcome;
use crate::parser::ResultParser;
use crate::retry::RetryPolicy;
use crate::session::{HttpSession, SessionManager};
use crate::site::SiteDefinition;
use crate::state::{FetchProgress, FetchState};
use crate::synthetic::SyntheticGenerator;
use casewatch_browser::{
    BrowserActions, BrowserLauncher, ChromiumLauncher, FingerprintConfig, LaunchOptions,
};
use casewatch_core::{AppConfig, CaseQuery, CaseRecord, FetchConfig, FetchMode};
use std::sync::Arc;

/// Coordinates case lookups.
///
/// Holds only configuration, so one instance can serve concurrent lookups
/// behind an `Arc`.
pub struct FetchOrchestrator {
    config: FetchConfig,
    site: SiteDefinition,
    launcher: Arc<dyn BrowserLauncher>,
    sessions: SessionManager,
    resolver: CaptchaResolver,
    synthetic: SyntheticGenerator,
}

impl FetchOrchestrator {
    /// Create an orchestrator that opens browsers through `launcher`.
    ///
    /// Loads the site definition file when one is configured.
    pub fn new(config: FetchConfig, launcher: Arc<dyn BrowserLauncher>) -> Result<Self> {
        let site = match &config.site_definition {
            Some(path) => SiteDefinition::load(path)?,
            None => SiteDefinition::default(),
        };

        Ok(Self {
            sessions: SessionManager::new(config.request_timeout()),
            resolver: CaptchaResolver::from_config(&config)?,
            synthetic: SyntheticGenerator::new(config.synthetic_seed),
            site,
            launcher,
            config,
        })
    }

    /// Create an orchestrator driving a local Chromium.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        let launcher = ChromiumLauncher::new(LaunchOptions {
            headless: config.browser.headless,
            window_width: config.browser.window_width,
            window_height: config.browser.window_height,
            chrome_executable: config.browser.chrome_executable.clone(),
        });
        Self::new(config.fetch.clone(), Arc::new(launcher))
    }

    /// Replace the site definition.
    #[must_use]
    pub fn with_site(mut self, site: SiteDefinition) -> Self {
        self.site = site;
        self
    }

    /// Replace the CAPTCHA strategies.
    #[must_use]
    pub fn with_resolver(mut self, resolver: CaptchaResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Mode used by [`FetchOrchestrator::fetch`].
    #[must_use]
    pub fn mode(&self) -> FetchMode {
        self.config.mode
    }

    #[must_use]
    pub fn site(&self) -> &SiteDefinition {
        &self.site
    }

    /// Look up a case in the configured mode.
    pub async fn fetch(&self, query: &CaseQuery) -> FetchOutcome {
        self.fetch_case(query, self.config.mode).await
    }

    /// Look up a case in `mode`.
    pub async fn fetch_case(&self, query: &CaseQuery, mode: FetchMode) -> FetchOutcome {
        self.fetch_case_with_retry(query, mode, &RetryPolicy::none())
            .await
    }

    /// Look up a case in `mode`, retrying transient live failures per `policy`.
    ///
    /// In fallback mode the synthetic record is produced only after the
    /// retries are exhausted.
    pub async fn fetch_case_with_retry(
        &self,
        query: &CaseQuery,
        mode: FetchMode,
        policy: &RetryPolicy,
    ) -> FetchOutcome {
        tracing::info!(case = %query, mode = %mode, "fetching case");

        let outcome = match mode {
            FetchMode::Synthetic => self.fetch_synthetic(query, None, Vec::new()),
            FetchMode::Live => policy.run(move || self.fetch_live(query)).await,
            FetchMode::Fallback => {
                let live = policy.run(move || self.fetch_live(query)).await;
                match live.failure() {
                    Some(reason) => {
                        tracing::warn!(case = %query, reason = %reason, "live lookup failed, using synthetic record");
                        let reason = reason.clone();
                        self.fetch_synthetic(query, Some(reason), live.states().to_vec())
                    }
                    None => live,
                }
            }
        };

        tracing::info!(
            case = %query,
            source = %outcome.source(),
            success = outcome.is_success(),
            "fetch finished"
        );
        outcome
    }

    /// Synthetic lookups skip every network step: `Idle → Done`.
    ///
    /// A fallback record keeps the trail of the live attempt it replaced,
    /// ending in that attempt's `Failed` state.
    fn fetch_synthetic(
        &self,
        query: &CaseQuery,
        fallback_reason: Option<FailureReason>,
        live_trail: Vec<FetchState>,
    ) -> FetchOutcome {
        let today = chrono::Local::now().date_naive();
        let record = self.synthetic.generate(query, today);

        let states = if live_trail.is_empty() {
            let mut progress = FetchProgress::new();
            progress.advance(FetchState::Done);
            progress.into_trail()
        } else {
            live_trail
        };

        FetchOutcome::synthetic(record, fallback_reason, states)
    }

    async fn fetch_live(&self, query: &CaseQuery) -> FetchOutcome {
        let mut progress = FetchProgress::new();

        match self.run_live(query, &mut progress).await {
            Ok(record) => {
                progress.advance(FetchState::Done);
                FetchOutcome::live_success(record, progress.into_trail())
            }
            Err(e) => {
                tracing::warn!(case = %query, kind = %e.kind(), error = %e, "live lookup failed");
                progress.fail(e.kind());
                FetchOutcome::live_failure(FailureReason::from(&e), progress.into_trail())
            }
        }
    }

    async fn run_live(&self, query: &CaseQuery, progress: &mut FetchProgress) -> Result<CaseRecord> {
        let fingerprint = FingerprintConfig::randomized();
        let http = self.sessions.create_session(&fingerprint)?;
        let browser = self
            .launcher
            .launch(&fingerprint)
            .await
            .map_err(|e| FetchError::SessionUnavailable(e.to_string()))?;
        progress.advance(FetchState::SessionOpen);

        let result = self.drive(browser.as_ref(), &http, query, progress).await;

        if let Err(e) = browser.close().await {
            tracing::warn!(error = %e, "failed to close browser");
        }

        result
    }

    async fn drive(
        &self,
        browser: &dyn BrowserActions,
        http: &HttpSession,
        query: &CaseQuery,
        progress: &mut FetchProgress,
    ) -> Result<CaseRecord> {
        let navigator = FormNavigator::new(&self.site, self.config.request_timeout());
        let page = navigator
            .submit_query(browser, http, &self.resolver, query, progress)
            .await?;

        let record = ResultParser::new(&self.site.results).parse(&page.html, query)?;
        progress.advance(FetchState::Parsed);
        Ok(record)
    }
}
