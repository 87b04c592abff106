//! Drives the case-status search form up to a rendered results page.

use crate::captcha::CaptchaResolver;
use crate::error::{FetchError, Result};
use crate::parser::ResultParser;
use crate::session::HttpSession;
use crate::site::SiteDefinition;
use crate::state::{FetchProgress, FetchState};
use casewatch_browser::{resolve_url, BrowserActions, BrowserError};
use casewatch_core::CaseQuery;
use std::time::Duration;
use tokio::time::Instant;

/// Longest single selector wait between checks of the page text.
const OUTCOME_POLL: Duration = Duration::from_millis(500);

/// HTML of the page the search landed on.
#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub url: String,
    pub html: String,
}

/// Fills and submits the search form described by a [`SiteDefinition`].
pub struct FormNavigator<'a> {
    site: &'a SiteDefinition,
    timeout_ms: u64,
}

impl<'a> FormNavigator<'a> {
    /// Every wait and navigation is bounded by `timeout`.
    #[must_use]
    pub fn new(site: &'a SiteDefinition, timeout: Duration) -> Self {
        Self {
            site,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Enter `query`, clear any CAPTCHA, submit, and wait for the outcome page.
    ///
    /// The form is never submitted while a CAPTCHA remains unanswered.
    pub async fn submit_query(
        &self,
        browser: &dyn BrowserActions,
        http: &HttpSession,
        resolver: &CaptchaResolver,
        query: &CaseQuery,
        progress: &mut FetchProgress,
    ) -> Result<LoadedPage> {
        let form = &self.site.form;

        browser
            .navigate(&self.site.case_status_url, self.timeout_ms)
            .await?;
        browser
            .wait_for_selector(&form.case_type_select, self.timeout_ms)
            .await?;

        browser
            .select_option(&form.case_type_select, query.case_type().code())
            .await?;
        browser
            .fill_field(&form.case_number_input, query.case_number())
            .await?;
        browser
            .fill_field(&form.filing_year_input, &query.filing_year().to_string())
            .await?;
        progress.advance(FetchState::FormSubmitted);

        if let Some(src) = self.captcha_source(browser).await? {
            progress.advance(FetchState::CaptchaPending);
            self.answer_captcha(browser, http, resolver, &src).await?;
        }

        browser.click(&form.submit_button).await?;
        self.wait_for_outcome(browser).await?;

        let page = LoadedPage {
            url: browser.current_url().await?,
            html: browser.content().await?,
        };
        progress.advance(FetchState::ResultsLoaded);

        tracing::debug!(url = %page.url, bytes = page.html.len(), "results page loaded");
        Ok(page)
    }

    /// Wait until the page shows either case details or a no-match message.
    ///
    /// Some no-match pages carry only the message text, with no element to
    /// wait for, so the page text is checked between selector waits.
    async fn wait_for_outcome(&self, browser: &dyn BrowserActions) -> Result<()> {
        let selector = self.site.results_or_not_found();
        let parser = ResultParser::new(&self.site.results);
        let deadline = Instant::now() + Duration::from_millis(self.timeout_ms);

        loop {
            let slice = deadline.saturating_duration_since(Instant::now()).min(OUTCOME_POLL);
            let slice_ms = u64::try_from(slice.as_millis()).unwrap_or(u64::MAX);

            match browser.wait_for_selector(&selector, slice_ms).await {
                Ok(()) => return Ok(()),
                Err(BrowserError::Timeout(_)) => {}
                Err(e) => return Err(e.into()),
            }

            if parser.is_not_found_page(&browser.content().await?)? {
                tracing::debug!("no-match message shown without an indicator element");
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(FetchError::Timeout(format!(
                    "no results or no-match message after {}ms",
                    self.timeout_ms
                )));
            }
        }
    }

    /// `src` of the first image whose source carries the CAPTCHA marker.
    async fn captcha_source(&self, browser: &dyn BrowserActions) -> Result<Option<String>> {
        let marker = self.site.form.captcha_marker.to_lowercase();
        let sources = browser
            .attribute_values(&self.site.form.captcha_image, "src")
            .await?;

        Ok(sources
            .into_iter()
            .find(|src| src.to_lowercase().contains(&marker)))
    }

    async fn answer_captcha(
        &self,
        browser: &dyn BrowserActions,
        http: &HttpSession,
        resolver: &CaptchaResolver,
        src: &str,
    ) -> Result<()> {
        let page_url = browser.current_url().await?;
        let image_url = resolve_url(&page_url, src)
            .map_err(|e| FetchError::Navigation(format!("CAPTCHA image: {e}")))?;

        tracing::debug!(url = %image_url, "CAPTCHA challenge present");
        http.import_cookies(&page_url, &browser.cookies().await?)?;
        let image = http.fetch_bytes(&image_url).await?;
        let answer = resolver.resolve(&image).await?;

        browser
            .fill_field(&self.site.form.captcha_input, &answer)
            .await?;
        Ok(())
    }
}
