//! Court site definition: URLs and the selectors the navigator and parser use.
//!
//! The built-in default describes the Delhi High Court case-status page. A
//! TOML file with the same shape can replace it when the site changes layout.

use crate::error::{FetchError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything needed to drive one court's case-status search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteDefinition {
    /// Site root
    pub base_url: String,

    /// Page hosting the search form
    pub case_status_url: String,

    /// Search form selectors
    pub form: FormSelectors,

    /// Results page selectors
    pub results: ResultSelectors,
}

/// Selectors for the search form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSelectors {
    /// `<select>` holding the case type codes
    pub case_type_select: String,

    /// Case number input
    pub case_number_input: String,

    /// Filing year input
    pub filing_year_input: String,

    /// Images inspected for a CAPTCHA challenge
    #[serde(default = "default_captcha_image")]
    pub captcha_image: String,

    /// Substring of an image `src` marking it as the CAPTCHA (case-insensitive)
    #[serde(default = "default_captcha_marker")]
    pub captcha_marker: String,

    /// Input receiving the CAPTCHA answer
    pub captcha_input: String,

    /// Selector for submit button
    pub submit_button: String,
}

/// Selectors for the results page.
///
/// Every `String` field is required on a results page; a missing element is
/// a parse failure, never a blank value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSelectors {
    /// Container present once case details have rendered
    pub results_marker: String,

    /// Element present when the search matched no case
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_found_indicator: Option<String>,

    /// Body text that also signals no match (case-insensitive)
    #[serde(default)]
    pub not_found_text: Vec<String>,

    pub petitioner: String,
    pub respondent: String,
    pub filing_date: String,
    pub next_hearing: String,
    pub status: String,
    pub judge: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub court_number: Option<String>,

    /// Orders table; rows are date, type, description, document link, pages
    pub orders_table: String,

    /// History table; rows are date, event
    pub history_table: String,

    /// Data rows within either table
    #[serde(default = "default_table_row")]
    pub table_row: String,
}

fn default_captcha_image() -> String {
    "img".to_string()
}

fn default_captcha_marker() -> String {
    "captcha".to_string()
}

fn default_table_row() -> String {
    "tr".to_string()
}

impl Default for SiteDefinition {
    fn default() -> Self {
        Self {
            base_url: "https://delhihighcourt.nic.in".to_string(),
            case_status_url: "https://delhihighcourt.nic.in/case_status.asp".to_string(),
            form: FormSelectors {
                case_type_select: "select[name='case_type']".to_string(),
                case_number_input: "input[name='case_no']".to_string(),
                filing_year_input: "input[name='case_year']".to_string(),
                captcha_image: default_captcha_image(),
                captcha_marker: default_captcha_marker(),
                captcha_input: "input[name='captcha']".to_string(),
                submit_button: "[type='submit']".to_string(),
            },
            results: ResultSelectors {
                results_marker: ".case-details".to_string(),
                not_found_indicator: Some(".no-record".to_string()),
                not_found_text: vec![
                    "no record found".to_string(),
                    "no records found".to_string(),
                    "record not found".to_string(),
                ],
                petitioner: ".case-details .petitioner".to_string(),
                respondent: ".case-details .respondent".to_string(),
                filing_date: ".case-details .filing-date".to_string(),
                next_hearing: ".case-details .next-hearing".to_string(),
                status: ".case-details .status".to_string(),
                judge: ".case-details .judge".to_string(),
                court_number: Some(".case-details .court-number".to_string()),
                orders_table: "table.orders".to_string(),
                history_table: "table.case-history".to_string(),
                table_row: default_table_row(),
            },
        }
    }
}

impl SiteDefinition {
    /// Load a definition from a TOML file and validate it.
    ///
    /// # Errors
    /// Returns error if the file can't be read, isn't valid TOML, or leaves a
    /// required selector empty.
    pub fn load(path: &Path) -> Result<Self> {
        let shown = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|e| FetchError::SiteDefinition {
            path: shown.clone(),
            reason: e.to_string(),
        })?;

        let definition: Self =
            toml::from_str(&contents).map_err(|e| FetchError::SiteDefinition {
                path: shown.clone(),
                reason: e.to_string(),
            })?;

        definition
            .validate()
            .map_err(|reason| FetchError::SiteDefinition {
                path: shown.clone(),
                reason,
            })?;

        tracing::debug!(path = %shown, url = %definition.case_status_url, "loaded site definition");
        Ok(definition)
    }

    /// Selector matching either a results page or a not-found page.
    #[must_use]
    pub fn results_or_not_found(&self) -> String {
        match &self.results.not_found_indicator {
            Some(nf) => format!("{}, {}", self.results.results_marker, nf),
            None => self.results.results_marker.clone(),
        }
    }

    /// Check that URLs parse and no required selector is empty.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, value) in [("base_url", &self.base_url), ("case_status_url", &self.case_status_url)] {
            if reqwest::Url::parse(value).is_err() {
                return Err(format!("{name} is not a valid URL: '{value}'"));
            }
        }

        let required = [
            ("form.case_type_select", &self.form.case_type_select),
            ("form.case_number_input", &self.form.case_number_input),
            ("form.filing_year_input", &self.form.filing_year_input),
            ("form.captcha_image", &self.form.captcha_image),
            ("form.captcha_marker", &self.form.captcha_marker),
            ("form.captcha_input", &self.form.captcha_input),
            ("form.submit_button", &self.form.submit_button),
            ("results.results_marker", &self.results.results_marker),
            ("results.petitioner", &self.results.petitioner),
            ("results.respondent", &self.results.respondent),
            ("results.filing_date", &self.results.filing_date),
            ("results.next_hearing", &self.results.next_hearing),
            ("results.status", &self.results.status),
            ("results.judge", &self.results.judge),
            ("results.orders_table", &self.results.orders_table),
            ("results.history_table", &self.results.history_table),
            ("results.table_row", &self.results.table_row),
        ];

        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(format!("{name} cannot be empty")),
            None => Ok(()),
        }
    }
}
