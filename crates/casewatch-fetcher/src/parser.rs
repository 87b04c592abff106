//! Extracts a [`CaseRecord`] from a rendered results page.
//!
//! Every required field must be present and non-empty. A page that matches
//! the not-found marker is reported as [`FetchError::CaseNotFound`] before
//! any field is looked at.

use crate::error::{FetchError, Result};
use crate::site::ResultSelectors;
use casewatch_core::{CaseQuery, CaseRecord, HistoryEvent, OrderRecord};
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

/// Accepted date layouts, tried in order.
const DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// History entry inserted when the page omits the filing itself.
pub const FILING_EVENT: &str = "Case filed and registered";

/// Parses results pages described by a [`ResultSelectors`].
pub struct ResultParser<'a> {
    selectors: &'a ResultSelectors,
}

impl<'a> ResultParser<'a> {
    #[must_use]
    pub fn new(selectors: &'a ResultSelectors) -> Self {
        Self { selectors }
    }

    /// Parse `html` as of the local calendar day.
    pub fn parse(&self, html: &str, query: &CaseQuery) -> Result<CaseRecord> {
        self.parse_as_of(html, query, chrono::Local::now().date_naive())
    }

    /// Parse `html`, treating `today` as the latest valid order date.
    pub fn parse_as_of(&self, html: &str, query: &CaseQuery, today: NaiveDate) -> Result<CaseRecord> {
        let document = Html::parse_document(html);
        let s = self.selectors;

        if self.is_not_found(&document)? {
            return Err(FetchError::CaseNotFound(query.display_number()));
        }
        if document.select(&selector("results", &s.results_marker)?).next().is_none() {
            return Err(FetchError::parse("results", "results marker not present"));
        }

        let filing_date = parse_date("filing_date", &required_text(&document, "filing_date", &s.filing_date)?)?;
        let next_hearing_date = parse_date(
            "next_hearing",
            &required_text(&document, "next_hearing", &s.next_hearing)?,
        )?;

        let court_number = match &s.court_number {
            Some(sel) => optional_text(&document, "court_number", sel)?,
            None => None,
        };

        let mut orders = self.orders(&document)?;
        orders.sort_by(|a, b| b.date.cmp(&a.date));
        if let Some(order) = orders.iter().find(|o| o.date > today) {
            return Err(FetchError::parse(
                "orders",
                format!("order dated {} is in the future", order.date),
            ));
        }

        let mut history = self.history(&document)?;
        history.sort_by_key(|event| event.date);
        if let Some(event) = history.iter().find(|e| e.date < filing_date) {
            return Err(FetchError::parse(
                "history",
                format!("event dated {} precedes filing on {filing_date}", event.date),
            ));
        }
        if history.first().map_or(true, |first| first.date != filing_date) {
            history.insert(
                0,
                HistoryEvent {
                    date: filing_date,
                    description: FILING_EVENT.to_string(),
                },
            );
        }

        let record = CaseRecord {
            case_number: query.display_number(),
            case_type_description: query.case_type().description().to_string(),
            petitioner: required_text(&document, "petitioner", &s.petitioner)?,
            respondent: required_text(&document, "respondent", &s.respondent)?,
            filing_date,
            next_hearing_date,
            status: required_text(&document, "status", &s.status)?,
            judge: required_text(&document, "judge", &s.judge)?,
            court_number,
            orders,
            history,
            urgency: None,
            estimated_duration_minutes: None,
        };

        record
            .check_invariants(today)
            .map_err(|violation| FetchError::parse("record", violation.to_string()))?;

        tracing::debug!(
            case = %record.case_number,
            orders = record.orders.len(),
            history = record.history.len(),
            "parsed case record"
        );
        Ok(record)
    }

    /// Whether `html` is the site's "no matching case" page.
    pub fn is_not_found_page(&self, html: &str) -> Result<bool> {
        self.is_not_found(&Html::parse_document(html))
    }

    fn is_not_found(&self, document: &Html) -> Result<bool> {
        let s = self.selectors;

        if let Some(indicator) = &s.not_found_indicator {
            if document.select(&selector("not_found_indicator", indicator)?).next().is_some() {
                return Ok(true);
            }
        }

        if s.not_found_text.is_empty()
            || document.select(&selector("results", &s.results_marker)?).next().is_some()
        {
            return Ok(false);
        }

        let body = normalized_text(document.root_element()).to_lowercase();
        Ok(s.not_found_text
            .iter()
            .any(|marker| body.contains(&marker.to_lowercase())))
    }

    fn orders(&self, document: &Html) -> Result<Vec<OrderRecord>> {
        let link = selector("orders", "a[href]")?;

        self.table_rows(document, "orders", &self.selectors.orders_table)?
            .into_iter()
            .enumerate()
            .map(|(i, cells)| {
                if cells.len() < 3 {
                    return Err(FetchError::parse(
                        "orders",
                        format!("row {} has {} cells, expected at least 3", i + 1, cells.len()),
                    ));
                }

                let order_type = normalized_text(cells[1]);
                let description = normalized_text(cells[2]);
                if order_type.is_empty() || description.is_empty() {
                    return Err(FetchError::parse("orders", format!("row {} is incomplete", i + 1)));
                }

                let document_reference = cells
                    .get(3)
                    .and_then(|cell| cell.select(&link).next())
                    .and_then(|a| a.value().attr("href"))
                    .map(|href| href.trim().to_string())
                    .filter(|href| !href.is_empty());

                let page_count = cells.get(4).and_then(|cell| {
                    let digits: String = normalized_text(*cell)
                        .chars()
                        .filter(char::is_ascii_digit)
                        .collect();
                    digits.parse().ok()
                });

                Ok(OrderRecord {
                    date: parse_date("orders", &normalized_text(cells[0]))?,
                    order_type,
                    description,
                    document_reference,
                    page_count,
                })
            })
            .collect()
    }

    fn history(&self, document: &Html) -> Result<Vec<HistoryEvent>> {
        self.table_rows(document, "history", &self.selectors.history_table)?
            .into_iter()
            .enumerate()
            .map(|(i, cells)| {
                let description = cells.get(1).map(|c| normalized_text(*c)).unwrap_or_default();
                if description.is_empty() {
                    return Err(FetchError::parse("history", format!("row {} has no event", i + 1)));
                }
                Ok(HistoryEvent {
                    date: parse_date("history", &normalized_text(cells[0]))?,
                    description,
                })
            })
            .collect()
    }

    /// `td` cells of each data row; header rows without `td` are skipped.
    fn table_rows<'d>(
        &self,
        document: &'d Html,
        field: &str,
        table: &str,
    ) -> Result<Vec<Vec<ElementRef<'d>>>> {
        let table_sel = selector(field, table)?;
        let row_sel = selector(field, &self.selectors.table_row)?;
        let cell_sel = selector(field, "td")?;

        let table = document
            .select(&table_sel)
            .next()
            .ok_or_else(|| FetchError::parse(field, "table not present"))?;

        Ok(table
            .select(&row_sel)
            .map(|row| row.select(&cell_sel).collect::<Vec<_>>())
            .filter(|cells| !cells.is_empty())
            .collect())
    }
}

fn selector(field: &str, css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| FetchError::parse(field, format!("invalid selector '{css}': {e}")))
}

fn normalized_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

fn optional_text(document: &Html, field: &str, css: &str) -> Result<Option<String>> {
    Ok(document
        .select(&selector(field, css)?)
        .next()
        .map(normalized_text)
        .filter(|text| !text.is_empty()))
}

fn required_text(document: &Html, field: &str, css: &str) -> Result<String> {
    optional_text(document, field, css)?
        .ok_or_else(|| FetchError::parse(field, format!("no text at '{css}'")))
}

/// Parse a court date in any of the accepted layouts.
pub fn parse_date(field: &str, text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .ok_or_else(|| FetchError::parse(field, format!("unrecognised date '{text}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::SiteDefinition;
    use casewatch_core::CaseType;

    const PAGE: &str = r#"
<html><body>
<div class="case-details">
  <span class="petitioner"> Rajesh   Kumar </span>
  <span class="respondent">State of Delhi &amp; Ors.</span>
  <span class="filing-date">15/03/2023</span>
  <span class="next-hearing">20-11-2023</span>
  <span class="status">Pending</span>
  <span class="judge">Hon'ble Mr. Justice Prathiba M. Singh</span>
  <span class="court-number">Court No. 7</span>
  <table class="orders">
    <tr><th>Date</th><th>Type</th><th>Description</th><th>Document</th><th>Pages</th></tr>
    <tr><td>02/05/2023</td><td>Notice</td><td>Notice issued to respondent</td>
        <td><a href="/download/wp_c_1234_2023_1.pdf">PDF</a></td><td>3 pages</td></tr>
    <tr><td>10.09.2023</td><td>Order</td><td>Matter adjourned</td><td></td><td></td></tr>
  </table>
  <table class="case-history">
    <tr><th>Date</th><th>Event</th></tr>
    <tr><td>12/06/2023</td><td>Arguments heard</td></tr>
    <tr><td>01/04/2023</td><td>First hearing scheduled</td></tr>
  </table>
</div>
</body></html>
"#;

    fn query() -> CaseQuery {
        CaseQuery::new_as_of(CaseType::WritPetitionCivil, "1234", 2023, 2023).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 10, 1).unwrap()
    }

    fn parse(html: &str) -> Result<CaseRecord> {
        let site = SiteDefinition::default();
        ResultParser::new(&site.results).parse_as_of(html, &query(), today())
    }

    #[test]
    fn test_full_page() {
        let record = parse(PAGE).unwrap();
        assert_eq!(record.case_number, "W.P.(C) 1234/2023");
        assert_eq!(record.case_type_description, "Writ Petition (Civil)");
        assert_eq!(record.petitioner, "Rajesh Kumar");
        assert_eq!(record.respondent, "State of Delhi & Ors.");
        assert_eq!(record.filing_date, NaiveDate::from_ymd_opt(2023, 3, 15).unwrap());
        assert_eq!(record.next_hearing_date, NaiveDate::from_ymd_opt(2023, 11, 20).unwrap());
        assert_eq!(record.court_number.as_deref(), Some("Court No. 7"));

        assert_eq!(record.orders.len(), 2);
        assert_eq!(record.orders[0].order_type, "Order");
        assert_eq!(record.orders[0].document_reference, None);
        assert_eq!(record.orders[0].page_count, None);
        assert_eq!(
            record.orders[1].document_reference.as_deref(),
            Some("/download/wp_c_1234_2023_1.pdf")
        );
        assert_eq!(record.orders[1].page_count, Some(3));

        let events: Vec<_> = record.history.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(
            events,
            vec![FILING_EVENT, "First hearing scheduled", "Arguments heard"]
        );
        assert!(record.check_invariants(today()).is_ok());
    }

    #[test]
    fn test_each_missing_field_is_parse_error() {
        for (class, field) in [
            ("petitioner", "petitioner"),
            ("respondent", "respondent"),
            ("filing-date", "filing_date"),
            ("next-hearing", "next_hearing"),
            ("status", "status"),
            ("judge", "judge"),
        ] {
            let html = PAGE.replace(&format!("class=\"{class}\""), "class=\"gone\"");
            match parse(&html) {
                Err(FetchError::Parse { field: f, .. }) => assert_eq!(f, field),
                other => panic!("removing {class}: expected parse error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_missing_tables_are_parse_errors() {
        let html = PAGE.replace("class=\"orders\"", "class=\"x\"");
        assert!(matches!(parse(&html), Err(FetchError::Parse { field, .. }) if field == "orders"));

        let html = PAGE.replace("class=\"case-history\"", "class=\"x\"");
        assert!(matches!(parse(&html), Err(FetchError::Parse { field, .. }) if field == "history"));
    }

    #[test]
    fn test_empty_field_is_parse_error() {
        let html = PAGE.replace("<span class=\"status\">Pending</span>", "<span class=\"status\">  </span>");
        assert!(matches!(parse(&html), Err(FetchError::Parse { field, .. }) if field == "status"));
    }

    #[test]
    fn test_court_number_optional() {
        let html = PAGE.replace("<span class=\"court-number\">Court No. 7</span>", "");
        assert_eq!(parse(&html).unwrap().court_number, None);
    }

    #[test]
    fn test_not_found_indicator() {
        let html = r#"<html><body><div class="no-record">No Record Found</div></body></html>"#;
        assert!(matches!(parse(html), Err(FetchError::CaseNotFound(n)) if n == "W.P.(C) 1234/2023"));
    }

    #[test]
    fn test_not_found_text() {
        let html = "<html><body><p>Sorry, NO RECORDS FOUND for your query.</p></body></html>";
        assert!(matches!(parse(html), Err(FetchError::CaseNotFound(_))));
    }

    #[test]
    fn test_unrelated_page_is_parse_error() {
        let html = "<html><body><p>Service temporarily unavailable</p></body></html>";
        assert!(matches!(parse(html), Err(FetchError::Parse { field, .. }) if field == "results"));
    }

    #[test]
    fn test_bad_date() {
        let html = PAGE.replace("15/03/2023", "March 15th");
        let err = parse(&html).unwrap_err();
        assert!(err.to_string().contains("filing_date"));
        assert!(err.to_string().contains("March 15th"));
    }

    #[test]
    fn test_future_order_rejected() {
        let html = PAGE.replace("10.09.2023", "10.12.2023");
        assert!(matches!(parse(&html), Err(FetchError::Parse { field, .. }) if field == "orders"));
    }

    #[test]
    fn test_history_before_filing_rejected() {
        let html = PAGE.replace("01/04/2023", "01/01/2023");
        assert!(matches!(parse(&html), Err(FetchError::Parse { field, .. }) if field == "history"));
    }

    #[test]
    fn test_filing_event_not_duplicated() {
        let html = PAGE.replace(
            "<tr><td>01/04/2023</td>",
            "<tr><td>15/03/2023</td><td>Filed</td></tr><tr><td>01/04/2023</td>",
        );
        let record = parse(&html).unwrap();
        assert_eq!(record.history[0].description, "Filed");
        assert_eq!(record.history.len(), 3);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        for text in ["05/01/2024", "05-01-2024", "05.01.2024", " 5/1/2024 "] {
            assert_eq!(parse_date("d", text).unwrap(), expected, "{text}");
        }
        assert!(parse_date("d", "2024-01-05").is_err());
    }
}
