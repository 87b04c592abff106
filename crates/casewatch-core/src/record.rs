//! Case records produced by a lookup.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Extracted from the court website
    Live,
    /// Fabricated without contacting any external source
    Synthetic,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => f.write_str("live"),
            Self::Synthetic => f.write_str("synthetic"),
        }
    }
}

/// A court-issued order or judgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub order_type: String,
    pub description: String,
    /// Opaque reference to the document, resolved elsewhere
    pub document_reference: Option<String>,
    pub page_count: Option<u32>,
}

/// One entry on the case timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub date: NaiveDate,
    pub description: String,
}

/// Listing priority. The court page does not publish it, so only synthetic
/// records carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    Normal,
    Urgent,
    #[serde(rename = "Very Urgent")]
    VeryUrgent,
}

impl Urgency {
    pub const ALL: [Urgency; 3] = [Self::Normal, Self::Urgent, Self::VeryUrgent];
}

/// Case metadata for a single lookup.
///
/// `orders` are newest first; `history` is oldest first and begins at the
/// filing date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Composed number, e.g. `W.P.(C) 1234/2023`
    pub case_number: String,
    pub case_type_description: String,
    pub petitioner: String,
    pub respondent: String,
    pub filing_date: NaiveDate,
    pub next_hearing_date: NaiveDate,
    pub status: String,
    pub judge: String,
    pub court_number: Option<String>,
    pub orders: Vec<OrderRecord>,
    pub history: Vec<HistoryEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    /// Expected length of the next hearing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration_minutes: Option<u32>,
}

/// A broken ordering invariant on a [`CaseRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordViolation {
    #[error("order dated {0} is in the future")]
    OrderInFuture(NaiveDate),

    #[error("orders are not sorted newest first")]
    OrdersUnsorted,

    #[error("history does not start at the filing date")]
    HistoryStart,

    #[error("history dates are not in order")]
    HistoryUnsorted,
}

impl CaseRecord {
    /// Check the ordering invariants as of `today`.
    ///
    /// # Errors
    /// Returns the first violation found.
    pub fn check_invariants(&self, today: NaiveDate) -> Result<(), RecordViolation> {
        if let Some(order) = self.orders.iter().find(|o| o.date > today) {
            return Err(RecordViolation::OrderInFuture(order.date));
        }
        if self.orders.windows(2).any(|w| w[0].date < w[1].date) {
            return Err(RecordViolation::OrdersUnsorted);
        }
        match self.history.first() {
            Some(first) if first.date == self.filing_date => {}
            _ => return Err(RecordViolation::HistoryStart),
        }
        if self.history.windows(2).any(|w| w[0].date > w[1].date) {
            return Err(RecordViolation::HistoryUnsorted);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record() -> CaseRecord {
        CaseRecord {
            case_number: "LPA 12/2023".to_string(),
            case_type_description: "Letters Patent Appeal".to_string(),
            petitioner: "Priya Sharma".to_string(),
            respondent: "Union of India & Ors.".to_string(),
            filing_date: date(2023, 3, 1),
            next_hearing_date: date(2024, 1, 9),
            status: "Adjourned".to_string(),
            judge: "Hon'ble Mr. Justice Navin Chawla".to_string(),
            court_number: None,
            orders: vec![
                OrderRecord {
                    date: date(2023, 9, 1),
                    order_type: "Order".to_string(),
                    description: "Matter adjourned".to_string(),
                    document_reference: None,
                    page_count: Some(2),
                },
                OrderRecord {
                    date: date(2023, 5, 1),
                    order_type: "Notice".to_string(),
                    description: "Notice issued".to_string(),
                    document_reference: Some("/download/notice.pdf".to_string()),
                    page_count: None,
                },
            ],
            history: vec![
                HistoryEvent {
                    date: date(2023, 3, 1),
                    description: "Case filed and registered".to_string(),
                },
                HistoryEvent {
                    date: date(2023, 4, 2),
                    description: "First hearing scheduled".to_string(),
                },
            ],
            urgency: None,
            estimated_duration_minutes: None,
        }
    }

    #[test]
    fn test_valid_record() {
        assert!(record().check_invariants(date(2024, 1, 1)).is_ok());
    }

    #[test]
    fn test_future_order_rejected() {
        assert_eq!(
            record().check_invariants(date(2023, 8, 1)),
            Err(RecordViolation::OrderInFuture(date(2023, 9, 1)))
        );
    }

    #[test]
    fn test_unsorted_rejected() {
        let mut r = record();
        r.orders.reverse();
        assert_eq!(
            r.check_invariants(date(2024, 1, 1)),
            Err(RecordViolation::OrdersUnsorted)
        );

        let mut r = record();
        r.history.reverse();
        assert_eq!(
            r.check_invariants(date(2024, 1, 1)),
            Err(RecordViolation::HistoryStart)
        );
    }

    #[test]
    fn test_order_type_serialized_as_type() {
        let json = serde_json::to_value(&record().orders[0]).unwrap();
        assert_eq!(json["type"], "Order");
        assert_eq!(json["date"], "2023-09-01");
    }

    #[test]
    fn test_violation_is_error() {
        let err: Box<dyn std::error::Error> = Box::new(RecordViolation::HistoryStart);
        assert_eq!(err.to_string(), "history does not start at the filing date");
        assert_eq!(
            RecordViolation::OrderInFuture(date(2023, 9, 1)).to_string(),
            "order dated 2023-09-01 is in the future"
        );
    }

    #[test]
    fn test_optional_scheduling_fields() {
        let json = serde_json::to_value(record()).unwrap();
        assert!(json.get("urgency").is_none());
        assert!(json.get("estimated_duration_minutes").is_none());

        let mut r = record();
        r.urgency = Some(Urgency::VeryUrgent);
        r.estimated_duration_minutes = Some(45);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["urgency"], "Very Urgent");
        assert_eq!(json["estimated_duration_minutes"], 45);
        let back: CaseRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(DataSource::Live.to_string(), "live");
        assert_eq!(
            serde_json::to_string(&DataSource::Synthetic).unwrap(),
            "\"synthetic\""
        );
    }
}
