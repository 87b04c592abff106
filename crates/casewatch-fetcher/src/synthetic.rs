//! Plausible case records generated without contacting the court.
//!
//! Used for demonstrations and as the fallback when a live lookup fails.
//! Records always satisfy [`CaseRecord::check_invariants`].

use crate::parser::FILING_EVENT;
use casewatch_core::{CaseQuery, CaseRecord, HistoryEvent, OrderRecord, Urgency};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const PETITIONERS: &[&str] = &[
    "Rajesh Kumar Singh",
    "Priya Sharma",
    "Amit Patel",
    "Sunita Gupta",
    "Vikas Agarwal",
    "Neha Verma",
    "Suresh Yadav",
    "Kavita Singh",
];

const RESPONDENTS: &[&str] = &[
    "State of Delhi",
    "Union of India",
    "Delhi Development Authority",
    "Municipal Corporation of Delhi",
    "Delhi Police",
    "Income Tax Department",
    "Central Bureau of Investigation",
    "Enforcement Directorate",
];

const JUDGES: &[&str] = &[
    "Hon'ble Mr. Justice Rajiv Shakdher",
    "Hon'ble Ms. Justice Prathiba M. Singh",
    "Hon'ble Mr. Justice Suresh Kumar Kait",
    "Hon'ble Mr. Justice Navin Chawla",
    "Hon'ble Ms. Justice Mini Pushkarna",
];

const STATUSES: &[&str] = &[
    "Listed for hearing",
    "Pending for orders",
    "Under consideration",
    "Adjourned",
    "Notice issued",
    "Arguments concluded",
];

const ORDER_TYPES: &[&str] = &["Order", "Notice", "Judgment", "Interim Order", "Direction"];

const ORDER_OUTCOMES: &[&str] = &[
    "Matter adjourned",
    "Notice issued",
    "Arguments heard",
    "Interim relief granted",
    "Status report called",
];

/// Timeline after filing, taken as a prefix.
const HISTORY_EVENTS: &[&str] = &[
    "First hearing scheduled",
    "Notice issued to respondent",
    "Counter affidavit filed",
    "Rejoinder filed",
    "Arguments heard",
    "Reserved for orders",
    "Interim order passed",
];

/// Builds synthetic [`CaseRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticGenerator {
    seed: Option<u64>,
}

impl SyntheticGenerator {
    /// With a seed, the same query on the same day always yields the same record.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    #[must_use]
    pub fn generate(&self, query: &CaseQuery, today: NaiveDate) -> CaseRecord {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ fnv1a(query.display_number().as_bytes())),
            None => StdRng::from_entropy(),
        };

        let filing_date = filing_date(&mut rng, query.filing_year(), today);
        let orders = orders(&mut rng, query, filing_date, today);
        let history = history(&mut rng, filing_date, today);

        CaseRecord {
            case_number: query.display_number(),
            case_type_description: query.case_type().description().to_string(),
            petitioner: pick(&mut rng, PETITIONERS).to_string(),
            respondent: format!("{} & Ors.", pick(&mut rng, RESPONDENTS)),
            filing_date,
            next_hearing_date: today + Duration::days(rng.gen_range(7..=60)),
            status: pick(&mut rng, STATUSES).to_string(),
            judge: pick(&mut rng, JUDGES).to_string(),
            court_number: Some(format!("Court No. {}", rng.gen_range(1..=15))),
            orders,
            history,
            urgency: Urgency::ALL.choose(&mut rng).copied(),
            estimated_duration_minutes: Some(rng.gen_range(15..=120)),
        }
    }
}

fn pick<'a>(rng: &mut StdRng, pool: &[&'a str]) -> &'a str {
    pool.choose(rng).copied().unwrap_or_default()
}

/// Random day in the filing year, never after `today`.
fn filing_date(rng: &mut StdRng, year: i32, today: NaiveDate) -> NaiveDate {
    let month = rng.gen_range(1..=12);
    let day = rng.gen_range(1..=28);
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or(today)
        .min(today)
}

fn orders(rng: &mut StdRng, query: &CaseQuery, filing: NaiveDate, today: NaiveDate) -> Vec<OrderRecord> {
    // 7-365 days back when the case is old enough, otherwise anywhere since filing
    let earliest = filing.max(today - Duration::days(365));
    let latest = today - Duration::days(7);
    let (earliest, latest) = if earliest <= latest {
        (earliest, latest)
    } else {
        (filing, today)
    };
    let span = (latest - earliest).num_days();

    let slug = |order_type: &str| order_type.to_lowercase().replace(' ', "_");

    let mut orders: Vec<OrderRecord> = (1..=rng.gen_range(1..=4))
        .map(|n| {
            let date = earliest + Duration::days(rng.gen_range(0..=span));
            let order_type = pick(rng, ORDER_TYPES);
            OrderRecord {
                date,
                order_type: order_type.to_string(),
                description: format!(
                    "Order dated {} - {}",
                    date.format("%d.%m.%Y"),
                    pick(rng, ORDER_OUTCOMES)
                ),
                document_reference: Some(format!(
                    "/download/{}_{}_{}_{n}.pdf",
                    slug(order_type),
                    query.case_number(),
                    query.filing_year()
                )),
                page_count: Some(rng.gen_range(1..=15)),
            }
        })
        .collect();

    orders.sort_by(|a, b| b.date.cmp(&a.date));
    orders
}

fn history(rng: &mut StdRng, filing: NaiveDate, today: NaiveDate) -> Vec<HistoryEvent> {
    let mut history = vec![HistoryEvent {
        date: filing,
        description: FILING_EVENT.to_string(),
    }];

    let mut date = filing;
    for event in &HISTORY_EVENTS[..rng.gen_range(2..=6)] {
        date += Duration::days(rng.gen_range(15..=45));
        if date > today {
            break;
        }
        history.push(HistoryEvent {
            date,
            description: (*event).to_string(),
        });
    }

    history
}

/// FNV-1a, so per-query seeds don't depend on the std hasher.
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x0100_0000_01b3)
    })
}
