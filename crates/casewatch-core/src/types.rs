//! Case identifiers: the fixed case-type enumeration and validated queries.

use crate::error::{ValidationError, ValidationErrors, MAX_CASE_NUMBER_LEN, MIN_FILING_YEAR};
use chrono::Datelike;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Litigation category accepted by the case-status search form.
///
/// The order of [`CaseType::ALL`] is the order the court site lists them in
/// and is part of the public contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CaseType {
    /// CRL.A
    CriminalAppeal,
    /// CRL.M.C
    CriminalMisc,
    /// W.P.(C)
    WritPetitionCivil,
    /// W.P.(CRL)
    WritPetitionCriminal,
    /// C.M.
    CivilMisc,
    /// FAO
    FirstAppealFromOrder,
    /// RFA
    RegularFirstAppeal,
    /// CS(OS)
    OriginalSuit,
    /// CS(COMM)
    CommercialSuit,
    /// CONT.CAS(C)
    ContemptCaseCivil,
    /// ARB.P.
    ArbitrationPetition,
    /// I.A.
    InterlocutoryApplication,
    /// CRL.REV.P.
    CriminalRevisionPetition,
    /// BAIL APPLN.
    BailApplication,
    /// MAT.APP.
    MatrimonialAppeal,
    /// EFA
    ElectionFirstAppeal,
    /// LPA
    LettersPatentAppeal,
}

impl CaseType {
    /// Every case type, in display order.
    pub const ALL: [CaseType; 17] = [
        Self::CriminalAppeal,
        Self::CriminalMisc,
        Self::WritPetitionCivil,
        Self::WritPetitionCriminal,
        Self::CivilMisc,
        Self::FirstAppealFromOrder,
        Self::RegularFirstAppeal,
        Self::OriginalSuit,
        Self::CommercialSuit,
        Self::ContemptCaseCivil,
        Self::ArbitrationPetition,
        Self::InterlocutoryApplication,
        Self::CriminalRevisionPetition,
        Self::BailApplication,
        Self::MatrimonialAppeal,
        Self::ElectionFirstAppeal,
        Self::LettersPatentAppeal,
    ];

    /// Short code submitted in the search form, e.g. `W.P.(C)`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::CriminalAppeal => "CRL.A",
            Self::CriminalMisc => "CRL.M.C",
            Self::WritPetitionCivil => "W.P.(C)",
            Self::WritPetitionCriminal => "W.P.(CRL)",
            Self::CivilMisc => "C.M.",
            Self::FirstAppealFromOrder => "FAO",
            Self::RegularFirstAppeal => "RFA",
            Self::OriginalSuit => "CS(OS)",
            Self::CommercialSuit => "CS(COMM)",
            Self::ContemptCaseCivil => "CONT.CAS(C)",
            Self::ArbitrationPetition => "ARB.P.",
            Self::InterlocutoryApplication => "I.A.",
            Self::CriminalRevisionPetition => "CRL.REV.P.",
            Self::BailApplication => "BAIL APPLN.",
            Self::MatrimonialAppeal => "MAT.APP.",
            Self::ElectionFirstAppeal => "EFA",
            Self::LettersPatentAppeal => "LPA",
        }
    }

    /// Label shown in selection lists, e.g. `W.P.(C) (Writ Petition Civil)`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CriminalAppeal => "CRL.A (Criminal Appeal)",
            Self::CriminalMisc => "CRL.M.C (Criminal Misc.)",
            Self::WritPetitionCivil => "W.P.(C) (Writ Petition Civil)",
            Self::WritPetitionCriminal => "W.P.(CRL) (Writ Petition Criminal)",
            Self::CivilMisc => "C.M. (Civil Misc.)",
            Self::FirstAppealFromOrder => "FAO (First Appeal from Order)",
            Self::RegularFirstAppeal => "RFA (Regular First Appeal)",
            Self::OriginalSuit => "CS(OS) (Original Suit)",
            Self::CommercialSuit => "CS(COMM) (Commercial Suit)",
            Self::ContemptCaseCivil => "CONT.CAS(C) (Contempt Case Civil)",
            Self::ArbitrationPetition => "ARB.P. (Arbitration Petition)",
            Self::InterlocutoryApplication => "I.A. (Interlocutory Application)",
            Self::CriminalRevisionPetition => "CRL.REV.P. (Criminal Revision Petition)",
            Self::BailApplication => "BAIL APPLN. (Bail Application)",
            Self::MatrimonialAppeal => "MAT.APP. (Matrimonial Appeal)",
            Self::ElectionFirstAppeal => "EFA (Election First Appeal)",
            Self::LettersPatentAppeal => "LPA (Letters Patent Appeal)",
        }
    }

    /// Full descriptive name.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::CriminalAppeal => "Criminal Appeal",
            Self::CriminalMisc => "Criminal Miscellaneous",
            Self::WritPetitionCivil => "Writ Petition (Civil)",
            Self::WritPetitionCriminal => "Writ Petition (Criminal)",
            Self::CivilMisc => "Civil Miscellaneous",
            Self::FirstAppealFromOrder => "First Appeal from Order",
            Self::RegularFirstAppeal => "Regular First Appeal",
            Self::OriginalSuit => "Civil Suit (Original Side)",
            Self::CommercialSuit => "Commercial Suit",
            Self::ContemptCaseCivil => "Contempt Case (Civil)",
            Self::ArbitrationPetition => "Arbitration Petition",
            Self::InterlocutoryApplication => "Interlocutory Application",
            Self::CriminalRevisionPetition => "Criminal Revision Petition",
            Self::BailApplication => "Bail Application",
            Self::MatrimonialAppeal => "Matrimonial Appeal",
            Self::ElectionFirstAppeal => "Election First Appeal",
            Self::LettersPatentAppeal => "Letters Patent Appeal",
        }
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CaseType {
    type Err = ValidationError;

    /// Exact, case-sensitive match against the codes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ct| ct.code() == s)
            .ok_or_else(|| ValidationError::InvalidCaseType(s.to_string()))
    }
}

impl TryFrom<String> for CaseType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CaseType> for String {
    fn from(value: CaseType) -> Self {
        value.code().to_string()
    }
}

/// One entry of the case-type selection list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseTypeOption {
    /// Code submitted in the form
    pub code: &'static str,
    /// Human readable label
    pub label: &'static str,
}

/// The fixed 17-entry case-type enumeration, in display order.
#[must_use]
pub fn list_case_types() -> Vec<CaseTypeOption> {
    CaseType::ALL
        .into_iter()
        .map(|ct| CaseTypeOption {
            code: ct.code(),
            label: ct.label(),
        })
        .collect()
}

/// A validated case lookup request.
///
/// Only constructible through validation, so holding one means the case number
/// is 1-10 digits and the filing year is within `[2000, current year]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CaseQuery {
    case_type: CaseType,
    case_number: String,
    filing_year: i32,
}

impl CaseQuery {
    /// Build a query, validating against the current calendar year.
    ///
    /// # Errors
    /// Returns every validation problem found.
    pub fn new(
        case_type: CaseType,
        case_number: impl Into<String>,
        filing_year: i32,
    ) -> Result<Self, ValidationErrors> {
        Self::new_as_of(case_type, case_number, filing_year, current_year())
    }

    /// Build a query, validating the filing year against `current_year`.
    ///
    /// # Errors
    /// Returns every validation problem found.
    pub fn new_as_of(
        case_type: CaseType,
        case_number: impl Into<String>,
        filing_year: i32,
        current_year: i32,
    ) -> Result<Self, ValidationErrors> {
        let case_number = case_number.into();
        let mut errors = Vec::new();
        validate_case_number(&case_number, &mut errors);
        validate_filing_year(filing_year, current_year, &mut errors);

        if errors.is_empty() {
            Ok(Self {
                case_type,
                case_number,
                filing_year,
            })
        } else {
            Err(ValidationErrors(errors))
        }
    }

    /// Validate raw form input.
    ///
    /// # Errors
    /// Returns every validation problem found across all three fields.
    pub fn parse(
        case_type: &str,
        case_number: &str,
        filing_year: &str,
    ) -> Result<Self, ValidationErrors> {
        Self::parse_as_of(case_type, case_number, filing_year, current_year())
    }

    /// Validate raw form input against a fixed `current_year`.
    ///
    /// # Errors
    /// Returns every validation problem found across all three fields.
    pub fn parse_as_of(
        case_type: &str,
        case_number: &str,
        filing_year: &str,
        current_year: i32,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = Vec::new();

        let case_type = case_type
            .parse::<CaseType>()
            .map_err(|e| errors.push(e))
            .ok();

        let case_number = case_number.trim();
        validate_case_number(case_number, &mut errors);

        let filing_year = match filing_year.trim().parse::<i32>() {
            Ok(year) => {
                validate_filing_year(year, current_year, &mut errors);
                Some(year)
            }
            Err(_) => {
                errors.push(ValidationError::InvalidFilingYear(filing_year.to_string()));
                None
            }
        };

        match (case_type, filing_year) {
            (Some(case_type), Some(filing_year)) if errors.is_empty() => Ok(Self {
                case_type,
                case_number: case_number.to_string(),
                filing_year,
            }),
            _ => Err(ValidationErrors(errors)),
        }
    }

    /// Case type of the lookup.
    #[must_use]
    pub fn case_type(&self) -> CaseType {
        self.case_type
    }

    /// Case number digits as entered.
    #[must_use]
    pub fn case_number(&self) -> &str {
        &self.case_number
    }

    /// Filing year.
    #[must_use]
    pub fn filing_year(&self) -> i32 {
        self.filing_year
    }

    /// Composed display number, e.g. `W.P.(C) 1234/2023`.
    #[must_use]
    pub fn display_number(&self) -> String {
        format!(
            "{} {}/{}",
            self.case_type.code(),
            self.case_number,
            self.filing_year
        )
    }
}

impl fmt::Display for CaseQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_number())
    }
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

fn validate_case_number(case_number: &str, errors: &mut Vec<ValidationError>) {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let digits = DIGITS.get_or_init(|| Regex::new(r"^[0-9]+$").expect("valid regex"));

    if case_number.is_empty() {
        errors.push(ValidationError::EmptyCaseNumber);
        return;
    }
    if !digits.is_match(case_number) {
        errors.push(ValidationError::NonNumericCaseNumber);
    }
    if case_number.len() > MAX_CASE_NUMBER_LEN {
        errors.push(ValidationError::CaseNumberTooLong {
            len: case_number.len(),
        });
    }
}

fn validate_filing_year(year: i32, current_year: i32, errors: &mut Vec<ValidationError>) {
    if !(MIN_FILING_YEAR..=current_year).contains(&year) {
        errors.push(ValidationError::FilingYearOutOfRange {
            year,
            min: MIN_FILING_YEAR,
            max: current_year,
        });
    }
}
