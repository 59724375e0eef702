//! Input validation for new loan applications.
//!
//! The HTTP layer hands over three loosely typed JSON sections. Each section
//! validator checks every rule for its section and either produces a typed
//! record or a [`ValidationError`] naming the section. Nothing downstream of
//! [`validate_draft`] sees untyped data.

mod collateral;
mod customer;
mod proposed_loan;

use common::DraftApplication;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use collateral::{MIN_MANUFACTURING_YEAR, validate_collateral};
pub use customer::validate_customer;
pub use proposed_loan::{
    MAX_AMOUNT, MAX_TENURE_MONTHS, MIN_AMOUNT, MIN_TENURE_MONTHS,
    TENURE_STEP_MONTHS, validate_proposed_loan,
};

/// Part of the request a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Customer,
    Collateral,
    ProposedLoan,
}

impl Section {
    /// Returns the request field name of the section.
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Customer => "customer",
            Section::Collateral => "collateral",
            Section::ProposedLoan => "proposed_loan",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Malformed or out-of-range input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {section}: {reason}")]
pub struct ValidationError {
    pub section: Section,
    pub reason: String,
}

impl ValidationError {
    /// Creates a validation error for a section.
    pub fn new(section: Section, reason: impl Into<String>) -> Self {
        Self {
            section,
            reason: reason.into(),
        }
    }
}

/// Raw create-draft request as received from the outside world.
///
/// Missing sections deserialize to `null` and are rejected by validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftRequest {
    #[serde(default)]
    pub customer: Value,
    #[serde(default)]
    pub collateral: Value,
    #[serde(default)]
    pub proposed_loan: Value,
}

/// Validates all three sections of a draft request.
///
/// Every section is checked before the result is assembled. When more than
/// one section is invalid, the first in the order proposed loan, collateral,
/// customer is reported.
pub fn validate_draft(
    request: &DraftRequest,
    current_year: i32,
) -> Result<DraftApplication, ValidationError> {
    let proposed_loan = validate_proposed_loan(&request.proposed_loan);
    let collateral = validate_collateral(&request.collateral, current_year);
    let customer = validate_customer(&request.customer);

    let proposed_loan = proposed_loan?;
    let collateral = collateral?;
    let customer = customer?;

    Ok(DraftApplication {
        customer,
        collateral,
        proposed_loan,
    })
}

fn as_section(value: &Value, section: Section) -> Result<&Map<String, Value>, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::new(section, format!("{section} must be an object")))
}

fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

fn char_len_within(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.chars().count())
}
