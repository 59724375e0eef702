use common::{Money, ProposedLoan};
use serde_json::Value;

use super::{Section, ValidationError, as_section};

pub const MIN_TENURE_MONTHS: i64 = 3;
pub const MAX_TENURE_MONTHS: i64 = 60;
/// Tenure must be a whole number of quarters.
pub const TENURE_STEP_MONTHS: i64 = 3;

/// Inclusive amount bounds in whole currency units.
pub const MIN_AMOUNT: i64 = 100;
pub const MAX_AMOUNT: i64 = 50_000;

fn invalid(reason: impl Into<String>) -> ValidationError {
    ValidationError::new(Section::ProposedLoan, reason)
}

/// Validates the `proposed_loan` section.
pub fn validate_proposed_loan(value: &Value) -> Result<ProposedLoan, ValidationError> {
    let map = as_section(value, Section::ProposedLoan)?;

    let tenure_months = map
        .get("tenure")
        .and_then(Value::as_i64)
        .filter(|t| (MIN_TENURE_MONTHS..=MAX_TENURE_MONTHS).contains(t))
        .filter(|t| t % TENURE_STEP_MONTHS == 0)
        .and_then(|t| u8::try_from(t).ok())
        .ok_or_else(|| invalid("tenure must be between 3 and 60, and divisible by 3"))?;

    let bounds = Money::from_units(MIN_AMOUNT)..=Money::from_units(MAX_AMOUNT);
    // Parsed from the number's literal text so fractional digits survive
    // exactly; values too large for a decimal fall out of range.
    let amount = map
        .get("amount")
        .and_then(Value::as_number)
        .and_then(|n| n.to_string().parse::<Money>().ok())
        .filter(|amount| bounds.contains(amount))
        .ok_or_else(|| invalid("amount must be between 100 and 50000"))?;

    Ok(ProposedLoan {
        tenure_months,
        amount,
    })
}
