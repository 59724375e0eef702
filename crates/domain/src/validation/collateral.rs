use common::{Collateral, CollateralCategory};
use serde_json::Value;

use super::{Section, ValidationError, as_section, str_field};

/// Oldest manufacturing year accepted for a pledged vehicle.
pub const MIN_MANUFACTURING_YEAR: i32 = 2020;

fn invalid(reason: impl Into<String>) -> ValidationError {
    ValidationError::new(Section::Collateral, reason)
}

/// Validates the `collateral` section against the given calendar year.
pub fn validate_collateral(value: &Value, current_year: i32) -> Result<Collateral, ValidationError> {
    let map = as_section(value, Section::Collateral)?;

    let category = str_field(map, "category")
        .and_then(CollateralCategory::parse)
        .ok_or_else(|| invalid("category must be one of CAR, MOTORCYCLE"))?;

    let brand = str_field(map, "brand")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid("brand is required"))?;

    let variant = str_field(map, "variant")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid("variant is required"))?;

    let manufacturing_year = map
        .get("manufacturing_year")
        .and_then(Value::as_i64)
        .and_then(|year| i32::try_from(year).ok())
        .filter(|year| (MIN_MANUFACTURING_YEAR..=current_year).contains(year))
        .ok_or_else(|| {
            invalid(format!(
                "manufacturing_year must be between {MIN_MANUFACTURING_YEAR} and {current_year}"
            ))
        })?;

    let is_document_complete = map
        .get("is_document_complete")
        .and_then(Value::as_bool)
        .ok_or_else(|| invalid("is_document_complete is required and must be a boolean"))?;

    Ok(Collateral {
        category,
        brand: brand.to_string(),
        variant: variant.to_string(),
        manufacturing_year,
        is_document_complete,
    })
}
