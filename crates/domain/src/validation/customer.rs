use std::sync::LazyLock;

use chrono::NaiveDate;
use common::{Address, CustomerDetails};
use regex::Regex;
use serde_json::{Map, Value};

use super::{Section, ValidationError, as_section, char_len_within, str_field};

static FULL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z ]{3,100}$").expect("full name pattern is valid"));

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern is valid")
});

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6,30}$").expect("phone pattern is valid"));

fn invalid(reason: impl Into<String>) -> ValidationError {
    ValidationError::new(Section::Customer, reason)
}

/// Validates the `customer` section, including its embedded address.
pub fn validate_customer(value: &Value) -> Result<CustomerDetails, ValidationError> {
    let map = as_section(value, Section::Customer)?;

    let full_name = str_field(map, "full_name")
        .filter(|s| FULL_NAME.is_match(s))
        .ok_or_else(|| invalid("full_name must be 3-100 characters, alphabet and space only"))?;

    let date_of_birth = str_field(map, "date_of_birth")
        .and_then(parse_date)
        .ok_or_else(|| invalid("date_of_birth must be in YYYY-MM-DD format"))?;

    let id_number = str_field(map, "id_number")
        .filter(|s| char_len_within(s, 1, 25))
        .ok_or_else(|| invalid("id_number must be 1-25 characters"))?;

    let email = match map.get("email") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) if EMAIL.is_match(s) => Some(s.clone()),
        Some(_) => return Err(invalid("email is not valid")),
    };

    let phone = str_field(map, "phone")
        .filter(|s| PHONE.is_match(s))
        .ok_or_else(|| invalid("phone must be 6-30 digits"))?;

    let address = map
        .get("address")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid("address is required"))?;
    let address =
        validate_address(address).map_err(|reason| invalid(format!("invalid address: {reason}")))?;

    Ok(CustomerDetails {
        full_name: full_name.to_string(),
        date_of_birth,
        id_number: id_number.to_string(),
        email,
        phone: phone.to_string(),
        address,
    })
}

/// Strict `YYYY-MM-DD`; chrono alone would accept unpadded fields.
fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn validate_address(map: &Map<String, Value>) -> Result<Address, &'static str> {
    let street = str_field(map, "street")
        .filter(|s| char_len_within(s, 1, 200))
        .ok_or("street must be 1-200 characters")?;
    let city = str_field(map, "city")
        .filter(|s| char_len_within(s, 1, 100))
        .ok_or("city must be 1-100 characters")?;
    let zipcode = str_field(map, "zipcode")
        .filter(|s| char_len_within(s, 3, 10))
        .ok_or("zipcode must be 3-10 characters")?;

    Ok(Address {
        street: street.to_string(),
        city: city.to_string(),
        zipcode: zipcode.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::validation::fixtures;

    fn with(field: &str, value: Value) -> Value {
        let mut customer = fixtures::customer();
        customer[field] = value;
        customer
    }

    fn reason(value: &Value) -> String {
        let err = validate_customer(value).unwrap_err();
        assert_eq!(err.section, Section::Customer);
        err.reason
    }

    #[test]
    fn test_valid_customer() {
        let customer = validate_customer(&fixtures::customer()).unwrap();
        assert_eq!(customer.full_name, "John Doe");
        assert_eq!(
            customer.date_of_birth,
            NaiveDate::from_ymd_opt(1990, 5, 17).unwrap()
        );
        assert_eq!(customer.email.as_deref(), Some("john.doe@example.com"));
        assert_eq!(customer.address.city, "Springfield");
    }

    #[test]
    fn test_full_name_rules() {
        assert!(validate_customer(&with("full_name", json!("Al "))).is_ok());
        assert!(reason(&with("full_name", json!("Jo"))).starts_with("full_name"));
        assert!(reason(&with("full_name", json!("J0hn Doe"))).starts_with("full_name"));
        assert!(reason(&with("full_name", json!("Zoë Doe"))).starts_with("full_name"));
        assert!(reason(&with("full_name", json!("a".repeat(101)))).starts_with("full_name"));
        assert!(validate_customer(&with("full_name", json!("a".repeat(100)))).is_ok());
    }

    #[test]
    fn test_date_of_birth_must_be_strict_iso_date() {
        assert!(validate_customer(&with("date_of_birth", json!("2000-02-29"))).is_ok());
        for bad in ["2001-02-29", "1990-5-17", "17/05/1990", "", "1990-05-17T00:00:00"] {
            assert_eq!(
                reason(&with("date_of_birth", json!(bad))),
                "date_of_birth must be in YYYY-MM-DD format",
                "accepted {bad}"
            );
        }
    }

    #[test]
    fn test_id_number_length() {
        assert!(validate_customer(&with("id_number", json!("X"))).is_ok());
        assert!(validate_customer(&with("id_number", json!("9".repeat(25)))).is_ok());
        assert_eq!(
            reason(&with("id_number", json!(""))),
            "id_number must be 1-25 characters"
        );
        assert_eq!(
            reason(&with("id_number", json!("9".repeat(26)))),
            "id_number must be 1-25 characters"
        );
    }

    #[test]
    fn test_email_is_optional() {
        let mut customer = fixtures::customer();
        customer.as_object_mut().unwrap().remove("email");
        assert_eq!(validate_customer(&customer).unwrap().email, None);

        assert_eq!(
            validate_customer(&with("email", json!(""))).unwrap().email,
            None
        );
        assert_eq!(
            validate_customer(&with("email", Value::Null)).unwrap().email,
            None
        );
    }

    #[test]
    fn test_email_shape() {
        for bad in ["john", "john@", "john@example", "@example.com", "john@example.c"] {
            assert_eq!(reason(&with("email", json!(bad))), "email is not valid");
        }
        assert_eq!(reason(&with("email", json!(42))), "email is not valid");
    }

    #[test]
    fn test_phone_digits_only() {
        assert!(validate_customer(&with("phone", json!("123456"))).is_ok());
        for bad in ["12345", "+1234567890", "123 456 789", ""] {
            assert_eq!(reason(&with("phone", json!(bad))), "phone must be 6-30 digits");
        }
        assert_eq!(
            reason(&with("phone", json!("1".repeat(31)))),
            "phone must be 6-30 digits"
        );
    }

    #[test]
    fn test_address_required() {
        let mut customer = fixtures::customer();
        customer.as_object_mut().unwrap().remove("address");
        assert_eq!(reason(&customer), "address is required");
    }

    #[test]
    fn test_address_bounds() {
        let mut customer = fixtures::customer();
        customer["address"]["zipcode"] = json!("12");
        assert_eq!(
            reason(&customer),
            "invalid address: zipcode must be 3-10 characters"
        );

        let mut customer = fixtures::customer();
        customer["address"]["street"] = json!("s".repeat(201));
        assert_eq!(
            reason(&customer),
            "invalid address: street must be 1-200 characters"
        );

        let mut customer = fixtures::customer();
        customer["address"]["city"] = json!("");
        assert_eq!(
            reason(&customer),
            "invalid address: city must be 1-100 characters"
        );
    }

    #[test]
    fn test_non_object_section() {
        assert_eq!(reason(&json!("John Doe")), "customer must be an object");
    }
}
