//! Loan application model: value objects, applicant, and the composed view.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ApplicantId, ApplicationId, ApplicationStatus};

/// Money amount held as an exact decimal, so no precision is lost between
/// the request, the database `NUMERIC` column and the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Wraps an exact decimal amount.
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates a new Money amount from whole currency units.
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Returns the exact decimal amount.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    /// Parses plain (`150.125`) or exponent (`1e4`) notation exactly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let amount = if s.contains(['e', 'E']) {
            Decimal::from_scientific(s)?
        } else {
            Decimal::from_str_exact(s)?
        };
        Ok(Self(amount.normalize()))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut amount = self.0;
        if amount.scale() < 2 {
            amount.rescale(2);
        }
        write!(f, "{amount}")
    }
}

/// Postal address embedded in an applicant record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub zipcode: String,
}

/// Validated personal details of the person applying for the loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    /// National or document identity number.
    pub id_number: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Address,
}

/// Kind of vehicle pledged as collateral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollateralCategory {
    Car,
    Motorcycle,
}

impl CollateralCategory {
    /// Returns the persisted representation of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollateralCategory::Car => "CAR",
            CollateralCategory::Motorcycle => "MOTORCYCLE",
        }
    }

    /// Parses a persisted category literal.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CAR" => Some(CollateralCategory::Car),
            "MOTORCYCLE" => Some(CollateralCategory::Motorcycle),
            _ => None,
        }
    }
}

impl std::fmt::Display for CollateralCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Vehicle pledged against the loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collateral {
    pub category: CollateralCategory,
    pub brand: String,
    pub variant: String,
    pub manufacturing_year: i32,
    pub is_document_complete: bool,
}

/// Requested loan terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedLoan {
    pub tenure_months: u8,
    pub amount: Money,
}

/// A fully validated request to open a new draft application.
///
/// Only the validator produces this type, so everything downstream can
/// assume the field rules hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftApplication {
    pub customer: CustomerDetails,
    pub collateral: Collateral,
    pub proposed_loan: ProposedLoan,
}

/// Name recorded in the `created_by` / `updated_by` audit columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    /// Creates an actor from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The actor used when the caller does not name one.
    pub fn system() -> Self {
        Self("system".to_string())
    }

    /// Returns the actor name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Audit columns shared by applicant and application records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrail {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: String,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl AuditTrail {
    /// Audit fields for a record created now by `actor`.
    pub fn created(actor: &Actor, at: DateTime<Utc>) -> Self {
        Self {
            created_at: at,
            updated_at: at,
            created_by: actor.as_str().to_string(),
            updated_by: actor.as_str().to_string(),
            deleted: false,
            deleted_at: None,
        }
    }

    /// Records an update made by `actor`.
    pub fn touch(&mut self, actor: &Actor, at: DateTime<Utc>) {
        self.updated_at = at;
        self.updated_by = actor.as_str().to_string();
    }

    /// Marks the record soft-deleted.
    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.deleted = true;
        self.deleted_at = Some(at);
    }

    /// Current time at the precision Postgres stores (microseconds).
    pub fn timestamp_now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }
}

/// A persisted applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: ApplicantId,
    pub details: CustomerDetails,
    pub audit: AuditTrail,
}

/// Composed view of a loan application joined with its applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: ApplicationId,
    pub applicant: Applicant,
    pub proposed_loan: ProposedLoan,
    pub collateral: Collateral,
    pub status: ApplicationStatus,
    pub audit: AuditTrail,
}

impl LoanApplication {
    /// Returns true if the application carries exactly the terms of `draft`.
    pub fn matches_draft(&self, draft: &DraftApplication) -> bool {
        self.applicant.details == draft.customer
            && self.collateral == draft.collateral
            && self.proposed_loan == draft.proposed_loan
    }
}
