//! Shared types for the loan application service.
//!
//! Identifiers, the composed application model, and the lifecycle state
//! machine live here so the store, the domain layer and the HTTP adapter all
//! speak the same vocabulary.

pub mod ids;
pub mod lifecycle;
pub mod model;

pub use ids::{ApplicantId, ApplicationId};
pub use lifecycle::{ApplicationStatus, LifecycleError, ParseStatusError, Transition};
pub use model::{
    Actor, Address, Applicant, AuditTrail, Collateral, CollateralCategory, CustomerDetails,
    DraftApplication, LoanApplication, Money, ProposedLoan,
};
