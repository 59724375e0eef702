//! Domain layer for loan applications.
//!
//! This crate provides:
//! - Validation of raw create-draft requests into typed drafts
//! - The lifecycle state machine, re-exported from `common`
//! - `LoanApplicationService`, which ties validation, persistence and
//!   lifecycle transitions together

pub mod error;
pub mod service;
pub mod validation;

pub use common::lifecycle;

pub use common::{
    Actor, ApplicationId, ApplicationStatus, LifecycleError, LoanApplication, Transition,
};
pub use error::ApplicationError;
pub use service::{LoanApplicationService, ServiceConfig};
pub use validation::{DraftRequest, Section, ValidationError, validate_draft};
