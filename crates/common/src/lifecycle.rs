//! Loan application state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The status of a loan application in its lifecycle.
///
/// State transitions:
/// ```text
/// Draft ──► Submitted
///   │           │
///   └───────────┴──► Cancelled
/// ```
///
/// There is no path back to `Draft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    /// Created but not yet submitted for processing.
    #[default]
    Draft,

    /// Submitted for processing.
    Submitted,

    /// Cancelled and soft-deleted (terminal state).
    Cancelled,
}

impl ApplicationStatus {
    /// Returns the persisted representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "DRAFT",
            ApplicationStatus::Submitted => "SUBMITTED",
            ApplicationStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a stored status string is not a known status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown application status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for ApplicationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(ApplicationStatus::Draft),
            "SUBMITTED" => Ok(ApplicationStatus::Submitted),
            "CANCELLED" => Ok(ApplicationStatus::Cancelled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A status change requested against an existing application.
///
/// Stores turn a transition into a single conditional update whose
/// precondition is [`Transition::source_states`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Move a draft to `Submitted`.
    Submit,

    /// Move a draft or submitted application to `Cancelled` and soft-delete it.
    Cancel,
}

impl Transition {
    /// States from which this transition may be taken.
    pub fn source_states(&self) -> &'static [ApplicationStatus] {
        match self {
            Transition::Submit => &[ApplicationStatus::Draft],
            Transition::Cancel => &[ApplicationStatus::Draft, ApplicationStatus::Submitted],
        }
    }

    /// State the application is in after the transition.
    pub fn target(&self) -> ApplicationStatus {
        match self {
            Transition::Submit => ApplicationStatus::Submitted,
            Transition::Cancel => ApplicationStatus::Cancelled,
        }
    }

    /// Whether the transition also sets the soft-delete flag.
    pub fn soft_deletes(&self) -> bool {
        matches!(self, Transition::Cancel)
    }

    /// Whether repeating the transition on an application already in the
    /// target state counts as success.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Transition::Cancel)
    }

    /// Returns true if the transition is legal from `status`.
    pub fn is_allowed_from(&self, status: ApplicationStatus) -> bool {
        self.source_states().contains(&status)
    }

    /// Validates the transition from `from`, returning the resulting state.
    pub fn apply(&self, from: ApplicationStatus) -> Result<ApplicationStatus, LifecycleError> {
        if self.is_allowed_from(from) {
            Ok(self.target())
        } else {
            Err(LifecycleError::InvalidTransition {
                current: from,
                transition: *self,
            })
        }
    }

    /// Lowercase verb used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Submit => "submit",
            Transition::Cancel => "cancel",
        }
    }

    /// Describes why a store reported the transition as not applied.
    pub fn ineligible_reason(&self) -> &'static str {
        match self {
            Transition::Submit => "not found, not in DRAFT state, or already deleted",
            Transition::Cancel => "not found",
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised by the lifecycle rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// The application is not in a state the transition may start from.
    #[error("Invalid state transition: cannot {transition} from {current} state")]
    InvalidTransition {
        current: ApplicationStatus,
        transition: Transition,
    },
}
