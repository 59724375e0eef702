//! Application service orchestrating validation, persistence and lifecycle.

use std::future::Future;
use std::time::Duration;

use application_store::{ApplicationStore, ApplicationStoreExt, StoreError};
use chrono::{Datelike, Utc};
use common::{Actor, ApplicationId, LoanApplication, Transition};

use crate::error::ApplicationError;
use crate::validation::{DraftRequest, validate_draft};

/// Tunables for [`LoanApplicationService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Deadline applied to every store call.
    pub operation_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(5),
        }
    }
}

/// Service for managing loan applications.
///
/// Validates raw input, persists through an [`ApplicationStore`] and applies
/// lifecycle transitions. Holds no state of its own, so a single instance can
/// be shared across request handlers.
pub struct LoanApplicationService<S: ApplicationStore> {
    store: S,
    config: ServiceConfig,
}

impl<S: ApplicationStore> LoanApplicationService<S> {
    /// Creates a new service with the default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, ServiceConfig::default())
    }

    /// Creates a new service with a custom configuration.
    pub fn with_config(store: S, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Validates a request and persists it as a new draft.
    ///
    /// Nothing is written unless all three sections validate.
    #[tracing::instrument(skip(self, request, actor), fields(actor = %actor))]
    pub async fn create_draft(
        &self,
        request: &DraftRequest,
        actor: &Actor,
    ) -> Result<LoanApplication, ApplicationError> {
        let draft = validate_draft(request, Utc::now().year()).inspect_err(|e| {
            tracing::warn!(section = %e.section, reason = %e.reason, "draft rejected");
            metrics::counter!(
                "loan_application_validation_failures_total",
                "section" => e.section.as_str()
            )
            .increment(1);
        })?;

        let application = self
            .bounded("create_draft", self.store.create_draft(&draft, actor))
            .await?;

        tracing::info!(
            application_id = %application.id,
            applicant_id = %application.applicant.id,
            "draft application created"
        );
        metrics::counter!("loan_applications_created_total").increment(1);

        Ok(application)
    }

    /// Loads a non-deleted application.
    ///
    /// Returns None if the application doesn't exist or was cancelled.
    #[tracing::instrument(skip(self))]
    pub async fn get_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<LoanApplication>, ApplicationError> {
        self.bounded("get_application", self.store.get(id)).await
    }

    /// Loads an application including a cancelled, soft-deleted one.
    ///
    /// Returns None only if the id was never created.
    #[tracing::instrument(skip(self))]
    pub async fn get_application_audit(
        &self,
        id: ApplicationId,
    ) -> Result<Option<LoanApplication>, ApplicationError> {
        self.bounded(
            "get_application_audit",
            self.store.get_including_deleted(id),
        )
        .await
    }

    /// Moves a draft to `SUBMITTED`.
    ///
    /// Returns false if the application is missing, deleted or not a draft.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor))]
    pub async fn submit_application(
        &self,
        id: ApplicationId,
        actor: &Actor,
    ) -> Result<bool, ApplicationError> {
        let applied = self
            .bounded("submit_application", self.store.submit(id, actor))
            .await?;
        Ok(record_transition(id, Transition::Submit, applied))
    }

    /// Cancels and soft-deletes an application.
    ///
    /// Cancelling an already cancelled application succeeds again.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor))]
    pub async fn cancel_application(
        &self,
        id: ApplicationId,
        actor: &Actor,
    ) -> Result<bool, ApplicationError> {
        let applied = self
            .bounded("cancel_application", self.store.cancel(id, actor))
            .await?;
        Ok(record_transition(id, Transition::Cancel, applied))
    }

    /// Runs a store call under the configured deadline.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, ApplicationError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let after = self.config.operation_timeout;
        match tokio::time::timeout(after, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) if e.is_conflict() => {
                tracing::warn!(operation, error = %e, "store rejected write");
                Err(e.into())
            }
            Ok(Err(e)) => {
                tracing::error!(operation, error = %e, "store operation failed");
                Err(e.into())
            }
            Err(_) => {
                tracing::error!(operation, ?after, "store operation timed out");
                Err(ApplicationError::Timeout { operation, after })
            }
        }
    }
}

/// Logs and counts the outcome of a lifecycle transition.
fn record_transition(id: ApplicationId, transition: Transition, applied: bool) -> bool {
    let outcome = if applied { "applied" } else { "rejected" };
    metrics::counter!(
        "loan_application_transitions_total",
        "transition" => transition.as_str(),
        "outcome" => outcome
    )
    .increment(1);

    if applied {
        tracing::info!(application_id = %id, %transition, "transition applied");
    } else {
        tracing::warn!(
            application_id = %id,
            %transition,
            reason = transition.ineligible_reason(),
            "transition rejected"
        );
    }

    applied
}
