use async_trait::async_trait;
use common::{Actor, DraftApplication, LoanApplication, Transition};

use crate::{ApplicationId, Result};

/// Core trait for loan application persistence.
///
/// Implementations own every read and write against durable storage. All
/// implementations must be thread-safe (Send + Sync) and must not rely on
/// process-local state for consistency beyond what their backing storage
/// provides.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Creates an applicant and its draft application atomically.
    ///
    /// Either both records exist afterwards or neither does. A duplicate
    /// id-number among non-deleted applicants fails with
    /// [`StoreError::Conflict`](crate::StoreError::Conflict).
    async fn create_draft(
        &self,
        draft: &DraftApplication,
        actor: &Actor,
    ) -> Result<LoanApplication>;

    /// Retrieves a non-deleted application joined with its applicant.
    ///
    /// Returns None if no such application exists or it was soft-deleted.
    async fn get(&self, id: ApplicationId) -> Result<Option<LoanApplication>>;

    /// Retrieves an application regardless of its soft-delete flag.
    ///
    /// Backs the audit view, which must still show cancelled applications.
    async fn get_including_deleted(&self, id: ApplicationId) -> Result<Option<LoanApplication>>;

    /// Applies a lifecycle transition as a single conditional update.
    ///
    /// Returns true when the update took effect, or when the transition is
    /// idempotent and the application already sits in its target state.
    /// Returns false when the application is absent, soft-deleted, or not in
    /// one of the transition's source states.
    async fn apply_transition(
        &self,
        id: ApplicationId,
        transition: Transition,
        actor: &Actor,
    ) -> Result<bool>;
}

/// Extension trait providing named lifecycle operations.
#[async_trait]
pub trait ApplicationStoreExt: ApplicationStore {
    /// Moves a draft to `SUBMITTED`.
    async fn submit(&self, id: ApplicationId, actor: &Actor) -> Result<bool> {
        self.apply_transition(id, Transition::Submit, actor).await
    }

    /// Cancels and soft-deletes an application. Repeat calls report true.
    async fn cancel(&self, id: ApplicationId, actor: &Actor) -> Result<bool> {
        self.apply_transition(id, Transition::Cancel, actor).await
    }
}

// Blanket implementation for all ApplicationStore implementations
impl<T: ApplicationStore + ?Sized> ApplicationStoreExt for T {}

