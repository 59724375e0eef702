use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{
    Actor, Applicant, ApplicantId, ApplicationStatus, AuditTrail, Collateral, DraftApplication,
    LoanApplication, ProposedLoan, Transition,
};
use tokio::sync::RwLock;

use crate::{ApplicationId, Result, StoreError, store::ApplicationStore};

/// Row shape of a stored application, referencing its applicant by id.
#[derive(Debug, Clone)]
struct StoredApplication {
    applicant_id: ApplicantId,
    proposed_loan: ProposedLoan,
    collateral: Collateral,
    status: ApplicationStatus,
    audit: AuditTrail,
}

#[derive(Default)]
struct Tables {
    applicants: HashMap<ApplicantId, Applicant>,
    applications: HashMap<ApplicationId, StoredApplication>,
}

impl Tables {
    fn compose(&self, id: ApplicationId, row: &StoredApplication) -> Result<LoanApplication> {
        let applicant = self.applicants.get(&row.applicant_id).ok_or_else(|| {
            StoreError::InvalidRow(format!(
                "application {id} references missing applicant {}",
                row.applicant_id
            ))
        })?;

        Ok(LoanApplication {
            id,
            applicant: applicant.clone(),
            proposed_loan: row.proposed_loan,
            collateral: row.collateral.clone(),
            status: row.status,
            audit: row.audit.clone(),
        })
    }

    fn active_id_number_taken(&self, id_number: &str) -> bool {
        self.applicants
            .values()
            .any(|a| !a.audit.deleted && a.details.id_number == id_number)
    }
}

/// In-memory application store implementation for testing.
///
/// Every write takes the single table lock, which gives the same atomicity
/// the PostgreSQL implementation gets from transactions and conditional
/// updates.
#[derive(Clone, Default)]
pub struct InMemoryApplicationStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryApplicationStore {
    /// Creates a new empty in-memory application store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored applicants, deleted or not.
    pub async fn applicant_count(&self) -> usize {
        self.tables.read().await.applicants.len()
    }

    /// Returns the number of stored applications, deleted or not.
    pub async fn application_count(&self) -> usize {
        self.tables.read().await.applications.len()
    }
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn create_draft(
        &self,
        draft: &DraftApplication,
        actor: &Actor,
    ) -> Result<LoanApplication> {
        let mut tables = self.tables.write().await;

        // Unique constraint simulation
        if tables.active_id_number_taken(&draft.customer.id_number) {
            return Err(StoreError::Conflict {
                constraint: "applicants_id_number_active_key".to_string(),
                message: "an active applicant with this id_number already exists".to_string(),
            });
        }

        let audit = AuditTrail::created(actor, AuditTrail::timestamp_now());
        let applicant = Applicant {
            id: ApplicantId::new(),
            details: draft.customer.clone(),
            audit: audit.clone(),
        };
        let application_id = ApplicationId::new();
        let row = StoredApplication {
            applicant_id: applicant.id,
            proposed_loan: draft.proposed_loan,
            collateral: draft.collateral.clone(),
            status: ApplicationStatus::Draft,
            audit,
        };

        tables.applicants.insert(applicant.id, applicant);
        let composed = tables.compose(application_id, &row)?;
        tables.applications.insert(application_id, row);

        Ok(composed)
    }

    async fn get(&self, id: ApplicationId) -> Result<Option<LoanApplication>> {
        let tables = self.tables.read().await;
        match tables.applications.get(&id) {
            Some(row) if !row.audit.deleted => tables.compose(id, row).map(Some),
            _ => Ok(None),
        }
    }

    async fn get_including_deleted(&self, id: ApplicationId) -> Result<Option<LoanApplication>> {
        let tables = self.tables.read().await;
        tables
            .applications
            .get(&id)
            .map(|row| tables.compose(id, row))
            .transpose()
    }

    async fn apply_transition(
        &self,
        id: ApplicationId,
        transition: Transition,
        actor: &Actor,
    ) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables.applications.get_mut(&id) else {
            return Ok(false);
        };

        let already_applied = transition.is_idempotent() && row.status == transition.target();
        if row.audit.deleted {
            return Ok(already_applied);
        }
        let next = match transition.apply(row.status) {
            Ok(next) => next,
            Err(e) => {
                tracing::debug!(application_id = %id, error = %e, "transition precondition failed");
                return Ok(already_applied);
            }
        };

        let now = AuditTrail::timestamp_now();
        row.status = next;
        row.audit.touch(actor, now);
        if transition.soft_deletes() {
            row.audit.soft_delete(now);
        }

        Ok(true)
    }
}
