//! Loan application endpoints.

use std::sync::Arc;

use application_store::ApplicationStore;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::NaiveDate;
use common::{Address, ApplicationStatus, Collateral, LoanApplication};
use domain::{Actor, ApplicationId, DraftRequest, LoanApplicationService, Transition};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ApiError;

/// Header naming the caller recorded in audit columns.
pub const ACTOR_HEADER: &str = "x-actor";

/// Shared application state accessible from all handlers.
pub struct AppState<S: ApplicationStore> {
    pub service: LoanApplicationService<S>,
    /// Actor used when a request carries no actor header.
    pub default_actor: Actor,
}

impl<S: ApplicationStore> AppState<S> {
    fn actor(&self, headers: &HeaderMap) -> Actor {
        headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Actor::new)
            .unwrap_or_else(|| self.default_actor.clone())
    }
}

// -- Response types --

#[derive(Serialize)]
pub struct ApplicationCreatedResponse {
    pub id: String,
    pub status: ApplicationStatus,
}

#[derive(Serialize)]
pub struct ApplicationResponse {
    pub id: String,
    pub status: ApplicationStatus,
    pub customer: CustomerResponse,
    pub collateral: Collateral,
    pub proposed_loan: ProposedLoanResponse,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: String,
    pub updated_by: String,
}

#[derive(Serialize)]
pub struct CustomerResponse {
    pub id: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub id_number: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Address,
}

#[derive(Serialize)]
pub struct ProposedLoanResponse {
    pub tenure: u8,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// Application view that also covers cancelled, soft-deleted records.
#[derive(Serialize)]
pub struct ApplicationAuditResponse {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub deleted: bool,
    pub deleted_at: Option<String>,
}

#[derive(Serialize)]
pub struct TransitionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<LoanApplication> for ApplicationResponse {
    fn from(app: LoanApplication) -> Self {
        let applicant = app.applicant;
        Self {
            id: app.id.to_string(),
            status: app.status,
            customer: CustomerResponse {
                id: applicant.id.to_string(),
                full_name: applicant.details.full_name,
                date_of_birth: applicant.details.date_of_birth,
                id_number: applicant.details.id_number,
                email: applicant.details.email,
                phone: applicant.details.phone,
                address: applicant.details.address,
            },
            collateral: app.collateral,
            proposed_loan: ProposedLoanResponse {
                tenure: app.proposed_loan.tenure_months,
                amount: app.proposed_loan.amount.as_decimal(),
            },
            created_at: app.audit.created_at.to_rfc3339(),
            updated_at: app.audit.updated_at.to_rfc3339(),
            created_by: app.audit.created_by,
            updated_by: app.audit.updated_by,
        }
    }
}

impl From<LoanApplication> for ApplicationAuditResponse {
    fn from(app: LoanApplication) -> Self {
        let deleted = app.audit.deleted;
        let deleted_at = app.audit.deleted_at.map(|at| at.to_rfc3339());
        Self {
            application: app.into(),
            deleted,
            deleted_at,
        }
    }
}

// -- Handlers --

/// POST /applications: validate and persist a new draft.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn create<S: ApplicationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    payload: Result<Json<DraftRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApplicationCreatedResponse>), ApiError> {
    let Json(req) = payload?;
    let actor = state.actor(&headers);
    let application = state.service.create_draft(&req, &actor).await?;

    let response = ApplicationCreatedResponse {
        id: application.id.to_string(),
        status: application.status,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /applications/:id: load a non-deleted application.
#[tracing::instrument(skip(state))]
pub async fn get<S: ApplicationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let application_id = parse_application_id(&id)?;
    let application = state
        .service
        .get_application(application_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Loan application {id} not found")))?;

    Ok(Json(application.into()))
}

/// GET /applications/:id/audit: load an application even after cancellation.
#[tracing::instrument(skip(state))]
pub async fn audit<S: ApplicationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ApplicationAuditResponse>, ApiError> {
    let application_id = parse_application_id(&id)?;
    let application = state
        .service
        .get_application_audit(application_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Loan application {id} not found")))?;

    Ok(Json(application.into()))
}

/// POST /applications/:id/submit: move a draft to SUBMITTED.
#[tracing::instrument(skip(state, headers))]
pub async fn submit<S: ApplicationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<TransitionResponse>), ApiError> {
    let application_id = parse_application_id(&id)?;
    let actor = state.actor(&headers);
    let applied = state
        .service
        .submit_application(application_id, &actor)
        .await?;

    Ok(transition_response(application_id, Transition::Submit, applied))
}

/// POST /applications/:id/cancel: cancel and soft-delete an application.
#[tracing::instrument(skip(state, headers))]
pub async fn cancel<S: ApplicationStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<TransitionResponse>), ApiError> {
    let application_id = parse_application_id(&id)?;
    let actor = state.actor(&headers);
    let applied = state
        .service
        .cancel_application(application_id, &actor)
        .await?;

    Ok(transition_response(application_id, Transition::Cancel, applied))
}

fn transition_response(
    id: ApplicationId,
    transition: Transition,
    applied: bool,
) -> (StatusCode, Json<TransitionResponse>) {
    if applied {
        (
            StatusCode::OK,
            Json(TransitionResponse {
                success: true,
                error: None,
            }),
        )
    } else {
        (
            StatusCode::CONFLICT,
            Json(TransitionResponse {
                success: false,
                error: Some(format!(
                    "loan application {id} {}",
                    transition.ineligible_reason()
                )),
            }),
        )
    }
}

fn parse_application_id(id: &str) -> Result<ApplicationId, ApiError> {
    ApplicationId::parse(id).map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
