use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{
    Actor, Address, Applicant, ApplicantId, ApplicationStatus, AuditTrail, Collateral,
    CollateralCategory, CustomerDetails, DraftApplication, LoanApplication, Money, ProposedLoan,
    Transition,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{ApplicationId, Result, StoreError, store::ApplicationStore};

/// Partial unique index enforcing one active applicant per id-number.
const ACTIVE_ID_NUMBER_INDEX: &str = "applicants_id_number_active_key";

const APPLICATION_COLUMNS: &str = r#"
    l.id, l.status, l.tenure_months, l.amount,
    l.collateral_category, l.collateral_brand, l.collateral_variant,
    l.collateral_manufacturing_year, l.collateral_is_document_complete,
    l.created_at, l.updated_at, l.created_by, l.updated_by, l.deleted, l.deleted_at,
    a.id AS a_id, a.full_name AS a_full_name, a.date_of_birth AS a_date_of_birth,
    a.id_number AS a_id_number, a.email AS a_email, a.phone AS a_phone,
    a.address_street AS a_address_street, a.address_city AS a_address_city,
    a.address_zipcode AS a_address_zipcode,
    a.created_at AS a_created_at, a.updated_at AS a_updated_at,
    a.created_by AS a_created_by, a.updated_by AS a_updated_by,
    a.deleted AS a_deleted, a.deleted_at AS a_deleted_at
"#;

/// PostgreSQL-backed application store.
///
/// Create runs as one transaction spanning both inserts. Transitions are
/// single conditional `UPDATE` statements; Postgres re-checks the `WHERE`
/// clause after taking the row lock, so racing writers under the default
/// READ COMMITTED isolation see first-writer-wins semantics.
#[derive(Clone)]
pub struct PostgresApplicationStore {
    pool: PgPool,
}

impl PostgresApplicationStore {
    /// Creates a new PostgreSQL application store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Verifies that the database answers a trivial query.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn fetch_application(
        &self,
        id: ApplicationId,
        include_deleted: bool,
    ) -> Result<Option<LoanApplication>> {
        let mut sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM loan_applications l \
             JOIN applicants a ON l.applicant_id = a.id WHERE l.id = $1"
        );
        if !include_deleted {
            sql.push_str(" AND l.deleted = FALSE");
        }

        let row: Option<PgRow> = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_application).transpose()
    }

    fn row_to_application(row: PgRow) -> Result<LoanApplication> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<ApplicationStatus>()
            .map_err(|e| StoreError::InvalidRow(e.to_string()))?;

        let tenure: i16 = row.try_get("tenure_months")?;
        let tenure_months = u8::try_from(tenure)
            .map_err(|_| StoreError::InvalidRow(format!("tenure out of range: {tenure}")))?;

        let category: String = row.try_get("collateral_category")?;
        let category = CollateralCategory::parse(&category).ok_or_else(|| {
            StoreError::InvalidRow(format!("unknown collateral category: {category}"))
        })?;

        let applicant = Applicant {
            id: ApplicantId::from_uuid(row.try_get::<Uuid, _>("a_id")?),
            details: CustomerDetails {
                full_name: row.try_get("a_full_name")?,
                date_of_birth: row.try_get::<NaiveDate, _>("a_date_of_birth")?,
                id_number: row.try_get("a_id_number")?,
                email: row.try_get("a_email")?,
                phone: row.try_get("a_phone")?,
                address: Address {
                    street: row.try_get("a_address_street")?,
                    city: row.try_get("a_address_city")?,
                    zipcode: row.try_get("a_address_zipcode")?,
                },
            },
            audit: Self::row_to_audit(&row, "a_")?,
        };

        Ok(LoanApplication {
            id: ApplicationId::from_uuid(row.try_get::<Uuid, _>("id")?),
            applicant,
            proposed_loan: ProposedLoan {
                tenure_months,
                amount: Money::new(row.try_get("amount")?),
            },
            collateral: Collateral {
                category,
                brand: row.try_get("collateral_brand")?,
                variant: row.try_get("collateral_variant")?,
                manufacturing_year: row.try_get("collateral_manufacturing_year")?,
                is_document_complete: row.try_get("collateral_is_document_complete")?,
            },
            status,
            audit: Self::row_to_audit(&row, "")?,
        })
    }

    fn row_to_audit(row: &PgRow, prefix: &str) -> Result<AuditTrail> {
        let column = |name: &str| format!("{prefix}{name}");
        Ok(AuditTrail {
            created_at: row.try_get::<DateTime<Utc>, _>(column("created_at").as_str())?,
            updated_at: row.try_get::<DateTime<Utc>, _>(column("updated_at").as_str())?,
            created_by: row.try_get(column("created_by").as_str())?,
            updated_by: row.try_get(column("updated_by").as_str())?,
            deleted: row.try_get(column("deleted").as_str())?,
            deleted_at: row.try_get(column("deleted_at").as_str())?,
        })
    }
}

/// Translates write failures, surfacing unique violations as conflicts.
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        let constraint = db_err.constraint().unwrap_or("unique").to_string();
        let message = if constraint == ACTIVE_ID_NUMBER_INDEX {
            "an active applicant with this id_number already exists".to_string()
        } else {
            db_err.message().to_string()
        };
        return StoreError::Conflict {
            constraint,
            message,
        };
    }
    StoreError::Database(e)
}

fn record_duration(operation: &'static str, started: Instant) {
    metrics::histogram!("application_store_operation_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}

#[async_trait]
impl ApplicationStore for PostgresApplicationStore {
    async fn create_draft(
        &self,
        draft: &DraftApplication,
        actor: &Actor,
    ) -> Result<LoanApplication> {
        let started = Instant::now();
        let applicant_id = ApplicantId::new();
        let application_id = ApplicationId::new();
        let audit = AuditTrail::created(actor, AuditTrail::timestamp_now());
        let customer = &draft.customer;
        let collateral = &draft.collateral;

        // Dropping the transaction without commit rolls both inserts back
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO applicants
                (id, full_name, date_of_birth, id_number, email, phone,
                 address_street, address_city, address_zipcode,
                 created_at, updated_at, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(applicant_id.as_uuid())
        .bind(&customer.full_name)
        .bind(customer.date_of_birth)
        .bind(&customer.id_number)
        .bind(customer.email.as_deref())
        .bind(&customer.phone)
        .bind(&customer.address.street)
        .bind(&customer.address.city)
        .bind(&customer.address.zipcode)
        .bind(audit.created_at)
        .bind(audit.updated_at)
        .bind(&audit.created_by)
        .bind(&audit.updated_by)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        sqlx::query(
            r#"
            INSERT INTO loan_applications
                (id, applicant_id, status, tenure_months, amount,
                 collateral_category, collateral_brand, collateral_variant,
                 collateral_manufacturing_year, collateral_is_document_complete,
                 created_at, updated_at, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(application_id.as_uuid())
        .bind(applicant_id.as_uuid())
        .bind(ApplicationStatus::Draft.as_str())
        .bind(i16::from(draft.proposed_loan.tenure_months))
        .bind(draft.proposed_loan.amount.as_decimal())
        .bind(collateral.category.as_str())
        .bind(&collateral.brand)
        .bind(&collateral.variant)
        .bind(collateral.manufacturing_year)
        .bind(collateral.is_document_complete)
        .bind(audit.created_at)
        .bind(audit.updated_at)
        .bind(&audit.created_by)
        .bind(&audit.updated_by)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;
        record_duration("create_draft", started);

        tracing::debug!(%application_id, %applicant_id, "inserted draft application");

        Ok(LoanApplication {
            id: application_id,
            applicant: Applicant {
                id: applicant_id,
                details: customer.clone(),
                audit: audit.clone(),
            },
            proposed_loan: draft.proposed_loan,
            collateral: collateral.clone(),
            status: ApplicationStatus::Draft,
            audit,
        })
    }

    async fn get(&self, id: ApplicationId) -> Result<Option<LoanApplication>> {
        let started = Instant::now();
        let application = self.fetch_application(id, false).await?;
        record_duration("get", started);
        Ok(application)
    }

    async fn get_including_deleted(&self, id: ApplicationId) -> Result<Option<LoanApplication>> {
        let started = Instant::now();
        let application = self.fetch_application(id, true).await?;
        record_duration("get_including_deleted", started);
        Ok(application)
    }

    async fn apply_transition(
        &self,
        id: ApplicationId,
        transition: Transition,
        actor: &Actor,
    ) -> Result<bool> {
        let started = Instant::now();
        let now = AuditTrail::timestamp_now();
        let source_states: Vec<String> = transition
            .source_states()
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let result = sqlx::query(
            r#"
            UPDATE loan_applications
            SET status = $2,
                updated_at = $3,
                updated_by = $4,
                deleted = deleted OR $5,
                deleted_at = CASE WHEN $5 THEN $3 ELSE deleted_at END
            WHERE id = $1 AND deleted = FALSE AND status = ANY($6)
            "#,
        )
        .bind(id.as_uuid())
        .bind(transition.target().as_str())
        .bind(now)
        .bind(actor.as_str())
        .bind(transition.soft_deletes())
        .bind(source_states)
        .execute(&self.pool)
        .await?;

        let applied = if result.rows_affected() == 1 {
            true
        } else if transition.is_idempotent() {
            // A repeat of an idempotent transition matches zero rows; it still
            // succeeds if the row already holds the target status.
            self.fetch_application(id, true)
                .await?
                .is_some_and(|current| current.status == transition.target())
        } else {
            false
        };

        record_duration(transition.as_str(), started);
        Ok(applied)
    }
}
