use chrono::{DateTime, Utc};
use leadflow_core::{
    models::{ImportCounters, ImportWindowUsage, LeadImport, LeadImportStatus, NewLeadImport},
    AppError,
};
use sqlx::{PgPool, Postgres};

const IMPORT_COLUMNS: &str = "id, name, status, total_created, total_existing, total_errors, \
     is_deleted, creator_id, tenant_id, source_id, account_id, created_at, updated_at";

/// Repository for import job records
#[derive(Clone)]
pub struct LeadImportRepository {
    pool: PgPool,
}

impl LeadImportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a job in `PROCESSING` state
    ///
    /// A concurrent submission that slipped past the name check surfaces as `Conflict`.
    #[tracing::instrument(skip(self, job), fields(db.table = "lead_imports", db.operation = "insert", tenant_id = job.tenant_id, account_id = job.account_id))]
    pub async fn create(&self, job: &NewLeadImport) -> Result<LeadImport, AppError> {
        let query = format!(
            r#"
            INSERT INTO lead_imports (name, status, creator_id, tenant_id, source_id, account_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {IMPORT_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<Postgres, LeadImport>(&query)
            .bind(&job.name)
            .bind(LeadImportStatus::Processing)
            .bind(job.creator_id)
            .bind(job.tenant_id)
            .bind(job.source_id)
            .bind(job.account_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::Conflict("an import with this name already exists".to_string())
                }
                other => AppError::Database(other),
            })?;

        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "lead_imports", db.operation = "select"))]
    pub async fn name_taken(
        &self,
        tenant_id: i64,
        account_id: i64,
        name: &str,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM lead_imports
                WHERE tenant_id = $1 AND account_id = $2 AND name = $3 AND is_deleted = FALSE
            )
            "#,
        )
        .bind(tenant_id)
        .bind(account_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Job count and summed `total_created` for live jobs created after `since`
    #[tracing::instrument(skip(self), fields(db.table = "lead_imports", db.operation = "select"))]
    pub async fn window_usage(
        &self,
        tenant_id: i64,
        account_id: i64,
        since: DateTime<Utc>,
    ) -> Result<ImportWindowUsage, AppError> {
        let usage = sqlx::query_as::<Postgres, ImportWindowUsage>(
            r#"
            SELECT COUNT(*)::BIGINT AS jobs,
                   COALESCE(SUM(total_created), 0)::BIGINT AS leads_created
            FROM lead_imports
            WHERE tenant_id = $1
              AND account_id = $2
              AND created_at > $3
              AND is_deleted = FALSE
            "#,
        )
        .bind(tenant_id)
        .bind(account_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(usage)
    }

    /// Write the terminal status and counters. Only a `PROCESSING` job is updated.
    #[tracing::instrument(skip(self), fields(db.table = "lead_imports", db.operation = "update", db.record_id = id))]
    pub async fn finalize(
        &self,
        id: i64,
        status: LeadImportStatus,
        counters: ImportCounters,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE lead_imports
            SET status = $2,
                total_created = $3,
                total_existing = $4,
                total_errors = $5,
                updated_at = NOW()
            WHERE id = $1 AND status = 'PROCESSING'
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(counters.created)
        .bind(counters.existing)
        .bind(counters.errors)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "lead_imports", db.operation = "select", db.record_id = id))]
    pub async fn get(&self, tenant_id: i64, id: i64) -> Result<Option<LeadImport>, AppError> {
        let query = format!(
            "SELECT {IMPORT_COLUMNS} FROM lead_imports WHERE tenant_id = $1 AND id = $2 AND is_deleted = FALSE"
        );

        let job = sqlx::query_as::<Postgres, LeadImport>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    #[tracing::instrument(skip(self), fields(db.table = "lead_imports", db.operation = "select"))]
    pub async fn list(
        &self,
        tenant_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeadImport>, AppError> {
        let query = format!(
            r#"
            SELECT {IMPORT_COLUMNS}
            FROM lead_imports
            WHERE tenant_id = $1 AND is_deleted = FALSE
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        );

        let jobs = sqlx::query_as::<Postgres, LeadImport>(&query)
            .bind(tenant_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(jobs)
    }
}
