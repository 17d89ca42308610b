use leadflow_core::{models::LeadChannel, AppError};
use sqlx::{PgPool, Postgres};

/// Read-only access to sources, channels and messaging accounts
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "lead_sources", db.operation = "select"))]
    pub async fn source_exists(&self, source_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM lead_sources WHERE id = $1 AND is_deleted = FALSE)",
        )
        .bind(source_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self), fields(db.table = "messaging_accounts", db.operation = "select"))]
    pub async fn account_owned_by(&self, account_id: i64, tenant_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM messaging_accounts WHERE id = $1 AND tenant_id = $2 AND is_deleted = FALSE)",
        )
        .bind(account_id)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Case-insensitive lookup among non-deleted channels
    #[tracing::instrument(skip(self), fields(db.table = "lead_channels", db.operation = "select"))]
    pub async fn find_channel_by_name(&self, name: &str) -> Result<Option<LeadChannel>, AppError> {
        let channel = sqlx::query_as::<Postgres, LeadChannel>(
            r#"
            SELECT id, name, is_deleted
            FROM lead_channels
            WHERE LOWER(name) = LOWER($1) AND is_deleted = FALSE
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(channel)
    }
}
