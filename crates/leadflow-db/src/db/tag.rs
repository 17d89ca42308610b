use leadflow_core::{models::Tag, AppError};
use sqlx::{PgPool, Postgres};

#[derive(Clone)]
pub struct TagRepository {
    pool: PgPool,
}

impl TagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Case-insensitive lookup among the tenant's non-deleted tags
    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "select"))]
    pub async fn find_by_name(&self, tenant_id: i64, name: &str) -> Result<Option<Tag>, AppError> {
        let tag = sqlx::query_as::<Postgres, Tag>(
            r#"
            SELECT id, name, tenant_id, creator_id, is_deleted, created_at, updated_at
            FROM tags
            WHERE tenant_id = $1 AND LOWER(name) = LOWER($2) AND is_deleted = FALSE
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tag)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "insert"))]
    pub async fn create(&self, tenant_id: i64, creator_id: i64, name: &str) -> Result<Tag, AppError> {
        let tag = sqlx::query_as::<Postgres, Tag>(
            r#"
            INSERT INTO tags (name, tenant_id, creator_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, tenant_id, creator_id, is_deleted, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(tenant_id)
        .bind(creator_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(tag)
    }

    /// Subset of `tag_ids` that are live tags of the tenant
    #[tracing::instrument(skip(self, tag_ids), fields(db.table = "tags", db.operation = "select", requested = tag_ids.len()))]
    pub async fn active_ids(&self, tenant_id: i64, tag_ids: &[i64]) -> Result<Vec<i64>, AppError> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT id
            FROM tags
            WHERE tenant_id = $1 AND id = ANY($2) AND is_deleted = FALSE
            ORDER BY id ASC
            "#,
        )
        .bind(tenant_id)
        .bind(tag_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
