use leadflow_core::AppError;
use sqlx::{PgPool, Postgres};

#[derive(Clone)]
pub struct PatientRepository {
    pool: PgPool,
}

impl PatientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Phones from `phones` already held by a live patient of the tenant
    #[tracing::instrument(skip(self, phones), fields(db.table = "patients", db.operation = "select", phones = phones.len()))]
    pub async fn existing_phones(
        &self,
        tenant_id: i64,
        phones: &[String],
    ) -> Result<Vec<String>, AppError> {
        if phones.is_empty() {
            return Ok(Vec::new());
        }

        let found = sqlx::query_scalar::<Postgres, String>(
            r#"
            SELECT DISTINCT contact_cellphone
            FROM patients
            WHERE tenant_id = $1
              AND contact_cellphone = ANY($2)
              AND deleted_at IS NULL
            "#,
        )
        .bind(tenant_id)
        .bind(phones)
        .fetch_all(&self.pool)
        .await?;

        Ok(found)
    }
}
