use leadflow_core::{
    models::{Lead, NewLead},
    AppError,
};
use sqlx::{PgPool, Postgres};

const LEAD_COLUMNS: &str = "id, name, email, cpf, contact_cellphone, dial_code, region_code, \
     source_id, channel_id, chat_id, import_id, tenant_id, account_id, creator_id, is_deleted, \
     created_at, updated_at";

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Phones from `phones` already held by a live lead of the tenant+account
    #[tracing::instrument(skip(self, phones), fields(db.table = "leads", db.operation = "select", phones = phones.len()))]
    pub async fn existing_phones(
        &self,
        tenant_id: i64,
        account_id: i64,
        phones: &[String],
    ) -> Result<Vec<String>, AppError> {
        if phones.is_empty() {
            return Ok(Vec::new());
        }

        let found = sqlx::query_scalar::<Postgres, String>(
            r#"
            SELECT DISTINCT contact_cellphone
            FROM leads
            WHERE tenant_id = $1
              AND account_id = $2
              AND contact_cellphone = ANY($3)
              AND is_deleted = FALSE
            "#,
        )
        .bind(tenant_id)
        .bind(account_id)
        .bind(phones)
        .fetch_all(&self.pool)
        .await?;

        Ok(found)
    }

    #[tracing::instrument(skip(self, lead), fields(db.table = "leads", db.operation = "insert", import_id = lead.import_id))]
    pub async fn create(&self, lead: &NewLead) -> Result<Lead, AppError> {
        let query = format!(
            r#"
            INSERT INTO leads (
                name, email, cpf, contact_cellphone, dial_code, region_code,
                source_id, channel_id, chat_id, import_id, tenant_id, account_id, creator_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {LEAD_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<Postgres, Lead>(&query)
            .bind(&lead.name)
            .bind(&lead.email)
            .bind(&lead.cpf)
            .bind(&lead.contact_cellphone)
            .bind(&lead.dial_code)
            .bind(&lead.region_code)
            .bind(lead.source_id)
            .bind(lead.channel_id)
            .bind(&lead.chat_id)
            .bind(lead.import_id)
            .bind(lead.tenant_id)
            .bind(lead.account_id)
            .bind(lead.creator_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }
}
