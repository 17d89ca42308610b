use leadflow_core::{
    models::{ChatTag, NewChatTag},
    AppError,
};
use sqlx::{PgPool, Postgres};

#[derive(Clone)]
pub struct ChatTagRepository {
    pool: PgPool,
}

impl ChatTagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, link), fields(db.table = "chat_tags", db.operation = "insert", tag_id = link.tag_id, lead_id = link.lead_id))]
    pub async fn create(&self, link: &NewChatTag) -> Result<ChatTag, AppError> {
        let created = sqlx::query_as::<Postgres, ChatTag>(
            r#"
            INSERT INTO chat_tags (chat_id, tag_id, lead_id, tenant_id, creator_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, chat_id, tag_id, lead_id, tenant_id, creator_id, is_deleted, created_at
            "#,
        )
        .bind(&link.chat_id)
        .bind(link.tag_id)
        .bind(link.lead_id)
        .bind(link.tenant_id)
        .bind(link.creator_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }
}
