use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Tenant-scoped label, unique by lower-cased name among non-deleted tags
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub tenant_id: i64,
    pub creator_id: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Link between a chat, a tag and the lead materialized for that chat
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ChatTag {
    pub id: i64,
    pub chat_id: String,
    pub tag_id: i64,
    pub lead_id: i64,
    pub tenant_id: i64,
    pub creator_id: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChatTag {
    pub chat_id: String,
    pub tag_id: i64,
    pub lead_id: i64,
    pub tenant_id: i64,
    pub creator_id: i64,
}
