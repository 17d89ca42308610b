use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted lead, one per materialized import row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Lead {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub cpf: Option<String>,
    pub contact_cellphone: String,
    pub dial_code: String,
    pub region_code: String,
    pub source_id: i64,
    pub channel_id: i64,
    pub chat_id: Option<String>,
    pub import_id: i64,
    pub tenant_id: i64,
    pub account_id: i64,
    pub creator_id: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLead {
    pub name: Option<String>,
    pub email: Option<String>,
    pub cpf: Option<String>,
    pub contact_cellphone: String,
    pub dial_code: String,
    pub region_code: String,
    pub source_id: i64,
    pub channel_id: i64,
    pub chat_id: Option<String>,
    pub import_id: i64,
    pub tenant_id: i64,
    pub account_id: i64,
    pub creator_id: i64,
}
