use serde::{Deserialize, Serialize};

/// Categorical origin attached to every lead ("import", "whatsapp", ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LeadChannel {
    pub id: i64,
    pub name: String,
    pub is_deleted: bool,
}
