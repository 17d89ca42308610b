use serde::{Deserialize, Serialize};

/// Conversation thread held by the external chat directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Opaque directory identifier (hex object id)
    pub id: String,
    pub phone: String,
    pub account_id: i64,
    pub tenant_id: i64,
    pub lead_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChat {
    pub phone: String,
    pub dial_code: String,
    pub region_code: String,
    pub account_id: i64,
    pub tenant_id: i64,
}
