use serde::{Deserialize, Serialize};

/// Identity of the caller on whose behalf an import runs.
///
/// The tenant is the company that owns every entity touched by the import; the user is
/// recorded as creator on the job, its leads, tags and chat tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant_id: i64,
    pub user_id: i64,
}
