use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

/// Lifecycle of an import job. Created as `Processing`, finalized exactly once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "lead_import_status", rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum LeadImportStatus {
    Processing,
    Finished,
    Failed,
}

impl LeadImportStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LeadImportStatus::Processing)
    }
}

impl Display for LeadImportStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            LeadImportStatus::Processing => write!(f, "PROCESSING"),
            LeadImportStatus::Finished => write!(f, "FINISHED"),
            LeadImportStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for LeadImportStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESSING" => Ok(LeadImportStatus::Processing),
            "FINISHED" => Ok(LeadImportStatus::Finished),
            "FAILED" => Ok(LeadImportStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid import status: {}", s)),
        }
    }
}

/// Job record for one bulk import submission
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LeadImport {
    pub id: i64,
    pub name: String,
    pub status: LeadImportStatus,
    pub total_created: i64,
    pub total_existing: i64,
    pub total_errors: i64,
    pub is_deleted: bool,
    pub creator_id: i64,
    pub tenant_id: i64,
    pub source_id: i64,
    pub account_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeadImport {
    pub fn counters(&self) -> ImportCounters {
        ImportCounters {
            created: self.total_created,
            existing: self.total_existing,
            errors: self.total_errors,
        }
    }
}

/// Values needed to insert a job in `Processing` state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLeadImport {
    pub name: String,
    pub creator_id: i64,
    pub tenant_id: i64,
    pub source_id: i64,
    pub account_id: i64,
}

/// Per-job outcome buckets. Every visited row lands in exactly one of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImportCounters {
    pub created: i64,
    pub existing: i64,
    pub errors: i64,
}

impl ImportCounters {
    pub fn total(&self) -> i64 {
        self.created + self.existing + self.errors
    }
}

/// Jobs submitted by a tenant+account inside the trailing rate-limit window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ImportWindowUsage {
    pub jobs: i64,
    pub leads_created: i64,
}

/// JSON part of the multipart submission
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ImportRequest {
    #[validate(length(min = 1, max = 255, message = "name is required and must be at most 255 characters"))]
    #[serde(default)]
    pub name: String,
    #[validate(range(min = 1, message = "account_id is required"))]
    #[serde(default)]
    pub account_id: i64,
    #[validate(range(min = 1, message = "source_id is required"))]
    #[serde(default)]
    pub source_id: i64,
    #[validate(length(max = 5, message = "max 5 tag ids"))]
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}
