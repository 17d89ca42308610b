//! Store capabilities consumed by the orchestrator and the worker
//!
//! The pipeline never sees a `PgPool`. It depends on these traits so that tests can swap
//! in the in-memory store from `test_helpers`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadflow_core::{
    models::{
        ChatTag, ImportCounters, ImportWindowUsage, Lead, LeadChannel, LeadImport,
        LeadImportStatus, NewChatTag, NewLead, NewLeadImport, Tag,
    },
    AppError,
};
use sqlx::PgPool;

use crate::db::{
    CatalogRepository, ChatTagRepository, LeadImportRepository, LeadRepository,
    PatientRepository, TagRepository,
};

/// Job records plus the lookups needed before a job may be created
#[async_trait]
pub trait ImportJobStore: Send + Sync {
    async fn source_exists(&self, source_id: i64) -> Result<bool, AppError>;

    async fn account_owned_by(&self, account_id: i64, tenant_id: i64) -> Result<bool, AppError>;

    async fn import_name_taken(
        &self,
        tenant_id: i64,
        account_id: i64,
        name: &str,
    ) -> Result<bool, AppError>;

    /// Subset of `tag_ids` that are live tags owned by the tenant
    async fn active_tag_ids(&self, tenant_id: i64, tag_ids: &[i64]) -> Result<Vec<i64>, AppError>;

    async fn import_window_usage(
        &self,
        tenant_id: i64,
        account_id: i64,
        since: DateTime<Utc>,
    ) -> Result<ImportWindowUsage, AppError>;

    async fn create_import(&self, job: &NewLeadImport) -> Result<LeadImport, AppError>;

    async fn get_import(&self, tenant_id: i64, id: i64) -> Result<Option<LeadImport>, AppError>;

    async fn list_imports(
        &self,
        tenant_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeadImport>, AppError>;

    /// Returns false when the job was not in `PROCESSING` state
    async fn finalize_import(
        &self,
        id: i64,
        status: LeadImportStatus,
        counters: ImportCounters,
    ) -> Result<bool, AppError>;
}

/// Reads and writes performed while materializing rows
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn existing_lead_phones(
        &self,
        tenant_id: i64,
        account_id: i64,
        phones: &[String],
    ) -> Result<Vec<String>, AppError>;

    async fn existing_patient_phones(
        &self,
        tenant_id: i64,
        phones: &[String],
    ) -> Result<Vec<String>, AppError>;

    async fn find_tag_by_name(&self, tenant_id: i64, name: &str) -> Result<Option<Tag>, AppError>;

    async fn create_tag(&self, tenant_id: i64, creator_id: i64, name: &str) -> Result<Tag, AppError>;

    /// Live tenant tags among explicitly requested ids
    async fn resolve_tag_ids(&self, tenant_id: i64, tag_ids: &[i64]) -> Result<Vec<i64>, AppError>;

    async fn find_channel_by_name(&self, name: &str) -> Result<Option<LeadChannel>, AppError>;

    async fn create_lead(&self, lead: &NewLead) -> Result<Lead, AppError>;

    async fn create_chat_tag(&self, link: &NewChatTag) -> Result<ChatTag, AppError>;
}

/// Postgres-backed implementation of both store traits
#[derive(Clone)]
pub struct PgLeadImportStore {
    imports: LeadImportRepository,
    leads: LeadRepository,
    patients: PatientRepository,
    tags: TagRepository,
    chat_tags: ChatTagRepository,
    catalog: CatalogRepository,
}

impl PgLeadImportStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            imports: LeadImportRepository::new(pool.clone()),
            leads: LeadRepository::new(pool.clone()),
            patients: PatientRepository::new(pool.clone()),
            tags: TagRepository::new(pool.clone()),
            chat_tags: ChatTagRepository::new(pool.clone()),
            catalog: CatalogRepository::new(pool),
        }
    }

    pub fn shared(pool: PgPool) -> Arc<Self> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ImportJobStore for PgLeadImportStore {
    async fn source_exists(&self, source_id: i64) -> Result<bool, AppError> {
        self.catalog.source_exists(source_id).await
    }

    async fn account_owned_by(&self, account_id: i64, tenant_id: i64) -> Result<bool, AppError> {
        self.catalog.account_owned_by(account_id, tenant_id).await
    }

    async fn import_name_taken(
        &self,
        tenant_id: i64,
        account_id: i64,
        name: &str,
    ) -> Result<bool, AppError> {
        self.imports.name_taken(tenant_id, account_id, name).await
    }

    async fn active_tag_ids(&self, tenant_id: i64, tag_ids: &[i64]) -> Result<Vec<i64>, AppError> {
        self.tags.active_ids(tenant_id, tag_ids).await
    }

    async fn import_window_usage(
        &self,
        tenant_id: i64,
        account_id: i64,
        since: DateTime<Utc>,
    ) -> Result<ImportWindowUsage, AppError> {
        self.imports.window_usage(tenant_id, account_id, since).await
    }

    async fn create_import(&self, job: &NewLeadImport) -> Result<LeadImport, AppError> {
        self.imports.create(job).await
    }

    async fn get_import(&self, tenant_id: i64, id: i64) -> Result<Option<LeadImport>, AppError> {
        self.imports.get(tenant_id, id).await
    }

    async fn list_imports(
        &self,
        tenant_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeadImport>, AppError> {
        self.imports.list(tenant_id, limit, offset).await
    }

    async fn finalize_import(
        &self,
        id: i64,
        status: LeadImportStatus,
        counters: ImportCounters,
    ) -> Result<bool, AppError> {
        self.imports.finalize(id, status, counters).await
    }
}

#[async_trait]
impl LeadStore for PgLeadImportStore {
    async fn existing_lead_phones(
        &self,
        tenant_id: i64,
        account_id: i64,
        phones: &[String],
    ) -> Result<Vec<String>, AppError> {
        self.leads.existing_phones(tenant_id, account_id, phones).await
    }

    async fn existing_patient_phones(
        &self,
        tenant_id: i64,
        phones: &[String],
    ) -> Result<Vec<String>, AppError> {
        self.patients.existing_phones(tenant_id, phones).await
    }

    async fn find_tag_by_name(&self, tenant_id: i64, name: &str) -> Result<Option<Tag>, AppError> {
        self.tags.find_by_name(tenant_id, name).await
    }

    async fn create_tag(&self, tenant_id: i64, creator_id: i64, name: &str) -> Result<Tag, AppError> {
        self.tags.create(tenant_id, creator_id, name).await
    }

    async fn resolve_tag_ids(&self, tenant_id: i64, tag_ids: &[i64]) -> Result<Vec<i64>, AppError> {
        self.tags.active_ids(tenant_id, tag_ids).await
    }

    async fn find_channel_by_name(&self, name: &str) -> Result<Option<LeadChannel>, AppError> {
        self.catalog.find_channel_by_name(name).await
    }

    async fn create_lead(&self, lead: &NewLead) -> Result<Lead, AppError> {
        self.leads.create(lead).await
    }

    async fn create_chat_tag(&self, link: &NewChatTag) -> Result<ChatTag, AppError> {
        self.chat_tags.create(link).await
    }
}
