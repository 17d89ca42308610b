//! Shared application state handed to every handler

use std::sync::Arc;

use leadflow_db::{ImportJobStore, LeadStore};
use leadflow_processing::FileParser;
use leadflow_services::PermissionChecker;
use leadflow_worker::ImportQueue;
use sqlx::PgPool;

use crate::services::ImportOrchestrator;

/// Persistence handles; `pool` is absent when the stores are not Postgres-backed
#[derive(Clone)]
pub struct Stores {
    pub pool: Option<PgPool>,
    pub jobs: Arc<dyn ImportJobStore>,
    pub leads: Arc<dyn LeadStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        let store = leadflow_db::PgLeadImportStore::shared(pool.clone());
        Self {
            pool: Some(pool),
            jobs: store.clone(),
            leads: store,
        }
    }
}

#[derive(Clone)]
pub struct UploadConfig {
    pub max_upload_bytes: usize,
    pub file_parser: FileParser,
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: Option<PgPool>,
    pub jobs: Arc<dyn ImportJobStore>,
    pub orchestrator: ImportOrchestrator,
    pub queue: ImportQueue,
    pub permissions: Arc<dyn PermissionChecker>,
    pub upload: UploadConfig,
}
