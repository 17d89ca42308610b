//! Import submission
//!
//! `start_import` is the synchronous half of an import: preflight checks against the
//! store, the job insert, and a non-blocking hand-off to the worker queue. Every check
//! runs before the insert, so a rejected request leaves no trace.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use leadflow_core::models::{
    ImportCounters, ImportRequest, LeadImportStatus, NewLeadImport, ParsedRow, TenantContext,
};
use leadflow_core::AppError;
use leadflow_db::ImportJobStore;
use leadflow_infra::ImportRateLimiter;
use leadflow_worker::{ImportJob, ImportQueue, QueueClosed};

/// Maximum explicit tag ids per request
pub const MAX_REQUEST_TAG_IDS: usize = 5;

#[derive(Clone)]
pub struct ImportOrchestrator {
    jobs: Arc<dyn ImportJobStore>,
    rate_limiter: ImportRateLimiter,
    queue: ImportQueue,
}

impl ImportOrchestrator {
    pub fn new(
        jobs: Arc<dyn ImportJobStore>,
        rate_limiter: ImportRateLimiter,
        queue: ImportQueue,
    ) -> Self {
        Self {
            jobs,
            rate_limiter,
            queue,
        }
    }

    /// Validate, record and enqueue an import; returns the new job id
    #[tracing::instrument(
        skip(self, request, rows),
        fields(
            tenant_id = tenant.tenant_id,
            account_id = request.account_id,
            source_id = request.source_id,
            rows = rows.len()
        )
    )]
    pub async fn start_import(
        &self,
        tenant: TenantContext,
        request: &ImportRequest,
        rows: Vec<ParsedRow>,
    ) -> Result<i64, AppError> {
        self.preflight(tenant, request).await?;

        let record = self
            .jobs
            .create_import(&NewLeadImport {
                name: request.name.clone(),
                creator_id: tenant.user_id,
                tenant_id: tenant.tenant_id,
                source_id: request.source_id,
                account_id: request.account_id,
            })
            .await?;

        let job = ImportJob {
            import_id: record.id,
            tenant_id: tenant.tenant_id,
            account_id: request.account_id,
            source_id: request.source_id,
            creator_id: tenant.user_id,
            tag_ids: request.tag_ids.clone(),
            rows,
        };

        if let Err(QueueClosed(job)) = self.queue.submit(job) {
            self.abandon(job.import_id).await;
            return Err(AppError::Internal(
                "import queue is shutting down".to_string(),
            ));
        }

        tracing::info!(import_id = record.id, "Import accepted");
        Ok(record.id)
    }

    /// Checks in order; the first failure wins
    async fn preflight(&self, tenant: TenantContext, request: &ImportRequest) -> Result<(), AppError> {
        if !self.jobs.source_exists(request.source_id).await? {
            return Err(AppError::NotFound(
                "invalid source_id: source not found".to_string(),
            ));
        }

        if !self
            .jobs
            .account_owned_by(request.account_id, tenant.tenant_id)
            .await?
        {
            return Err(AppError::NotFound(
                "invalid account_id: account not found or does not belong to company".to_string(),
            ));
        }

        if self
            .jobs
            .import_name_taken(tenant.tenant_id, request.account_id, &request.name)
            .await?
        {
            return Err(AppError::Conflict(
                "import name already exists for this account".to_string(),
            ));
        }

        self.check_tag_ids(tenant.tenant_id, &request.tag_ids).await?;

        self.rate_limiter
            .check(
                self.jobs.as_ref(),
                tenant.tenant_id,
                request.account_id,
                Utc::now(),
            )
            .await
    }

    async fn check_tag_ids(&self, tenant_id: i64, tag_ids: &[i64]) -> Result<(), AppError> {
        if tag_ids.len() > MAX_REQUEST_TAG_IDS {
            return Err(AppError::Unprocessable(format!(
                "max {} tag_ids allowed",
                MAX_REQUEST_TAG_IDS
            )));
        }
        if tag_ids.is_empty() {
            return Ok(());
        }

        let requested: HashSet<i64> = tag_ids.iter().copied().collect();
        let active: HashSet<i64> = self
            .jobs
            .active_tag_ids(tenant_id, tag_ids)
            .await?
            .into_iter()
            .collect();

        if !requested.is_subset(&active) {
            return Err(AppError::Unprocessable(
                "one or more tag_ids are invalid".to_string(),
            ));
        }
        Ok(())
    }

    /// Close out a job that was recorded but could not be handed to a worker
    async fn abandon(&self, import_id: i64) {
        match self
            .jobs
            .finalize_import(import_id, LeadImportStatus::Failed, ImportCounters::default())
            .await
        {
            Ok(_) => tracing::warn!(import_id, "Import rejected by closed queue, marked FAILED"),
            Err(e) => tracing::error!(
                import_id,
                error = %e,
                "Failed to mark unqueued import as FAILED"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::Duration as ChronoDuration;
    use leadflow_core::config::PipelineConfig;
    use leadflow_core::ImportLimits;
    use leadflow_db::test_helpers::InMemoryStore;
    use leadflow_worker::{ImportContext, ImportWorker};
    use tokio::sync::mpsc;

    const TENANT: TenantContext = TenantContext {
        tenant_id: 1,
        user_id: 10,
    };

    struct Harness {
        store: InMemoryStore,
        orchestrator: ImportOrchestrator,
        queue: ImportQueue,
        finished: mpsc::Receiver<leadflow_worker::ImportFinished>,
    }

    fn harness() -> Harness {
        let store = InMemoryStore::new();
        store.add_source(3);
        store.add_account(7, 1);
        store.add_channel("import");

        let worker = ImportWorker::new(ImportContext::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            PipelineConfig::default(),
        ));
        let (tx, finished) = mpsc::channel(8);
        let queue = ImportQueue::new_with_finished(worker, tx);
        let orchestrator = ImportOrchestrator::new(
            Arc::new(store.clone()),
            ImportRateLimiter::new(ImportLimits::default()),
            queue.clone(),
        );

        Harness {
            store,
            orchestrator,
            queue,
            finished,
        }
    }

    fn request(name: &str) -> ImportRequest {
        ImportRequest {
            name: name.to_string(),
            account_id: 7,
            source_id: 3,
            tag_ids: vec![],
        }
    }

    fn rows() -> Vec<ParsedRow> {
        vec![ParsedRow {
            name: "Ana".to_string(),
            phone: "11987654321".to_string(),
            dial_code: "55".to_string(),
            region_code: "BR".to_string(),
            cpf: None,
            email: None,
            tags: vec![],
        }]
    }

    #[tokio::test]
    async fn test_accepted_import_is_processed() {
        let mut h = harness();

        let id = h
            .orchestrator
            .start_import(TENANT, &request("march"), rows())
            .await
            .unwrap();

        let record = h.store.import(id).unwrap();
        assert_eq!(record.creator_id, 10);
        assert_eq!(record.tenant_id, 1);

        let finished = h.finished.recv().await.unwrap();
        assert_eq!(finished.import_id, id);
        assert_eq!(finished.status, LeadImportStatus::Finished);
        assert_eq!(finished.counters.created, 1);
    }

    #[tokio::test]
    async fn test_preflight_order_and_errors() {
        let h = harness();

        let mut bad_source = request("a");
        bad_source.source_id = 99;
        bad_source.account_id = 99;
        let err = h
            .orchestrator
            .start_import(TENANT, &bad_source, rows())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m.contains("source_id")));

        let mut foreign_account = request("a");
        foreign_account.account_id = 8;
        h.store.add_account(8, 2);
        let err = h
            .orchestrator
            .start_import(TENANT, &foreign_account, rows())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m.contains("account_id")));

        h.store.add_import(1, 7, "taken", 0, Utc::now());
        let err = h
            .orchestrator
            .start_import(TENANT, &request("taken"), rows())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        assert_eq!(h.store.imports().len(), 1);
    }

    #[tokio::test]
    async fn test_deleted_source_rejected() {
        let h = harness();
        h.store.add_deleted_source(4);
        let mut req = request("a");
        req.source_id = 4;
        let err = h
            .orchestrator
            .start_import(TENANT, &req, rows())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_tag_ids_must_all_be_live_tenant_tags() {
        let h = harness();
        let vip = h.store.add_tag(1, "VIP");
        let foreign = h.store.add_tag(2, "Other");
        let gone = h.store.add_tag(1, "Gone");
        h.store.delete_tag(gone.id);

        let mut req = request("tags");
        req.tag_ids = vec![vip.id, foreign.id];
        let err = h.orchestrator.start_import(TENANT, &req, rows()).await.unwrap_err();
        assert!(matches!(err, AppError::Unprocessable(_)));

        req.tag_ids = vec![vip.id, gone.id];
        let err = h.orchestrator.start_import(TENANT, &req, rows()).await.unwrap_err();
        assert!(matches!(err, AppError::Unprocessable(_)));

        req.tag_ids = vec![1, 2, 3, 4, 5, 6];
        let err = h.orchestrator.start_import(TENANT, &req, rows()).await.unwrap_err();
        assert!(matches!(err, AppError::Unprocessable(ref m) if m.contains("max 5")));

        req.tag_ids = vec![vip.id];
        assert!(h.orchestrator.start_import(TENANT, &req, rows()).await.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limit_allows_fifth_rejects_sixth() {
        let h = harness();
        let recent = Utc::now() - ChronoDuration::minutes(10);
        for i in 0..4 {
            h.store.add_import(1, 7, &format!("earlier-{}", i), 10, recent);
        }

        assert!(h
            .orchestrator
            .start_import(TENANT, &request("fifth"), rows())
            .await
            .is_ok());

        let err = h
            .orchestrator
            .start_import(TENANT, &request("sixth"), rows())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RateLimitExceeded(ref m) if m.contains("max 5 imports")));
        assert_eq!(h.store.imports().len(), 5);
    }

    #[tokio::test]
    async fn test_closed_queue_marks_job_failed() {
        let h = harness();
        assert!(h.queue.shutdown(Duration::from_secs(1)).await);

        let err = h
            .orchestrator
            .start_import(TENANT, &request("late"), rows())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));

        let imports = h.store.imports();
        let record = &imports[0];
        assert_eq!(record.status, LeadImportStatus::Failed);
        assert_eq!(record.counters(), ImportCounters::default());
    }
}
