//! Import queue: one tracked task per accepted job
//!
//! Submission never waits for processing. Completion is observable through the job
//! record, or through the optional [`ImportFinishedSender`] for in-process listeners.
//!
//! Shutdown: [`ImportQueue::shutdown`] stops accepting jobs and waits, up to a grace
//! period, for running jobs to finalize.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;

use crate::job::{ImportFinished, ImportJob};
use crate::pipeline::ImportWorker;

/// Optional sender notified each time a job is finalized
pub type ImportFinishedSender = mpsc::Sender<ImportFinished>;

/// Returned by [`ImportQueue::submit`] once shutdown has begun; hands the job back
#[derive(Debug, thiserror::Error)]
#[error("import queue is shutting down")]
pub struct QueueClosed(pub ImportJob);

#[derive(Clone)]
pub struct ImportQueue {
    worker: ImportWorker,
    tracker: TaskTracker,
    finished_tx: Option<ImportFinishedSender>,
}

impl ImportQueue {
    pub fn new(worker: ImportWorker) -> Self {
        Self {
            worker,
            tracker: TaskTracker::new(),
            finished_tx: None,
        }
    }

    pub fn new_with_finished(worker: ImportWorker, finished_tx: ImportFinishedSender) -> Self {
        Self {
            worker,
            tracker: TaskTracker::new(),
            finished_tx: Some(finished_tx),
        }
    }

    /// Spawn processing for `job` and return immediately
    #[tracing::instrument(skip(self, job), fields(import_id = job.import_id, rows = job.rows.len()))]
    pub fn submit(&self, job: ImportJob) -> Result<(), QueueClosed> {
        if self.tracker.is_closed() {
            tracing::warn!("Import rejected, queue is shutting down");
            return Err(QueueClosed(job));
        }

        let worker = self.worker.clone();
        let finished_tx = self.finished_tx.clone();

        self.tracker.spawn(async move {
            let finished = worker.run(job).await;
            if let Some(tx) = finished_tx {
                let _ = tx.send(finished).await;
            }
        });

        tracing::info!(in_flight = self.tracker.len(), "Import submitted to queue");
        Ok(())
    }

    /// Number of jobs still running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting jobs and wait up to `grace` for running ones
    ///
    /// Returns false if jobs were still running when the grace period ran out. Those
    /// remain `PROCESSING` in the store.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        tracing::info!(in_flight = self.tracker.len(), "Initiating import queue shutdown");
        self.tracker.close();

        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                tracing::info!("Import queue drained");
                true
            }
            Err(_) => {
                tracing::warn!(
                    in_flight = self.tracker.len(),
                    grace_secs = grace.as_secs(),
                    "Import queue shutdown timed out"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use leadflow_core::config::PipelineConfig;
    use leadflow_core::models::{LeadImportStatus, NewLeadImport, ParsedRow};
    use leadflow_db::test_helpers::InMemoryStore;
    use leadflow_db::ImportJobStore;

    use crate::context::ImportContext;

    fn worker(store: &InMemoryStore) -> ImportWorker {
        ImportWorker::new(ImportContext::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            PipelineConfig::default(),
        ))
    }

    async fn accepted_job(store: &InMemoryStore, name: &str) -> ImportJob {
        let record = store
            .create_import(&NewLeadImport {
                name: name.to_string(),
                creator_id: 1,
                tenant_id: 1,
                source_id: 1,
                account_id: 1,
            })
            .await
            .unwrap();
        ImportJob {
            import_id: record.id,
            tenant_id: 1,
            account_id: 1,
            source_id: 1,
            creator_id: 1,
            tag_ids: vec![],
            rows: vec![ParsedRow {
                name: "Ana".to_string(),
                phone: "11987654321".to_string(),
                dial_code: "55".to_string(),
                region_code: "BR".to_string(),
                cpf: None,
                email: None,
                tags: vec![],
            }],
        }
    }

    #[tokio::test]
    async fn test_submitted_job_reports_completion() {
        let store = InMemoryStore::new();
        store.add_channel("import");
        let (tx, mut rx) = mpsc::channel(4);
        let queue = ImportQueue::new_with_finished(worker(&store), tx);

        let job = accepted_job(&store, "queued").await;
        let import_id = job.import_id;
        queue.submit(job).unwrap();

        let finished = rx.recv().await.unwrap();
        assert_eq!(finished.import_id, import_id);
        assert_eq!(finished.status, LeadImportStatus::Finished);
        assert_eq!(finished.counters.created, 1);
        assert_eq!(
            store.import(import_id).unwrap().status,
            LeadImportStatus::Finished
        );
    }

    #[tokio::test]
    async fn test_shutdown_drains_and_rejects_new_jobs() {
        let store = InMemoryStore::new();
        store.add_channel("import");
        let queue = ImportQueue::new(worker(&store));

        let first = accepted_job(&store, "first").await;
        let first_id = first.import_id;
        queue.submit(first).unwrap();

        assert!(queue.shutdown(Duration::from_secs(5)).await);
        assert_eq!(queue.in_flight(), 0);
        assert_eq!(
            store.import(first_id).unwrap().status,
            LeadImportStatus::Finished
        );

        let late = accepted_job(&store, "late").await;
        let rejected = queue.submit(late).unwrap_err();
        assert_eq!(rejected.0.rows.len(), 1);
    }
}
