//! Wiring of stores, collaborators, worker queue and orchestrator into `AppState`

use std::sync::Arc;

use leadflow_core::Config;
use leadflow_infra::ImportRateLimiter;
use leadflow_processing::FileParser;
use leadflow_services::Collaborators;
use leadflow_worker::{ImportContext, ImportFinishedSender, ImportQueue, ImportWorker};

use crate::services::ImportOrchestrator;
use crate::state::{AppState, Stores, UploadConfig};

/// Build the application state
///
/// `finished_tx`, when given, receives one `ImportFinished` per completed job.
pub fn initialize_services(
    config: &Config,
    stores: Stores,
    collaborators: Collaborators,
    finished_tx: Option<ImportFinishedSender>,
) -> Arc<AppState> {
    let context = ImportContext::new(
        stores.jobs.clone(),
        stores.leads.clone(),
        config.pipeline().clone(),
    )
    .with_chat_directory(collaborators.chat_directory)
    .with_phone_validator(collaborators.phone_validator)
    .with_event_emitter(collaborators.event_emitter)
    .with_cache_invalidator(collaborators.cache_invalidator);

    let worker = ImportWorker::new(context);
    let queue = match finished_tx {
        Some(tx) => ImportQueue::new_with_finished(worker, tx),
        None => ImportQueue::new(worker),
    };

    let rate_limiter = ImportRateLimiter::new(config.import_limits());
    let orchestrator = ImportOrchestrator::new(stores.jobs.clone(), rate_limiter, queue.clone());

    tracing::info!(
        chunk_size = config.pipeline().chunk_size,
        channel = %config.pipeline().channel_name,
        max_jobs_per_window = config.import_limits().max_jobs_per_window,
        max_leads_per_window = config.import_limits().max_leads_per_window,
        "Import services initialized"
    );

    Arc::new(AppState {
        db_pool: stores.pool,
        jobs: stores.jobs,
        orchestrator,
        queue,
        permissions: collaborators.permissions,
        upload: UploadConfig {
            max_upload_bytes: config.max_upload_bytes(),
            file_parser: FileParser::new(),
        },
    })
}
