//! Import pipeline
//!
//! Processing is split into stages that return `Result<_, ImportAbort>`. Whatever the
//! stages return, and even if they panic, [`ImportWorker::run`] reaches `finalize` exactly
//! once with the counters accumulated so far.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use serde_json::json;
use tracing::Instrument;

use leadflow_core::models::{
    ImportCounters, LeadChannel, LeadImportStatus, NewChat, NewChatTag, NewLead, ParsedRow,
};
use leadflow_core::AppError;

use crate::context::ImportContext;
use crate::job::{ImportFinished, ImportJob};

/// Event emitted after every finalization
pub const IMPORT_FINISHED_EVENT: &str = "lead:import-finished";

/// Job-level failure; stops processing and marks the job `FAILED`
#[derive(Debug, thiserror::Error)]
pub enum ImportAbort {
    #[error("existing-record lookup failed: {0}")]
    Dedup(String),

    #[error("lead channel '{0}' not found")]
    ChannelMissing(String),

    #[error("lead channel lookup failed: {0}")]
    ChannelLookup(String),
}

/// Per-row failure; counted as an error and the row is skipped
#[derive(Debug, thiserror::Error)]
enum RowFailure {
    #[error("phone rejected by validator")]
    PhoneRejected,

    #[error("phone validator failed: {0}")]
    PhoneValidator(anyhow::Error),

    #[error("chat creation failed: {0}")]
    Chat(anyhow::Error),

    #[error("lead creation failed: {0}")]
    Lead(AppError),
}

/// Counters shared between the processing task and the finalizer
#[derive(Debug, Default)]
struct Progress {
    created: AtomicI64,
    existing: AtomicI64,
    errors: AtomicI64,
}

impl Progress {
    fn created(&self) {
        self.created.fetch_add(1, Ordering::SeqCst);
    }

    fn existing(&self) {
        self.existing.fetch_add(1, Ordering::SeqCst);
    }

    fn error(&self) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> ImportCounters {
        ImportCounters {
            created: self.created.load(Ordering::SeqCst),
            existing: self.existing.load(Ordering::SeqCst),
            errors: self.errors.load(Ordering::SeqCst),
        }
    }
}

/// Tag ids resolved for the rows that will be materialized
#[derive(Debug, Default)]
struct ResolvedTags {
    /// Lowercased tag name to tag id
    by_name: HashMap<String, i64>,
    explicit: Vec<i64>,
}

impl ResolvedTags {
    /// Row tags followed by the explicit request tags, without repeats
    fn ids_for(&self, row: &ParsedRow) -> Vec<i64> {
        let mut seen = HashSet::new();
        row.tags
            .iter()
            .filter_map(|name| self.by_name.get(&name.to_lowercase()).copied())
            .chain(self.explicit.iter().copied())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

#[derive(Clone)]
pub struct ImportWorker {
    ctx: ImportContext,
}

impl ImportWorker {
    pub fn new(ctx: ImportContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ImportContext {
        &self.ctx
    }

    /// Process a job to completion and finalize it
    ///
    /// Never fails: aborts and panics inside processing become a `FAILED` status.
    #[tracing::instrument(skip(self, job), fields(import_id = job.import_id, tenant_id = job.tenant_id, rows = job.rows.len()))]
    pub async fn run(&self, job: ImportJob) -> ImportFinished {
        let import_id = job.import_id;
        let tenant_id = job.tenant_id;
        let progress = Arc::new(Progress::default());

        let worker = self.clone();
        let task_progress = Arc::clone(&progress);
        let handle = tokio::spawn(
            async move { worker.process(&job, &task_progress).await }
                .instrument(tracing::Span::current()),
        );

        let status = match handle.await {
            Ok(Ok(())) => LeadImportStatus::Finished,
            Ok(Err(abort)) => {
                tracing::error!(error = %abort, "Import aborted");
                LeadImportStatus::Failed
            }
            Err(join_error) if join_error.is_panic() => {
                tracing::error!(error = %join_error, "Import processing panicked");
                LeadImportStatus::Failed
            }
            Err(join_error) => {
                tracing::error!(error = %join_error, "Import processing was cancelled");
                LeadImportStatus::Failed
            }
        };

        self.finalize(import_id, tenant_id, status, progress.snapshot())
            .await
    }

    async fn process(&self, job: &ImportJob, progress: &Progress) -> Result<(), ImportAbort> {
        let remaining = self.partition_rows(job, progress).await?;
        if remaining.is_empty() {
            tracing::info!("Every row already exists, nothing to create");
            return Ok(());
        }

        let tags = self.resolve_tags(job, &remaining).await;
        let channel = self.resolve_channel().await?;

        self.materialize(job, &remaining, &channel, &tags, progress)
            .await;
        Ok(())
    }

    /// Split rows into those already known to the platform and those to create
    ///
    /// Known rows, including repeats of a phone earlier in the same file, are counted
    /// as existing.
    async fn partition_rows<'a>(
        &self,
        job: &'a ImportJob,
        progress: &Progress,
    ) -> Result<Vec<&'a ParsedRow>, ImportAbort> {
        let mut unique = HashSet::new();
        let phones: Vec<String> = job
            .rows
            .iter()
            .filter(|row| unique.insert(row.phone.as_str()))
            .map(|row| row.phone.clone())
            .collect();

        let leads = self
            .ctx
            .leads
            .existing_lead_phones(job.tenant_id, job.account_id, &phones)
            .await
            .map_err(|e| ImportAbort::Dedup(format!("leads: {}", e)))?;
        let patients = self
            .ctx
            .leads
            .existing_patient_phones(job.tenant_id, &phones)
            .await
            .map_err(|e| ImportAbort::Dedup(format!("patients: {}", e)))?;
        let chats = self
            .ctx
            .chat_directory
            .find_chats_by_phones(&phones, job.account_id, job.tenant_id)
            .await
            .map_err(|e| ImportAbort::Dedup(format!("chats: {}", e)))?;

        let skip: HashSet<String> = leads
            .into_iter()
            .chain(patients)
            .chain(chats.into_iter().map(|chat| chat.phone))
            .collect();

        let mut seen = HashSet::new();
        let mut remaining = Vec::with_capacity(job.rows.len());
        for row in &job.rows {
            if skip.contains(&row.phone) || !seen.insert(row.phone.as_str()) {
                progress.existing();
            } else {
                remaining.push(row);
            }
        }

        tracing::info!(
            skipped = job.rows.len() - remaining.len(),
            remaining = remaining.len(),
            "Dedup complete"
        );
        Ok(remaining)
    }

    /// Look up or create every tag named by the rows; resolve the explicit request ids
    ///
    /// Lookup-then-create is not atomic across concurrent jobs.
    async fn resolve_tags(&self, job: &ImportJob, rows: &[&ParsedRow]) -> ResolvedTags {
        let mut resolved = ResolvedTags::default();

        let mut seen = HashSet::new();
        let names: Vec<&str> = rows
            .iter()
            .flat_map(|row| row.tags.iter())
            .filter(|name| seen.insert(name.to_lowercase()))
            .map(String::as_str)
            .collect();

        for name in names {
            let tag = match self.ctx.leads.find_tag_by_name(job.tenant_id, name).await {
                Ok(Some(tag)) => Ok(tag),
                Ok(None) => {
                    self.ctx
                        .leads
                        .create_tag(job.tenant_id, job.creator_id, name)
                        .await
                }
                Err(e) => Err(e),
            };

            match tag {
                Ok(tag) => {
                    resolved.by_name.insert(name.to_lowercase(), tag.id);
                }
                Err(e) => {
                    tracing::warn!(tag = %name, error = %e, "Failed to resolve tag, dropping it");
                }
            }
        }

        if !job.tag_ids.is_empty() {
            match self
                .ctx
                .leads
                .resolve_tag_ids(job.tenant_id, &job.tag_ids)
                .await
            {
                Ok(ids) => resolved.explicit = ids,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to resolve request tag ids, continuing without them");
                }
            }
        }

        resolved
    }

    async fn resolve_channel(&self) -> Result<LeadChannel, ImportAbort> {
        let name = &self.ctx.pipeline.channel_name;
        match self.ctx.leads.find_channel_by_name(name).await {
            Ok(Some(channel)) => Ok(channel),
            Ok(None) => Err(ImportAbort::ChannelMissing(name.clone())),
            Err(e) => Err(ImportAbort::ChannelLookup(e.to_string())),
        }
    }

    async fn materialize(
        &self,
        job: &ImportJob,
        rows: &[&ParsedRow],
        channel: &LeadChannel,
        tags: &ResolvedTags,
        progress: &Progress,
    ) {
        let chunk_size = self.ctx.pipeline.chunk_size.max(1);

        for (index, chunk) in rows.chunks(chunk_size).enumerate() {
            tracing::debug!(chunk = index, rows = chunk.len(), "Processing chunk");

            for row in chunk {
                match self.materialize_row(job, row, channel, tags).await {
                    Ok(lead_id) => {
                        tracing::debug!(lead_id = lead_id, "Lead created");
                        progress.created();
                    }
                    Err(failure) => {
                        tracing::warn!(phone = %row.phone, error = %failure, "Row skipped");
                        progress.error();
                    }
                }
            }
        }
    }

    async fn materialize_row(
        &self,
        job: &ImportJob,
        row: &ParsedRow,
        channel: &LeadChannel,
        tags: &ResolvedTags,
    ) -> Result<i64, RowFailure> {
        let reachable = self
            .ctx
            .phone_validator
            .validate_phone(&row.phone, job.account_id)
            .await
            .map_err(RowFailure::PhoneValidator)?;
        if !reachable {
            return Err(RowFailure::PhoneRejected);
        }

        let chat_id = self
            .ctx
            .chat_directory
            .create_chat(&NewChat {
                phone: row.phone.clone(),
                dial_code: row.dial_code.clone(),
                region_code: row.region_code.clone(),
                account_id: job.account_id,
                tenant_id: job.tenant_id,
            })
            .await
            .map_err(RowFailure::Chat)?;

        // A failure past this point leaves the chat without a lead.
        let lead = self
            .ctx
            .leads
            .create_lead(&NewLead {
                name: Some(row.name.clone()),
                email: row.email.clone(),
                cpf: row.cpf.clone(),
                contact_cellphone: row.phone.clone(),
                dial_code: row.dial_code.clone(),
                region_code: row.region_code.clone(),
                source_id: job.source_id,
                channel_id: channel.id,
                chat_id: Some(chat_id.clone()),
                import_id: job.import_id,
                tenant_id: job.tenant_id,
                account_id: job.account_id,
                creator_id: job.creator_id,
            })
            .await
            .map_err(RowFailure::Lead)?;

        if let Err(e) = self.ctx.chat_directory.link_lead(&chat_id, lead.id).await {
            tracing::warn!(chat_id = %chat_id, lead_id = lead.id, error = %e, "Failed to link chat to lead");
        }

        for tag_id in tags.ids_for(row) {
            let link = NewChatTag {
                chat_id: chat_id.clone(),
                tag_id,
                lead_id: lead.id,
                tenant_id: job.tenant_id,
                creator_id: job.creator_id,
            };
            if let Err(e) = self.ctx.leads.create_chat_tag(&link).await {
                tracing::warn!(lead_id = lead.id, tag_id = tag_id, error = %e, "Failed to tag chat");
            }
        }

        Ok(lead.id)
    }

    /// Persist the terminal state, drop cached leads and announce completion
    async fn finalize(
        &self,
        import_id: i64,
        tenant_id: i64,
        status: LeadImportStatus,
        counters: ImportCounters,
    ) -> ImportFinished {
        match self
            .ctx
            .jobs
            .finalize_import(import_id, status, counters)
            .await
        {
            Ok(true) => tracing::info!(
                status = %status,
                created = counters.created,
                existing = counters.existing,
                errors = counters.errors,
                "Import finalized"
            ),
            Ok(false) => tracing::warn!(status = %status, "Import was not in PROCESSING state"),
            Err(e) => tracing::error!(error = %e, status = %status, "Failed to persist import outcome"),
        }

        if let Err(e) = self.ctx.cache_invalidator.invalidate_leads(tenant_id).await {
            tracing::warn!(error = %e, "Failed to invalidate lead cache");
        }

        let payload = json!({ "import_id": import_id, "company_id": tenant_id });
        if let Err(e) = self.ctx.event_emitter.emit(IMPORT_FINISHED_EVENT, payload).await {
            tracing::warn!(error = %e, "Failed to emit import finished event");
        }

        ImportFinished {
            import_id,
            tenant_id,
            status,
            counters,
        }
    }
}
