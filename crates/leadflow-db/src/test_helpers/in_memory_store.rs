//! In-memory store used in place of Postgres in tests

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadflow_core::{
    models::{
        ChatTag, ImportCounters, ImportWindowUsage, Lead, LeadChannel, LeadImport,
        LeadImportStatus, NewChatTag, NewLead, NewLeadImport, Tag,
    },
    AppError,
};

use crate::store::{ImportJobStore, LeadStore};

#[derive(Default)]
struct State {
    next_id: i64,
    sources: Vec<(i64, bool)>,
    accounts: Vec<(i64, i64)>,
    channels: Vec<LeadChannel>,
    imports: Vec<LeadImport>,
    leads: Vec<Lead>,
    patients: Vec<(i64, String)>,
    tags: Vec<Tag>,
    chat_tags: Vec<ChatTag>,
    finalize_calls: usize,
    failing_lead_phones: HashSet<String>,
    failing_tag_names: HashSet<String>,
    panicking_lead_phones: HashSet<String>,
    fail_lead_dedup: bool,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared-state fake; clones observe the same data
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

fn injected(what: &str) -> AppError {
    AppError::Internal(format!("injected failure: {}", what))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&self, source_id: i64) {
        self.state.lock().unwrap().sources.push((source_id, false));
    }

    pub fn add_deleted_source(&self, source_id: i64) {
        self.state.lock().unwrap().sources.push((source_id, true));
    }

    pub fn add_account(&self, account_id: i64, tenant_id: i64) {
        self.state
            .lock()
            .unwrap()
            .accounts
            .push((account_id, tenant_id));
    }

    pub fn add_channel(&self, name: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        state.channels.push(LeadChannel {
            id,
            name: name.to_string(),
            is_deleted: false,
        });
        id
    }

    pub fn add_patient_phone(&self, tenant_id: i64, phone: &str) {
        self.state
            .lock()
            .unwrap()
            .patients
            .push((tenant_id, phone.to_string()));
    }

    /// Seed a live lead holding `phone`, outside of any import
    pub fn add_lead_phone(&self, tenant_id: i64, account_id: i64, phone: &str) {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let now = Utc::now();
        state.leads.push(Lead {
            id,
            name: None,
            email: None,
            cpf: None,
            contact_cellphone: phone.to_string(),
            dial_code: "55".to_string(),
            region_code: "BR".to_string(),
            source_id: 0,
            channel_id: 0,
            chat_id: None,
            import_id: 0,
            tenant_id,
            account_id,
            creator_id: 0,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        });
    }

    pub fn add_tag(&self, tenant_id: i64, name: &str) -> Tag {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let now = Utc::now();
        let tag = Tag {
            id,
            name: name.to_string(),
            tenant_id,
            creator_id: 0,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        state.tags.push(tag.clone());
        tag
    }

    pub fn delete_tag(&self, tag_id: i64) {
        let mut state = self.state.lock().unwrap();
        if let Some(tag) = state.tags.iter_mut().find(|t| t.id == tag_id) {
            tag.is_deleted = true;
        }
    }

    /// Seed a prior job, e.g. to fill a rate-limit window
    pub fn add_import(
        &self,
        tenant_id: i64,
        account_id: i64,
        name: &str,
        total_created: i64,
        created_at: DateTime<Utc>,
    ) -> LeadImport {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let job = LeadImport {
            id,
            name: name.to_string(),
            status: LeadImportStatus::Finished,
            total_created,
            total_existing: 0,
            total_errors: 0,
            is_deleted: false,
            creator_id: 0,
            tenant_id,
            source_id: 0,
            account_id,
            created_at,
            updated_at: created_at,
        };
        state.imports.push(job.clone());
        job
    }

    pub fn soft_delete_import(&self, id: i64) {
        let mut state = self.state.lock().unwrap();
        if let Some(job) = state.imports.iter_mut().find(|j| j.id == id) {
            job.is_deleted = true;
        }
    }

    pub fn fail_lead_creation_for(&self, phone: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_lead_phones
            .insert(phone.to_string());
    }

    /// Make lead insertion for `phone` panic, simulating a fault inside the worker
    pub fn panic_on_lead_creation_for(&self, phone: &str) {
        self.state
            .lock()
            .unwrap()
            .panicking_lead_phones
            .insert(phone.to_string());
    }

    pub fn fail_tag_creation_for(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_tag_names
            .insert(name.to_lowercase());
    }

    pub fn fail_lead_dedup(&self) {
        self.state.lock().unwrap().fail_lead_dedup = true;
    }

    pub fn import(&self, id: i64) -> Option<LeadImport> {
        self.state
            .lock()
            .unwrap()
            .imports
            .iter()
            .find(|j| j.id == id)
            .cloned()
    }

    pub fn imports(&self) -> Vec<LeadImport> {
        self.state.lock().unwrap().imports.clone()
    }

    pub fn leads_for_import(&self, import_id: i64) -> Vec<Lead> {
        self.state
            .lock()
            .unwrap()
            .leads
            .iter()
            .filter(|l| l.import_id == import_id)
            .cloned()
            .collect()
    }

    pub fn tags(&self, tenant_id: i64) -> Vec<Tag> {
        self.state
            .lock()
            .unwrap()
            .tags
            .iter()
            .filter(|t| t.tenant_id == tenant_id)
            .cloned()
            .collect()
    }

    pub fn chat_tags_for_lead(&self, lead_id: i64) -> Vec<ChatTag> {
        self.state
            .lock()
            .unwrap()
            .chat_tags
            .iter()
            .filter(|c| c.lead_id == lead_id)
            .cloned()
            .collect()
    }

    pub fn finalize_calls(&self) -> usize {
        self.state.lock().unwrap().finalize_calls
    }

    fn live_tag_ids(&self, tenant_id: i64, tag_ids: &[i64]) -> Vec<i64> {
        self.state
            .lock()
            .unwrap()
            .tags
            .iter()
            .filter(|t| t.tenant_id == tenant_id && !t.is_deleted && tag_ids.contains(&t.id))
            .map(|t| t.id)
            .collect()
    }
}

#[async_trait]
impl ImportJobStore for InMemoryStore {
    async fn source_exists(&self, source_id: i64) -> Result<bool, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .sources
            .iter()
            .any(|(id, deleted)| *id == source_id && !deleted))
    }

    async fn account_owned_by(&self, account_id: i64, tenant_id: i64) -> Result<bool, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .accounts
            .iter()
            .any(|(id, tenant)| *id == account_id && *tenant == tenant_id))
    }

    async fn import_name_taken(
        &self,
        tenant_id: i64,
        account_id: i64,
        name: &str,
    ) -> Result<bool, AppError> {
        Ok(self.state.lock().unwrap().imports.iter().any(|j| {
            j.tenant_id == tenant_id && j.account_id == account_id && j.name == name && !j.is_deleted
        }))
    }

    async fn active_tag_ids(&self, tenant_id: i64, tag_ids: &[i64]) -> Result<Vec<i64>, AppError> {
        Ok(self.live_tag_ids(tenant_id, tag_ids))
    }

    async fn import_window_usage(
        &self,
        tenant_id: i64,
        account_id: i64,
        since: DateTime<Utc>,
    ) -> Result<ImportWindowUsage, AppError> {
        let state = self.state.lock().unwrap();
        let window = state.imports.iter().filter(|j| {
            j.tenant_id == tenant_id
                && j.account_id == account_id
                && j.created_at > since
                && !j.is_deleted
        });
        let mut usage = ImportWindowUsage::default();
        for job in window {
            usage.jobs += 1;
            usage.leads_created += job.total_created;
        }
        Ok(usage)
    }

    async fn create_import(&self, job: &NewLeadImport) -> Result<LeadImport, AppError> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let now = Utc::now();
        let created = LeadImport {
            id,
            name: job.name.clone(),
            status: LeadImportStatus::Processing,
            total_created: 0,
            total_existing: 0,
            total_errors: 0,
            is_deleted: false,
            creator_id: job.creator_id,
            tenant_id: job.tenant_id,
            source_id: job.source_id,
            account_id: job.account_id,
            created_at: now,
            updated_at: now,
        };
        state.imports.push(created.clone());
        Ok(created)
    }

    async fn get_import(&self, tenant_id: i64, id: i64) -> Result<Option<LeadImport>, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .imports
            .iter()
            .find(|j| j.id == id && j.tenant_id == tenant_id && !j.is_deleted)
            .cloned())
    }

    async fn list_imports(
        &self,
        tenant_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LeadImport>, AppError> {
        let mut jobs: Vec<LeadImport> = self
            .state
            .lock()
            .unwrap()
            .imports
            .iter()
            .filter(|j| j.tenant_id == tenant_id && !j.is_deleted)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(jobs
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn finalize_import(
        &self,
        id: i64,
        status: LeadImportStatus,
        counters: ImportCounters,
    ) -> Result<bool, AppError> {
        let mut state = self.state.lock().unwrap();
        state.finalize_calls += 1;
        match state
            .imports
            .iter_mut()
            .find(|j| j.id == id && j.status == LeadImportStatus::Processing)
        {
            Some(job) => {
                job.status = status;
                job.total_created = counters.created;
                job.total_existing = counters.existing;
                job.total_errors = counters.errors;
                job.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl LeadStore for InMemoryStore {
    async fn existing_lead_phones(
        &self,
        tenant_id: i64,
        account_id: i64,
        phones: &[String],
    ) -> Result<Vec<String>, AppError> {
        let state = self.state.lock().unwrap();
        if state.fail_lead_dedup {
            return Err(injected("lead dedup query"));
        }
        Ok(state
            .leads
            .iter()
            .filter(|l| {
                l.tenant_id == tenant_id
                    && l.account_id == account_id
                    && !l.is_deleted
                    && phones.contains(&l.contact_cellphone)
            })
            .map(|l| l.contact_cellphone.clone())
            .collect())
    }

    async fn existing_patient_phones(
        &self,
        tenant_id: i64,
        phones: &[String],
    ) -> Result<Vec<String>, AppError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .patients
            .iter()
            .filter(|(tenant, phone)| *tenant == tenant_id && phones.contains(phone))
            .map(|(_, phone)| phone.clone())
            .collect())
    }

    async fn find_tag_by_name(&self, tenant_id: i64, name: &str) -> Result<Option<Tag>, AppError> {
        let needle = name.to_lowercase();
        Ok(self
            .state
            .lock()
            .unwrap()
            .tags
            .iter()
            .find(|t| t.tenant_id == tenant_id && !t.is_deleted && t.name.to_lowercase() == needle)
            .cloned())
    }

    async fn create_tag(&self, tenant_id: i64, creator_id: i64, name: &str) -> Result<Tag, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_tag_names.contains(&name.to_lowercase()) {
            return Err(injected("tag insert"));
        }
        let id = state.next_id();
        let now = Utc::now();
        let tag = Tag {
            id,
            name: name.to_string(),
            tenant_id,
            creator_id,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        state.tags.push(tag.clone());
        Ok(tag)
    }

    async fn resolve_tag_ids(&self, tenant_id: i64, tag_ids: &[i64]) -> Result<Vec<i64>, AppError> {
        Ok(self.live_tag_ids(tenant_id, tag_ids))
    }

    async fn find_channel_by_name(&self, name: &str) -> Result<Option<LeadChannel>, AppError> {
        let needle = name.to_lowercase();
        Ok(self
            .state
            .lock()
            .unwrap()
            .channels
            .iter()
            .find(|c| !c.is_deleted && c.name.to_lowercase() == needle)
            .cloned())
    }

    async fn create_lead(&self, lead: &NewLead) -> Result<Lead, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.panicking_lead_phones.contains(&lead.contact_cellphone) {
            // Release the lock first so the panic does not poison shared state
            drop(state);
            panic!("injected panic: lead insert");
        }
        if state.failing_lead_phones.contains(&lead.contact_cellphone) {
            return Err(injected("lead insert"));
        }
        let id = state.next_id();
        let now = Utc::now();
        let created = Lead {
            id,
            name: lead.name.clone(),
            email: lead.email.clone(),
            cpf: lead.cpf.clone(),
            contact_cellphone: lead.contact_cellphone.clone(),
            dial_code: lead.dial_code.clone(),
            region_code: lead.region_code.clone(),
            source_id: lead.source_id,
            channel_id: lead.channel_id,
            chat_id: lead.chat_id.clone(),
            import_id: lead.import_id,
            tenant_id: lead.tenant_id,
            account_id: lead.account_id,
            creator_id: lead.creator_id,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        state.leads.push(created.clone());
        Ok(created)
    }

    async fn create_chat_tag(&self, link: &NewChatTag) -> Result<ChatTag, AppError> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let created = ChatTag {
            id,
            chat_id: link.chat_id.clone(),
            tag_id: link.tag_id,
            lead_id: link.lead_id,
            tenant_id: link.tenant_id,
            creator_id: link.creator_id,
            is_deleted: false,
            created_at: Utc::now(),
        };
        state.chat_tags.push(created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_window_usage_ignores_old_and_deleted_jobs() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        store.add_import(1, 10, "recent", 100, now - Duration::minutes(10));
        store.add_import(1, 10, "old", 900, now - Duration::hours(2));
        let deleted = store.add_import(1, 10, "deleted", 50, now - Duration::minutes(5));
        store.soft_delete_import(deleted.id);
        store.add_import(1, 11, "other account", 70, now - Duration::minutes(5));

        let usage = store
            .import_window_usage(1, 10, now - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(usage.jobs, 1);
        assert_eq!(usage.leads_created, 100);
    }

    #[tokio::test]
    async fn test_finalize_only_once() {
        let store = InMemoryStore::new();
        let job = store
            .create_import(&NewLeadImport {
                name: "x".to_string(),
                creator_id: 1,
                tenant_id: 1,
                source_id: 1,
                account_id: 1,
            })
            .await
            .unwrap();

        let counters = ImportCounters {
            created: 2,
            existing: 1,
            errors: 0,
        };
        assert!(store
            .finalize_import(job.id, LeadImportStatus::Finished, counters)
            .await
            .unwrap());
        assert!(!store
            .finalize_import(job.id, LeadImportStatus::Failed, ImportCounters::default())
            .await
            .unwrap());

        let stored = store.import(job.id).unwrap();
        assert_eq!(stored.status, LeadImportStatus::Finished);
        assert_eq!(stored.counters(), counters);
    }

    #[tokio::test]
    async fn test_tag_lookup_is_case_insensitive() {
        let store = InMemoryStore::new();
        let vip = store.add_tag(1, "VIP");
        let found = store.find_tag_by_name(1, "vip").await.unwrap().unwrap();
        assert_eq!(found.id, vip.id);
        assert!(store.find_tag_by_name(2, "vip").await.unwrap().is_none());
    }
}
