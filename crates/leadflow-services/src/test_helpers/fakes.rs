use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use leadflow_core::models::{Chat, NewChat};
use leadflow_core::{AppError, CacheInvalidator, ChatDirectory, EventEmitter, PhoneValidator};

use crate::PermissionChecker;

#[derive(Default)]
struct ChatState {
    next_id: u64,
    chats: Vec<Chat>,
    fail_lookup: bool,
    failing_create_phones: HashSet<String>,
}

/// Chat directory held in memory; ids are 24-char hex like ObjectIds
#[derive(Clone, Default)]
pub struct InMemoryChatDirectory {
    state: Arc<Mutex<ChatState>>,
}

impl InMemoryChatDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(state: &mut ChatState) -> String {
        state.next_id += 1;
        format!("{:024x}", state.next_id)
    }

    /// Seed an existing chat and return its id
    pub fn add_chat(&self, phone: &str, account_id: i64, tenant_id: i64) -> String {
        let mut state = self.state.lock().unwrap();
        let id = Self::allocate_id(&mut state);
        state.chats.push(Chat {
            id: id.clone(),
            phone: phone.to_string(),
            account_id,
            tenant_id,
            lead_id: None,
        });
        id
    }

    pub fn fail_lookups(&self) {
        self.state.lock().unwrap().fail_lookup = true;
    }

    pub fn fail_creation_for(&self, phone: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_create_phones
            .insert(phone.to_string());
    }

    pub fn chats(&self) -> Vec<Chat> {
        self.state.lock().unwrap().chats.clone()
    }

    pub fn chat_for_phone(&self, phone: &str) -> Option<Chat> {
        self.state
            .lock()
            .unwrap()
            .chats
            .iter()
            .find(|c| c.phone == phone)
            .cloned()
    }
}

#[async_trait]
impl ChatDirectory for InMemoryChatDirectory {
    async fn find_chats_by_phones(
        &self,
        phones: &[String],
        account_id: i64,
        tenant_id: i64,
    ) -> Result<Vec<Chat>> {
        let state = self.state.lock().unwrap();
        if state.fail_lookup {
            return Err(anyhow!("injected failure: chat lookup"));
        }
        Ok(state
            .chats
            .iter()
            .filter(|c| {
                c.account_id == account_id && c.tenant_id == tenant_id && phones.contains(&c.phone)
            })
            .cloned()
            .collect())
    }

    async fn create_chat(&self, chat: &NewChat) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.failing_create_phones.contains(&chat.phone) {
            return Err(anyhow!("injected failure: chat creation for {}", chat.phone));
        }
        let id = Self::allocate_id(&mut state);
        state.chats.push(Chat {
            id: id.clone(),
            phone: chat.phone.clone(),
            account_id: chat.account_id,
            tenant_id: chat.tenant_id,
            lead_id: None,
        });
        Ok(id)
    }

    async fn link_lead(&self, chat_id: &str, lead_id: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let chat = state
            .chats
            .iter_mut()
            .find(|c| c.id == chat_id)
            .ok_or_else(|| anyhow!("chat {} not found", chat_id))?;
        chat.lead_id = Some(lead_id);
        Ok(())
    }
}

#[derive(Default)]
struct PhoneState {
    rejected: HashSet<String>,
    erroring: HashSet<String>,
    calls: Vec<(String, i64)>,
}

/// Accepts every phone except those it was told to reject or fail on
#[derive(Clone, Default)]
pub struct ScriptedPhoneValidator {
    state: Arc<Mutex<PhoneState>>,
}

impl ScriptedPhoneValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(&self, phone: &str) {
        self.state.lock().unwrap().rejected.insert(phone.to_string());
    }

    pub fn error_on(&self, phone: &str) {
        self.state.lock().unwrap().erroring.insert(phone.to_string());
    }

    pub fn calls(&self) -> Vec<(String, i64)> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl PhoneValidator for ScriptedPhoneValidator {
    async fn validate_phone(&self, phone: &str, account_id: i64) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((phone.to_string(), account_id));
        if state.erroring.contains(phone) {
            return Err(anyhow!("injected failure: phone oracle"));
        }
        Ok(!state.rejected.contains(phone))
    }
}

/// Records every emitted event
#[derive(Clone, Default)]
pub struct RecordingEventEmitter {
    events: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    fail: Arc<Mutex<bool>>,
}

impl RecordingEventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deliveries(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn events(&self) -> Vec<(String, serde_json::Value)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventEmitter for RecordingEventEmitter {
    async fn emit(&self, event: &str, payload: serde_json::Value) -> Result<()> {
        self.events
            .lock()
            .unwrap()
            .push((event.to_string(), payload));
        if *self.fail.lock().unwrap() {
            return Err(anyhow!("injected failure: event delivery"));
        }
        Ok(())
    }
}

/// Records the tenants whose lead cache was dropped
#[derive(Clone, Default)]
pub struct RecordingCacheInvalidator {
    tenants: Arc<Mutex<Vec<i64>>>,
}

impl RecordingCacheInvalidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidated(&self) -> Vec<i64> {
        self.tenants.lock().unwrap().clone()
    }
}

#[async_trait]
impl CacheInvalidator for RecordingCacheInvalidator {
    async fn invalidate_leads(&self, tenant_id: i64) -> Result<()> {
        self.tenants.lock().unwrap().push(tenant_id);
        Ok(())
    }
}

/// Fixed answer for every permission check
#[derive(Clone)]
pub enum StaticPermissions {
    Allow,
    Deny,
    Unavailable,
}

#[async_trait]
impl PermissionChecker for StaticPermissions {
    async fn can_import_leads(&self, _bearer: &str, _tenant_id: i64) -> Result<bool, AppError> {
        match self {
            StaticPermissions::Allow => Ok(true),
            StaticPermissions::Deny => Ok(false),
            StaticPermissions::Unavailable => Err(AppError::ExternalService(
                "permission oracle unavailable".to_string(),
            )),
        }
    }
}
