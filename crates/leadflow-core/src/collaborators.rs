//! External collaborators of the import pipeline
//!
//! The worker only talks to the outside world through these traits. Concrete adapters
//! (document store, HTTP oracles, Redis) live in `leadflow-services`; the no-op variants
//! below are selected when an integration is not configured.

use async_trait::async_trait;

use crate::models::{Chat, NewChat};

/// Identifier returned by [`NoOpChatDirectory::create_chat`]
pub const NOOP_CHAT_ID: &str = "000000000000000000000000";

/// Chat threads owned by the messaging document store
#[async_trait]
pub trait ChatDirectory: Send + Sync {
    /// Chats whose contact phone is in `phones`, scoped to account and tenant
    async fn find_chats_by_phones(
        &self,
        phones: &[String],
        account_id: i64,
        tenant_id: i64,
    ) -> anyhow::Result<Vec<Chat>>;

    /// Create a chat and return its identifier
    async fn create_chat(&self, chat: &NewChat) -> anyhow::Result<String>;

    /// Point an existing chat at the lead materialized for it
    async fn link_lead(&self, chat_id: &str, lead_id: i64) -> anyhow::Result<()>;
}

/// Oracle answering whether a phone can receive messages from an account
#[async_trait]
pub trait PhoneValidator: Send + Sync {
    async fn validate_phone(&self, phone: &str, account_id: i64) -> anyhow::Result<bool>;
}

/// Fire-and-forget notification sink
#[async_trait]
pub trait EventEmitter: Send + Sync {
    async fn emit(&self, event: &str, payload: serde_json::Value) -> anyhow::Result<()>;
}

/// Drops cached lead listings after an import changes them
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate_leads(&self, tenant_id: i64) -> anyhow::Result<()>;
}

/// Chat directory that knows no chats and hands out a fixed id
pub struct NoOpChatDirectory;

#[async_trait]
impl ChatDirectory for NoOpChatDirectory {
    async fn find_chats_by_phones(
        &self,
        _phones: &[String],
        _account_id: i64,
        _tenant_id: i64,
    ) -> anyhow::Result<Vec<Chat>> {
        Ok(Vec::new())
    }

    async fn create_chat(&self, _chat: &NewChat) -> anyhow::Result<String> {
        Ok(NOOP_CHAT_ID.to_string())
    }

    async fn link_lead(&self, _chat_id: &str, _lead_id: i64) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Accepts every phone
pub struct NoOpPhoneValidator;

#[async_trait]
impl PhoneValidator for NoOpPhoneValidator {
    async fn validate_phone(&self, _phone: &str, _account_id: i64) -> anyhow::Result<bool> {
        Ok(true)
    }
}

pub struct NoOpEventEmitter;

#[async_trait]
impl EventEmitter for NoOpEventEmitter {
    async fn emit(&self, _event: &str, _payload: serde_json::Value) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct NoOpCacheInvalidator;

#[async_trait]
impl CacheInvalidator for NoOpCacheInvalidator {
    async fn invalidate_leads(&self, _tenant_id: i64) -> anyhow::Result<()> {
        Ok(())
    }
}
