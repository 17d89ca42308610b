//! Adapter selection from configuration
//!
//! Each integration falls back to its no-op variant when its setting is absent, so a
//! bare development environment can run imports end to end.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use leadflow_core::{
    CacheInvalidator, ChatDirectory, Config, EventEmitter, NoOpCacheInvalidator,
    NoOpChatDirectory, NoOpEventEmitter, NoOpPhoneValidator, PhoneValidator,
};

use crate::{
    AllowAllPermissions, HttpPermissionChecker, HttpPhoneValidator, MongoChatDirectory,
    PermissionChecker, RedisCacheInvalidator, WebhookEventEmitter,
};

/// Shared HTTP client for the oracle and event adapters
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .context("Failed to create HTTP client for integrations")
}

#[derive(Clone)]
pub struct Collaborators {
    pub chat_directory: Arc<dyn ChatDirectory>,
    pub phone_validator: Arc<dyn PhoneValidator>,
    pub event_emitter: Arc<dyn EventEmitter>,
    pub cache_invalidator: Arc<dyn CacheInvalidator>,
    pub permissions: Arc<dyn PermissionChecker>,
}

impl Collaborators {
    /// Every collaborator in its no-op form
    pub fn noop() -> Self {
        Self {
            chat_directory: Arc::new(NoOpChatDirectory),
            phone_validator: Arc::new(NoOpPhoneValidator),
            event_emitter: Arc::new(NoOpEventEmitter),
            cache_invalidator: Arc::new(NoOpCacheInvalidator),
            permissions: Arc::new(AllowAllPermissions),
        }
    }
}

pub async fn build_collaborators(config: &Config) -> Result<Collaborators> {
    let integrations = config.integrations();
    let client = http_client(config.http_client_timeout())?;
    let mut collaborators = Collaborators::noop();

    match integrations.mongodb_uri.as_deref() {
        Some(uri) => {
            let directory =
                MongoChatDirectory::connect(uri, &integrations.mongodb_database).await?;
            collaborators.chat_directory = Arc::new(directory);
            tracing::info!(database = %integrations.mongodb_database, "Chat directory: MongoDB");
        }
        None => tracing::warn!("MONGODB_URI not set, chat directory disabled"),
    }

    match integrations.phone_validator_url.as_deref() {
        Some(url) => {
            collaborators.phone_validator = Arc::new(HttpPhoneValidator::new(client.clone(), url));
            tracing::info!(url = %url, "Phone validator: HTTP");
        }
        None => tracing::warn!("PHONE_VALIDATOR_URL not set, every phone is accepted"),
    }

    match integrations.event_webhook_url.as_deref() {
        Some(url) => {
            collaborators.event_emitter = Arc::new(WebhookEventEmitter::new(client.clone(), url));
            tracing::info!(url = %url, "Event emitter: webhook");
        }
        None => tracing::warn!("EVENT_WEBHOOK_URL not set, import events are dropped"),
    }

    match integrations.redis_url.as_deref() {
        Some(url) => {
            collaborators.cache_invalidator = Arc::new(RedisCacheInvalidator::connect(url).await?);
            tracing::info!("Cache invalidator: Redis");
        }
        None => tracing::warn!("REDIS_URL not set, lead cache invalidation disabled"),
    }

    if config.permission_check_enabled() {
        collaborators.permissions = Arc::new(HttpPermissionChecker::new(
            client,
            integrations.permission_api_url.clone(),
        ));
        tracing::info!(url = %integrations.permission_api_url, "Permission oracle: HTTP");
    } else {
        tracing::warn!("Permission checks disabled");
    }

    Ok(collaborators)
}
