//! Dependencies handed to every import worker
//!
//! Built once at startup and cloned into each job; nothing is looked up from globals.

use std::sync::Arc;

use leadflow_core::config::PipelineConfig;
use leadflow_core::{
    CacheInvalidator, ChatDirectory, EventEmitter, NoOpCacheInvalidator, NoOpChatDirectory,
    NoOpEventEmitter, NoOpPhoneValidator, PhoneValidator,
};
use leadflow_db::{ImportJobStore, LeadStore};

#[derive(Clone)]
pub struct ImportContext {
    pub jobs: Arc<dyn ImportJobStore>,
    pub leads: Arc<dyn LeadStore>,
    pub chat_directory: Arc<dyn ChatDirectory>,
    pub phone_validator: Arc<dyn PhoneValidator>,
    pub event_emitter: Arc<dyn EventEmitter>,
    pub cache_invalidator: Arc<dyn CacheInvalidator>,
    pub pipeline: PipelineConfig,
}

impl ImportContext {
    /// Context over the given stores with every external collaborator disabled
    pub fn new(
        jobs: Arc<dyn ImportJobStore>,
        leads: Arc<dyn LeadStore>,
        pipeline: PipelineConfig,
    ) -> Self {
        Self {
            jobs,
            leads,
            chat_directory: Arc::new(NoOpChatDirectory),
            phone_validator: Arc::new(NoOpPhoneValidator),
            event_emitter: Arc::new(NoOpEventEmitter),
            cache_invalidator: Arc::new(NoOpCacheInvalidator),
            pipeline,
        }
    }

    pub fn with_chat_directory(mut self, chat_directory: Arc<dyn ChatDirectory>) -> Self {
        self.chat_directory = chat_directory;
        self
    }

    pub fn with_phone_validator(mut self, phone_validator: Arc<dyn PhoneValidator>) -> Self {
        self.phone_validator = phone_validator;
        self
    }

    pub fn with_event_emitter(mut self, event_emitter: Arc<dyn EventEmitter>) -> Self {
        self.event_emitter = event_emitter;
        self
    }

    pub fn with_cache_invalidator(mut self, cache_invalidator: Arc<dyn CacheInvalidator>) -> Self {
        self.cache_invalidator = cache_invalidator;
        self
    }
}
