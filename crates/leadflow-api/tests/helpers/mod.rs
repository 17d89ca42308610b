//! Test helpers: build the real router over in-memory stores and scripted collaborators.
//!
//! Run with `cargo test -p leadflow-api`. No database or network is needed.

#![allow(dead_code)]

pub mod auth;
pub mod fixtures;

use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use leadflow_api::setup::{routes, services};
use leadflow_api::state::Stores;
use leadflow_core::config::{
    BaseConfig, IntegrationConfig, LeadflowConfig, PipelineConfig, PERMISSION_CHECK_DISABLED,
};
use leadflow_core::Config;
use leadflow_db::test_helpers::InMemoryStore;
use leadflow_services::test_helpers::{
    InMemoryChatDirectory, RecordingCacheInvalidator, RecordingEventEmitter,
    ScriptedPhoneValidator, StaticPermissions,
};
use leadflow_services::Collaborators;
use leadflow_worker::ImportFinished;
use tokio::sync::mpsc;

pub const TENANT_ID: i64 = 1;
pub const USER_ID: i64 = 10;
pub const ACCOUNT_ID: i64 = 7;
pub const SOURCE_ID: i64 = 3;
pub const MAX_UPLOAD_BYTES: usize = 256 * 1024;

/// Test application: server plus handles on every fake behind it.
pub struct TestApp {
    pub server: TestServer,
    pub store: InMemoryStore,
    pub chats: InMemoryChatDirectory,
    pub phones: ScriptedPhoneValidator,
    pub events: RecordingEventEmitter,
    pub cache: RecordingCacheInvalidator,
    finished: mpsc::Receiver<ImportFinished>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Wait for the next job to finalize
    pub async fn next_finished(&mut self) -> ImportFinished {
        tokio::time::timeout(Duration::from_secs(10), self.finished.recv())
            .await
            .expect("import did not finish in time")
            .expect("finished channel closed")
    }
}

pub fn create_test_config() -> Config {
    Config(Box::new(LeadflowConfig {
        base: BaseConfig {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 1,
            db_timeout_seconds: 1,
            jwt_secret: auth::TEST_JWT_SECRET.to_string(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            environment: "test".to_string(),
            shutdown_grace_secs: 1,
        },
        database_url: "postgres://unused/leadflow".to_string(),
        pipeline: PipelineConfig::default(),
        integrations: IntegrationConfig {
            permission_api_url: PERMISSION_CHECK_DISABLED.to_string(),
            ..IntegrationConfig::default()
        },
    }))
}

/// Setup test app with the catalog every submission needs already seeded
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_permissions(StaticPermissions::Allow).await
}

pub async fn setup_test_app_with_permissions(permissions: StaticPermissions) -> TestApp {
    let store = InMemoryStore::new();
    store.add_source(SOURCE_ID);
    store.add_account(ACCOUNT_ID, TENANT_ID);
    store.add_channel("Import");

    let chats = InMemoryChatDirectory::new();
    let phones = ScriptedPhoneValidator::new();
    let events = RecordingEventEmitter::new();
    let cache = RecordingCacheInvalidator::new();

    let collaborators = Collaborators {
        chat_directory: Arc::new(chats.clone()),
        phone_validator: Arc::new(phones.clone()),
        event_emitter: Arc::new(events.clone()),
        cache_invalidator: Arc::new(cache.clone()),
        permissions: Arc::new(permissions),
    };

    let stores = Stores {
        pool: None,
        jobs: Arc::new(store.clone()),
        leads: Arc::new(store.clone()),
    };

    let config = create_test_config();
    let (tx, finished) = mpsc::channel(16);
    let state = services::initialize_services(&config, stores, collaborators, Some(tx));
    let router = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        store,
        chats,
        phones,
        events,
        cache,
        finished,
    }
}
