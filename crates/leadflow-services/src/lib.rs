//! Leadflow Services
//!
//! Concrete implementations of the collaborator traits declared in `leadflow-core`, and
//! the factory that picks a real adapter or its no-op stand-in from configuration.

pub mod cache;
pub mod chat_directory;
pub mod event_emitter;
pub mod factory;
pub mod permission;
pub mod phone_validator;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use cache::RedisCacheInvalidator;
pub use chat_directory::MongoChatDirectory;
pub use event_emitter::WebhookEventEmitter;
pub use factory::{build_collaborators, http_client, Collaborators};
pub use permission::{
    AllowAllPermissions, HttpPermissionChecker, PermissionChecker, IMPORT_LEADS_MODULE,
    IMPORT_LEADS_PERMISSION,
};
pub use phone_validator::HttpPhoneValidator;
