//! Scriptable fakes for the collaborator traits
//!
//! Each fake records what the pipeline asked of it and can be told to fail.

mod fakes;

pub use fakes::{
    InMemoryChatDirectory, RecordingCacheInvalidator, RecordingEventEmitter,
    ScriptedPhoneValidator, StaticPermissions,
};
