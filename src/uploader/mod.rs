//! The uploader core.
//!
//! - **Machine**: [`UploaderMachine`], the pure event → effects transition function
//! - **Shell**: [`Uploader`], executes effects against a preview backend, a transport and host hooks
//! - **Hooks**: [`UploaderHooks`], the host callback surface

pub mod hooks;
pub mod machine;
pub mod shell;

pub use hooks::{NoHooks, Notification, UploaderHooks};
pub use machine::{CropTarget, Effect, Event, Phase, UploadBatch, UploaderMachine};
pub use shell::Uploader;
