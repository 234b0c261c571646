//! # Image Uploader
//!
//! The headless core of an image-upload widget: file intake, client-side
//! validation, optional cropping and optional multipart upload. A visual
//! layer binds to it by feeding events in and rendering what comes out.
//!
//! # Architecture: Machine and Shell
//!
//! Every behaviour that involves more than one component goes through a
//! single state machine. Its transition function is pure; side effects are
//! returned as data and carried out by a shell:
//!
//! ```text
//!  host event ─▶ UploaderMachine::handle ─▶ Vec<Effect>
//!                        │                      │
//!                 Validator, ledger       Uploader (shell)
//!                                          ├─ PreviewBackend   create / release handles
//!                                          ├─ Transport        multipart POST, fetch
//!                                          └─ UploaderHooks    host callbacks
//! ```
//!
//! This split exists for three reasons:
//!
//! - **Testability**: every transition is asserted on plain values, with no
//!   mocks and no runtime.
//! - **Reentrancy**: the machine's phase is the only guard against a second
//!   upload or a stray crop result, so the guard cannot be bypassed by a UI.
//! - **Portability**: the shell is the only place that knows about tokio,
//!   reqwest or a renderer.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`uploader`] | The state machine, its shell, and the host hook trait |
//! | [`validation`] | Size, type and count checks for candidate files |
//! | [`preview`] | Preview handle ledger with deferred release, plus the in-memory blob registry |
//! | [`imaging`] | Crop engine: decode, cut, scale, circular mask, re-encode |
//! | [`upload`] | Upload dispatcher and the transport seam (reqwest in production) |
//! | [`config`] | `uploader.toml` loading, validation and merging |
//! | [`types`] | Shared entry, payload and id types |
//! | [`scan`] | Path expansion and file loading for the CLI |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Deferred Preview Release
//!
//! A preview replaced or removed at collection revision `r` may still be on
//! screen until the host renders `r`. The ledger queues the release under `r`
//! and hands it back only when the host reports a committed frame at or past
//! it. Unmount releases everything, each handle exactly once.
//!
//! ## Entries Matched by Id
//!
//! Upload results are applied to the entries that were dispatched, found by
//! id rather than position. Ids come from a per-instance counter and are
//! never reused, even across initial-image generations.
//!
//! ## No Rollback of Partial Uploads
//!
//! With one request per file, files that were accepted before a failure stay
//! accepted on the server. The collection reports the failure and leaves
//! every entry pending; the next upload resends them.
//!
//! ## Declared Media Types
//!
//! Validation trusts the declared media type, as a browser does. The crop
//! engine re-encodes in that type when the `image` crate can write it and
//! falls back to JPEG otherwise.

pub mod config;
pub mod imaging;
pub mod output;
pub mod preview;
pub mod scan;
pub mod types;
pub mod upload;
pub mod uploader;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_helpers;
