//! Preview resource ownership.
//!
//! Every payload entry owns one preview handle, the equivalent of a browser
//! blob URL. Two pieces cooperate:
//!
//! - [`ResourceTracker`] is the ledger kept inside the state machine. It
//!   allocates [`HandleId`]s, knows which are live, and queues superseded
//!   handles for release. It performs no side effects itself.
//! - [`PreviewBackend`] realises the ledger's decisions: it is told to create
//!   a handle for a payload and, later, to release it. [`BlobRegistry`] is the
//!   in-memory implementation a renderer resolves preview URLs against.
//!
//! ## Deferred release
//!
//! A handle replaced or removed at collection revision `r` may still be on
//! screen until the host renders revision `r`. Releasing it immediately
//! would blank the image mid-transition, so the tracker tags each request
//! with `r` and only hands it back from [`ResourceTracker::drain_committed`]
//! once the host reports a committed frame at or past `r`. Unmount releases
//! everything regardless.

use crate::types::{HandleId, ImagePayload};
use std::collections::{BTreeSet, HashMap};

/// Side-effecting half of preview management.
pub trait PreviewBackend {
    /// Make `payload` displayable under `handle`.
    fn create(&mut self, handle: HandleId, payload: &ImagePayload);

    /// Revoke `handle`. Called exactly once per created handle.
    fn release(&mut self, handle: HandleId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRelease {
    handle: HandleId,
    revision: u64,
}

/// Ledger of live preview handles and their pending releases.
#[derive(Debug, Default)]
pub struct ResourceTracker {
    next_handle: u64,
    live: BTreeSet<HandleId>,
    pending: Vec<PendingRelease>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh handle and mark it live.
    pub fn track(&mut self) -> HandleId {
        self.next_handle += 1;
        let handle = HandleId(self.next_handle);
        self.live.insert(handle);
        handle
    }

    /// Queue `handle` for release once `revision` has been rendered.
    ///
    /// Returns `false` (and queues nothing) for unknown, already released or
    /// already queued handles.
    pub fn schedule_release(&mut self, handle: HandleId, revision: u64) -> bool {
        if !self.live.contains(&handle) || self.pending.iter().any(|p| p.handle == handle) {
            return false;
        }
        self.pending.push(PendingRelease { handle, revision });
        true
    }

    /// Hand back every queued handle whose revision is at or below
    /// `committed_revision`. Returned handles are no longer live.
    pub fn drain_committed(&mut self, committed_revision: u64) -> Vec<HandleId> {
        let (due, keep): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|p| p.revision <= committed_revision);
        self.pending = keep;
        due.into_iter()
            .map(|p| {
                self.live.remove(&p.handle);
                p.handle
            })
            .collect()
    }

    /// Hand back every live handle, queued or not. Used on unmount.
    pub fn release_all(&mut self) -> Vec<HandleId> {
        self.pending.clear();
        std::mem::take(&mut self.live).into_iter().collect()
    }

    pub fn is_live(&self, handle: HandleId) -> bool {
        self.live.contains(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// In-memory handle store: handle → payload.
#[derive(Debug, Default)]
pub struct BlobRegistry {
    blobs: HashMap<HandleId, ImagePayload>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, handle: HandleId) -> Option<&ImagePayload> {
        self.blobs.get(&handle)
    }

    /// Resolve a URL produced by [`HandleId::blob_url`].
    pub fn resolve_url(&self, url: &str) -> Option<&ImagePayload> {
        let id = url.strip_prefix("blob:image-uploader/")?.parse().ok()?;
        self.resolve(HandleId(id))
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl PreviewBackend for BlobRegistry {
    fn create(&mut self, handle: HandleId, payload: &ImagePayload) {
        if self.blobs.insert(handle, payload.clone()).is_some() {
            tracing::warn!(%handle, "preview handle created twice");
        }
    }

    fn release(&mut self, handle: HandleId) {
        if self.blobs.remove(&handle).is_none() {
            tracing::warn!(%handle, "release of unknown preview handle");
        }
    }
}
