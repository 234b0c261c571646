//! The uploader state machine.
//!
//! [`UploaderMachine::handle`] is the whole transition function: it takes one
//! [`Event`], mutates the collection and phase, and returns the [`Effect`]s
//! the shell must carry out. It never touches the network, the preview
//! backend or the host directly, so every transition is testable without
//! mocks.
//!
//! ## Phases
//!
//! ```text
//!            FilesSelected (crop on)          CropCommitted
//!   Idle ──────────────────────────▶ AwaitingCrop ─────────────▶ Idle
//!    │ ▲      EditRequested                │ CropCancelled / CropFailed
//!    │ └───────────────────────────────────┘
//!    │ UploadRequested                 UploadFinished
//!    └──────────────▶ Uploading ──────────────────────▶ Idle
//!
//!   any ── Unmount ──▶ Unmounted (terminal, ignores every event)
//! ```
//!
//! ## Collection revisions
//!
//! Every mutation of the entry list bumps a revision counter. A handle that
//! leaves the collection is queued for release under the revision that
//! dropped it, and only released once the host reports
//! [`Event::FrameCommitted`] with that revision or later.

use super::hooks::Notification;
use crate::config::UploaderConfig;
use crate::imaging::{AspectRatio, CropError};
use crate::preview::ResourceTracker;
use crate::types::{EntryId, FileEntry, HandleId, ImagePayload, ImageSource, Origin, Preview};
use crate::upload::{DispatchOptions, UploadError, UploadResponse};
use crate::validation::{ValidationError, validate_batch};

/// Content waiting in the crop step.
#[derive(Debug, Clone, PartialEq)]
pub struct CropTarget {
    pub source: ImageSource,
    /// Entry being re-cropped; `None` for a fresh selection.
    pub entry: Option<EntryId>,
    /// Position of that entry when the edit started.
    pub index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    AwaitingCrop(CropTarget),
    /// Ids of the entries in flight.
    Uploading(Vec<EntryId>),
    Unmounted,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::AwaitingCrop(_) => "awaiting-crop",
            Phase::Uploading(_) => "uploading",
            Phase::Unmounted => "unmounted",
        }
    }
}

/// Everything that can happen to an uploader.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Replace the collection with an externally supplied list.
    InitialImages(Vec<ImageSource>),
    FilesSelected(Vec<ImagePayload>),
    EditRequested(usize),
    CropCommitted(ImagePayload),
    CropCancelled,
    CropFailed(CropError),
    RemoveRequested(usize),
    UploadRequested,
    UploadFinished(Result<UploadResponse, UploadError>),
    /// Make a payload entry eligible for upload again.
    ResetUploaded(usize),
    /// The host rendered the collection at this revision.
    FrameCommitted(u64),
    Unmount,
}

/// Files handed to the upload dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadBatch {
    pub files: Vec<ImagePayload>,
    pub endpoint: String,
    pub options: DispatchOptions,
}

/// Work the shell performs after a transition, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    CreatePreview {
        handle: HandleId,
        payload: ImagePayload,
    },
    ReleasePreview(HandleId),
    Notify(Notification),
    Dispatch(UploadBatch),
}

#[derive(Debug)]
pub struct UploaderMachine {
    config: UploaderConfig,
    entries: Vec<FileEntry>,
    phase: Phase,
    tracker: ResourceTracker,
    revision: u64,
    next_id: u64,
}

impl UploaderMachine {
    pub fn new(config: UploaderConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            phase: Phase::Idle,
            tracker: ResourceTracker::new(),
            revision: 0,
            next_id: 0,
        }
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Revision of the current collection.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    /// Whether the host should offer the drop target / file picker.
    pub fn accepts_drop(&self) -> bool {
        !self.config.disabled
            && self.phase != Phase::Unmounted
            && self.entries.len() < self.config.max_files
    }

    /// Ratio the crop selection UI should enforce.
    pub fn crop_aspect_ratio(&self) -> AspectRatio {
        self.config.crop.aspect_ratio
    }

    /// Payloads not yet uploaded, in collection order.
    pub fn pending_payloads(&self) -> Vec<ImagePayload> {
        self.entries
            .iter()
            .filter(|e| !e.is_uploaded)
            .filter_map(|e| e.source.as_payload().cloned())
            .collect()
    }

    /// Apply one event and return the effects it produced.
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.phase == Phase::Unmounted {
            tracing::debug!(?event, "event after unmount ignored");
            return effects;
        }

        match event {
            Event::InitialImages(images) => self.apply_initial_images(images, &mut effects),
            Event::FilesSelected(files) => self.select(files, &mut effects),
            Event::EditRequested(index) => self.edit(index, &mut effects),
            Event::CropCommitted(cropped) => self.commit_crop(cropped, &mut effects),
            Event::CropCancelled => self.close_crop(None, &mut effects),
            Event::CropFailed(error) => self.close_crop(Some(error), &mut effects),
            Event::RemoveRequested(index) => self.remove(index, &mut effects),
            Event::UploadRequested => self.request_upload(&mut effects),
            Event::UploadFinished(result) => self.finish_upload(result, &mut effects),
            Event::ResetUploaded(index) => self.reset_uploaded(index),
            Event::FrameCommitted(revision) => {
                for handle in self.tracker.drain_committed(revision) {
                    effects.push(Effect::ReleasePreview(handle));
                }
            }
            Event::Unmount => {
                for handle in self.tracker.release_all() {
                    effects.push(Effect::ReleasePreview(handle));
                }
                self.entries.clear();
                self.phase = Phase::Unmounted;
                tracing::debug!(released = effects.len(), "uploader unmounted");
            }
        }
        effects
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    fn apply_initial_images(&mut self, mut images: Vec<ImageSource>, effects: &mut Vec<Effect>) {
        if images.len() > self.config.max_files {
            tracing::warn!(
                supplied = images.len(),
                max_files = self.config.max_files,
                "initial images exceed max_files; truncating"
            );
            images.truncate(self.config.max_files);
        }

        let revision = self.bump();
        for old in std::mem::take(&mut self.entries) {
            self.retire(&old, revision);
        }

        let mut entries = Vec::with_capacity(images.len());
        for source in images {
            let entry = match source {
                ImageSource::Remote(url) => FileEntry {
                    id: self.allocate_id(),
                    preview: Preview::Remote(url.clone()),
                    source: ImageSource::Remote(url),
                    origin: Origin::Initial,
                    is_cropped: false,
                    is_uploaded: true,
                },
                ImageSource::Payload(payload) => {
                    self.payload_entry(payload, Origin::Initial, effects)
                }
            };
            entries.push(entry);
        }
        self.entries = entries;
        tracing::info!(entries = self.entries.len(), revision, "initial images applied");
    }

    fn select(&mut self, files: Vec<ImagePayload>, effects: &mut Vec<Effect>) {
        if self.config.disabled {
            tracing::debug!("selection ignored: uploader disabled");
            return;
        }
        if self.phase != Phase::Idle {
            tracing::debug!(phase = self.phase.name(), "selection ignored");
            return;
        }
        if files.is_empty() {
            return;
        }

        let errors = validate_batch(
            &files,
            self.entries.len(),
            self.config.max_files,
            self.config.max_file_size,
            &self.config.accepted_types,
        );
        if let Some(first) = errors.into_iter().next() {
            tracing::info!(error = %first, "selection rejected");
            effects.push(Effect::Notify(Notification::Error(first.to_string())));
            return;
        }

        if self.config.crop.enabled {
            let Some(first) = files.into_iter().next() else {
                return;
            };
            let source = ImageSource::Payload(first);
            self.phase = Phase::AwaitingCrop(CropTarget {
                source: source.clone(),
                entry: None,
                index: None,
            });
            effects.push(Effect::Notify(Notification::CropOpened {
                source,
                index: None,
            }));
            return;
        }

        let added = files.len();
        for payload in files {
            let entry = self.payload_entry(payload, Origin::Selected, effects);
            self.entries.push(entry);
        }
        let revision = self.bump();
        tracing::info!(added, total = self.entries.len(), revision, "files added");
        effects.push(self.files_changed());
    }

    fn edit(&mut self, index: usize, effects: &mut Vec<Effect>) {
        if self.phase != Phase::Idle {
            tracing::debug!(phase = self.phase.name(), "edit ignored");
            return;
        }
        if !self.config.crop.enabled {
            tracing::debug!("edit ignored: cropping disabled");
            return;
        }
        let Some(entry) = self.entries.get(index) else {
            tracing::warn!(index, len = self.entries.len(), "edit index out of range");
            return;
        };
        if entry.origin == Origin::Initial && !self.config.edit_mode {
            tracing::debug!(entry = %entry.id, "edit ignored: initial images locked");
            return;
        }

        let source = entry.source.clone();
        self.phase = Phase::AwaitingCrop(CropTarget {
            source: source.clone(),
            entry: Some(entry.id),
            index: Some(index),
        });
        effects.push(Effect::Notify(Notification::CropOpened {
            source,
            index: Some(index),
        }));
    }

    fn commit_crop(&mut self, cropped: ImagePayload, effects: &mut Vec<Effect>) {
        let target = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::AwaitingCrop(target) => target,
            other => {
                tracing::warn!(phase = other.name(), "crop result without an open crop");
                self.phase = other;
                return;
            }
        };

        // The edited entry may have been removed or superseded meanwhile.
        let position = target.entry.and_then(|id| self.position_of(id));
        if target.entry.is_some() && position.is_none() {
            tracing::warn!("edited entry no longer present; adding crop as a new entry");
        }
        if position.is_none() && self.entries.len() >= self.config.max_files {
            let error = ValidationError::TooMany {
                max: self.config.max_files,
            };
            effects.push(Effect::Notify(Notification::Error(error.to_string())));
            effects.push(Effect::Notify(Notification::CropClosed));
            return;
        }

        let entry = self.payload_entry(cropped.clone(), Origin::Cropped, effects);
        let id = entry.id;
        let revision = self.bump();
        match position {
            Some(i) => {
                let old = std::mem::replace(&mut self.entries[i], entry);
                self.retire(&old, revision);
            }
            None => self.entries.push(entry),
        }
        tracing::info!(entry = %id, replaced = position.is_some(), revision, "crop committed");

        effects.push(self.files_changed());
        effects.push(Effect::Notify(Notification::CropCompleted {
            cropped,
            original: target.source,
            index: position,
        }));
        effects.push(Effect::Notify(Notification::CropClosed));
    }

    fn close_crop(&mut self, error: Option<CropError>, effects: &mut Vec<Effect>) {
        if !matches!(self.phase, Phase::AwaitingCrop(_)) {
            tracing::warn!(phase = self.phase.name(), "crop close without an open crop");
            return;
        }
        self.phase = Phase::Idle;
        if let Some(error) = error {
            tracing::warn!(%error, "crop failed");
            effects.push(Effect::Notify(Notification::Error(error.to_string())));
        }
        effects.push(Effect::Notify(Notification::CropClosed));
    }

    fn remove(&mut self, index: usize, effects: &mut Vec<Effect>) {
        if index >= self.entries.len() {
            tracing::warn!(index, len = self.entries.len(), "remove index out of range");
            return;
        }
        let removed = self.entries.remove(index);
        let revision = self.bump();
        self.retire(&removed, revision);
        tracing::info!(entry = %removed.id, revision, "entry removed");
        effects.push(self.files_changed());
    }

    fn request_upload(&mut self, effects: &mut Vec<Effect>) {
        if self.phase != Phase::Idle {
            tracing::debug!(phase = self.phase.name(), "upload request ignored");
            return;
        }
        let Some(endpoint) = self.config.upload.url.clone() else {
            tracing::info!("upload request ignored: no upload url configured");
            return;
        };

        let (ids, files): (Vec<EntryId>, Vec<ImagePayload>) = self
            .entries
            .iter()
            .filter(|e| !e.is_uploaded)
            .filter_map(|e| e.source.as_payload().map(|p| (e.id, p.clone())))
            .unzip();

        if files.is_empty() {
            tracing::debug!("nothing to upload");
            effects.push(Effect::Notify(Notification::UploadComplete {
                pending: Vec::new(),
                response: None,
            }));
            return;
        }

        tracing::info!(files = files.len(), %endpoint, "upload started");
        self.phase = Phase::Uploading(ids);
        effects.push(Effect::Dispatch(UploadBatch {
            files,
            endpoint,
            options: self.config.dispatch_options(),
        }));
    }

    fn finish_upload(
        &mut self,
        result: Result<UploadResponse, UploadError>,
        effects: &mut Vec<Effect>,
    ) {
        let ids = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Uploading(ids) => ids,
            other => {
                tracing::warn!(phase = other.name(), "upload result while not uploading");
                self.phase = other;
                return;
            }
        };

        match result {
            Ok(response) => {
                let mut marked = 0;
                for entry in self.entries.iter_mut().filter(|e| ids.contains(&e.id)) {
                    entry.is_uploaded = true;
                    marked += 1;
                }
                let revision = self.bump();
                tracing::info!(marked, revision, "upload finished");
                effects.push(Effect::Notify(Notification::UploadComplete {
                    pending: self.pending_payloads(),
                    response: Some(response),
                }));
            }
            Err(error) => {
                tracing::warn!(%error, "upload failed");
                effects.push(Effect::Notify(Notification::Error(error.to_string())));
            }
        }
    }

    fn reset_uploaded(&mut self, index: usize) {
        match self.entries.get_mut(index) {
            Some(entry) if entry.source.as_payload().is_some() => {
                entry.is_uploaded = false;
                self.bump();
            }
            Some(entry) => {
                tracing::debug!(entry = %entry.id, "remote entries stay uploaded");
            }
            None => {
                tracing::warn!(index, len = self.entries.len(), "reset index out of range");
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn allocate_id(&mut self) -> EntryId {
        self.next_id += 1;
        EntryId(self.next_id)
    }

    fn bump(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    fn position_of(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// New tracked entry for `payload`; queues the preview creation.
    fn payload_entry(
        &mut self,
        payload: ImagePayload,
        origin: Origin,
        effects: &mut Vec<Effect>,
    ) -> FileEntry {
        let handle = self.tracker.track();
        effects.push(Effect::CreatePreview {
            handle,
            payload: payload.clone(),
        });
        FileEntry {
            id: self.allocate_id(),
            source: ImageSource::Payload(payload),
            preview: Preview::Tracked(handle),
            origin,
            is_cropped: origin == Origin::Cropped,
            is_uploaded: false,
        }
    }

    /// Queue the entry's preview for release after `revision` is rendered.
    fn retire(&mut self, entry: &FileEntry, revision: u64) {
        if let Some(handle) = entry.handle() {
            if !self.tracker.schedule_release(handle, revision) {
                tracing::warn!(%handle, entry = %entry.id, "preview already released");
            }
        }
    }

    fn files_changed(&self) -> Effect {
        Effect::Notify(Notification::FilesChanged(
            self.entries.iter().map(|e| e.source.clone()).collect(),
        ))
    }
}
