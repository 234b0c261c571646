//! Command-execution shell.
//!
//! [`Uploader`] owns an [`UploaderMachine`] plus the three collaborators its
//! effects need: a [`PreviewBackend`] for handles, a [`Transport`] for the
//! network and an [`UploaderHooks`] for the host. Each public method feeds
//! one event to the machine and carries out the returned effects in order.
//!
//! The two slow operations are async: [`Uploader::confirm_crop`] decodes and
//! encodes on tokio's blocking pool, and [`Uploader::upload`] awaits the
//! dispatcher. Neither can be cancelled once started.

use super::hooks::UploaderHooks;
use super::machine::{Effect, Event, Phase, UploadBatch, UploaderMachine};
use crate::config::UploaderConfig;
use crate::imaging::{
    CropError, CropInput, CropOptions, PixelRect, calculate_crop_area, crop, image_dimensions,
};
use crate::preview::PreviewBackend;
use crate::types::{FileEntry, ImagePayload, ImageSource};
use crate::upload::{Transport, dispatch};

pub struct Uploader<P, T, H> {
    machine: UploaderMachine,
    previews: P,
    transport: T,
    hooks: H,
}

impl<P: PreviewBackend, T: Transport, H: UploaderHooks> Uploader<P, T, H> {
    pub fn new(config: UploaderConfig, previews: P, transport: T, hooks: H) -> Self {
        Self {
            machine: UploaderMachine::new(config),
            previews,
            transport,
            hooks,
        }
    }

    pub fn machine(&self) -> &UploaderMachine {
        &self.machine
    }

    pub fn entries(&self) -> &[FileEntry] {
        self.machine.entries()
    }

    pub fn phase(&self) -> &Phase {
        self.machine.phase()
    }

    pub fn accepts_drop(&self) -> bool {
        self.machine.accepts_drop()
    }

    pub fn previews(&self) -> &P {
        &self.previews
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn set_initial_images(&mut self, images: Vec<ImageSource>) {
        self.apply(Event::InitialImages(images));
    }

    pub fn select_files(&mut self, files: Vec<ImagePayload>) {
        self.apply(Event::FilesSelected(files));
    }

    pub fn edit(&mut self, index: usize) {
        self.apply(Event::EditRequested(index));
    }

    pub fn remove(&mut self, index: usize) {
        self.apply(Event::RemoveRequested(index));
    }

    pub fn reset_uploaded(&mut self, index: usize) {
        self.apply(Event::ResetUploaded(index));
    }

    /// Report that the host rendered the collection at `revision`.
    pub fn frame_committed(&mut self, revision: u64) {
        self.apply(Event::FrameCommitted(revision));
    }

    pub fn unmount(&mut self) {
        self.apply(Event::Unmount);
    }

    pub fn cancel_crop(&mut self) {
        self.apply(Event::CropCancelled);
    }

    /// Commit a crop produced outside the engine.
    pub fn commit_crop(&mut self, cropped: ImagePayload) {
        self.apply(Event::CropCommitted(cropped));
    }

    /// Default selection for the open crop: the largest centred rectangle of
    /// the configured aspect ratio. `None` when no crop is open.
    pub async fn default_crop_rect(&self) -> Result<Option<PixelRect>, CropError> {
        let Phase::AwaitingCrop(target) = self.machine.phase() else {
            return Ok(None);
        };
        let source = target.source.clone();
        let aspect = self.machine.crop_aspect_ratio();

        let input = self.load_crop_input(&source).await?;
        let (width, height) = blocking(move || image_dimensions(&input.bytes)).await?;
        Ok(Some(calculate_crop_area(width, height, aspect)))
    }

    /// Crop the open target to `rect` and commit the result.
    ///
    /// Failures close the crop step and reach the host through the error
    /// hook. Returns the committed payload on success.
    pub async fn confirm_crop(&mut self, rect: PixelRect) -> Option<ImagePayload> {
        let Phase::AwaitingCrop(target) = self.machine.phase() else {
            tracing::warn!("crop confirmed without an open crop");
            return None;
        };
        let source = target.source.clone();
        let options = self.machine.config().crop_options();

        let result = match self.load_crop_input(&source).await {
            Ok(input) => run_crop(input, rect, options).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(cropped) => {
                self.apply(Event::CropCommitted(cropped.clone()));
                Some(cropped)
            }
            Err(error) => {
                self.apply(Event::CropFailed(error));
                None
            }
        }
    }

    /// Upload every pending payload to the configured endpoint.
    pub async fn upload(&mut self) {
        let Some(batch) = self.apply(Event::UploadRequested) else {
            return;
        };
        let UploadBatch {
            files,
            endpoint,
            options,
        } = batch;

        let hooks = &mut self.hooks;
        let result = dispatch(
            &self.transport,
            &files,
            &endpoint,
            &options,
            &mut |percent: u8| hooks.upload_progress(percent),
        )
        .await;

        self.apply(Event::UploadFinished(result));
    }

    /// Feed `event` to the machine and carry out its effects. A dispatch
    /// request is handed back to the caller.
    fn apply(&mut self, event: Event) -> Option<UploadBatch> {
        let mut batch = None;
        for effect in self.machine.handle(event) {
            match effect {
                Effect::CreatePreview { handle, payload } => self.previews.create(handle, &payload),
                Effect::ReleasePreview(handle) => self.previews.release(handle),
                Effect::Notify(notification) => notification.deliver(&mut self.hooks),
                Effect::Dispatch(request) => batch = Some(request),
            }
        }
        batch
    }

    async fn load_crop_input(&self, source: &ImageSource) -> Result<CropInput, CropError> {
        match source {
            ImageSource::Payload(payload) => Ok(CropInput::from_payload(payload)),
            ImageSource::Remote(url) => {
                tracing::debug!(%url, "fetching remote image for crop");
                let bytes = self
                    .transport
                    .fetch(url)
                    .await
                    .map_err(|e| CropError::Fetch {
                        url: url.clone(),
                        reason: e.to_string(),
                    })?;
                Ok(CropInput::from_remote(url, bytes))
            }
        }
    }
}

async fn run_crop(
    input: CropInput,
    rect: PixelRect,
    options: CropOptions,
) -> Result<ImagePayload, CropError> {
    blocking(move || crop(&input, &rect, &options)).await
}

/// Run image work on the blocking pool.
async fn blocking<R, F>(work: F) -> Result<R, CropError>
where
    R: Send + 'static,
    F: FnOnce() -> Result<R, CropError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| CropError::Encode(format!("image task did not complete: {e}")))?
}
