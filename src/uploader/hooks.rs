//! Host callbacks.
//!
//! The state machine never calls the host directly; it emits
//! [`Notification`]s and the shell delivers them to an [`UploaderHooks`]
//! implementation. Every hook defaults to a no-op so hosts implement only
//! what they render.

use crate::types::{ImagePayload, ImageSource};
use crate::upload::UploadResponse;

/// Callbacks a host can observe.
pub trait UploaderHooks {
    /// The collection changed; `sources` is every entry's content in order.
    fn files_changed(&mut self, _sources: &[ImageSource]) {}

    /// An upload finished, or was skipped because nothing was pending.
    /// `pending` holds the payloads still not uploaded.
    fn upload_complete(&mut self, _pending: &[ImagePayload], _response: Option<&UploadResponse>) {
    }

    /// Human-readable validation, crop or upload failure.
    fn error(&mut self, _message: &str) {}

    /// The crop step opened for `source`. `index` is set when editing an
    /// existing entry.
    fn crop_opened(&mut self, _source: &ImageSource, _index: Option<usize>) {}

    /// A crop was committed.
    fn crop_completed(
        &mut self,
        _cropped: &ImagePayload,
        _original: &ImageSource,
        _index: Option<usize>,
    ) {
    }

    /// The crop step closed, whether committed, cancelled or failed.
    fn crop_closed(&mut self) {}

    /// Upload progress in percent.
    fn upload_progress(&mut self, _percent: u8) {}
}

/// Hooks that ignore everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl UploaderHooks for NoHooks {}

/// A host callback produced by a state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    FilesChanged(Vec<ImageSource>),
    UploadComplete {
        pending: Vec<ImagePayload>,
        response: Option<UploadResponse>,
    },
    Error(String),
    CropOpened {
        source: ImageSource,
        index: Option<usize>,
    },
    CropCompleted {
        cropped: ImagePayload,
        original: ImageSource,
        index: Option<usize>,
    },
    CropClosed,
}

impl Notification {
    /// Invoke the matching hook.
    pub fn deliver<H: UploaderHooks + ?Sized>(&self, hooks: &mut H) {
        match self {
            Notification::FilesChanged(sources) => hooks.files_changed(sources),
            Notification::UploadComplete { pending, response } => {
                hooks.upload_complete(pending, response.as_ref())
            }
            Notification::Error(message) => hooks.error(message),
            Notification::CropOpened { source, index } => hooks.crop_opened(source, *index),
            Notification::CropCompleted {
                cropped,
                original,
                index,
            } => hooks.crop_completed(cropped, original, *index),
            Notification::CropClosed => hooks.crop_closed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::RecordingHooks;

    #[test]
    fn deliver_routes_to_matching_hook() {
        let mut hooks = RecordingHooks::default();
        let payload = ImagePayload::new("a.png", "image/png", vec![1]);

        Notification::Error("bad".into()).deliver(&mut hooks);
        Notification::CropOpened {
            source: payload.clone().into(),
            index: Some(2),
        }
        .deliver(&mut hooks);
        Notification::CropClosed.deliver(&mut hooks);

        assert_eq!(hooks.errors, vec!["bad".to_string()]);
        assert_eq!(hooks.crop_opened, vec![(payload.into(), Some(2))]);
        assert_eq!(hooks.crop_closed, 1);
    }

    #[test]
    fn no_hooks_accepts_everything() {
        let mut hooks = NoHooks;
        Notification::FilesChanged(Vec::new()).deliver(&mut hooks);
        Notification::UploadComplete {
            pending: Vec::new(),
            response: None,
        }
        .deliver(&mut hooks);
    }
}
