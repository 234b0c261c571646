//! Shared types passed between the validator, the crop engine, the upload
//! dispatcher and the uploader state machine.

use std::fmt;
use std::sync::Arc;

/// Identifier of one entry in the uploader collection.
///
/// Allocated from a per-instance monotonic counter, so an id is never handed
/// out twice, even after the collection is replaced by new initial images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry-{}", self.0)
    }
}

/// Identifier of a tracked preview resource (the blob-URL equivalent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl HandleId {
    /// URL under which a renderer can look up the handle's bytes.
    pub fn blob_url(self) -> String {
        format!("blob:image-uploader/{}", self.0)
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle-{}", self.0)
    }
}

/// Owned binary image content, the equivalent of a browser `File`.
///
/// Bytes sit behind an `Arc` so payloads can be cloned into notifications,
/// upload batches and blocking crop tasks without copying the image.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub name: String,
    /// Declared media type, e.g. `image/png`. Not sniffed from the bytes.
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl ImagePayload {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Where an entry's content lives: owned bytes or an externally hosted URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Payload(ImagePayload),
    Remote(String),
}

impl ImageSource {
    pub fn as_payload(&self) -> Option<&ImagePayload> {
        match self {
            ImageSource::Payload(p) => Some(p),
            ImageSource::Remote(_) => None,
        }
    }

    /// Payload name, or the URL itself for remote sources.
    pub fn display_name(&self) -> &str {
        match self {
            ImageSource::Payload(p) => &p.name,
            ImageSource::Remote(url) => url,
        }
    }
}

impl From<ImagePayload> for ImageSource {
    fn from(payload: ImagePayload) -> Self {
        ImageSource::Payload(payload)
    }
}

/// What a renderer shows for an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// A tracked handle that must be released when the entry goes away.
    Tracked(HandleId),
    /// An external URL rendered directly; nothing to release.
    Remote(String),
}

/// How an entry came into the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Initial,
    Selected,
    Cropped,
}

/// One image in the uploader collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub id: EntryId,
    pub source: ImageSource,
    pub preview: Preview,
    pub origin: Origin,
    pub is_cropped: bool,
    pub is_uploaded: bool,
}

impl FileEntry {
    /// The tracked handle, if this entry owns one.
    pub fn handle(&self) -> Option<HandleId> {
        match self.preview {
            Preview::Tracked(h) => Some(h),
            Preview::Remote(_) => None,
        }
    }

    /// Display URL for the preview.
    pub fn preview_url(&self) -> String {
        match &self.preview {
            Preview::Tracked(h) => h.blob_url(),
            Preview::Remote(url) => url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_debug_omits_bytes() {
        let payload = ImagePayload::new("a.png", "image/png", vec![0u8; 2048]);
        let debug = format!("{payload:?}");
        assert!(debug.contains("size: 2048"));
        assert!(!debug.contains("[0, 0"));
    }

    #[test]
    fn remote_entry_previews_its_url() {
        let entry = FileEntry {
            id: EntryId(1),
            source: ImageSource::Remote("https://cdn.test/a.jpg".into()),
            preview: Preview::Remote("https://cdn.test/a.jpg".into()),
            origin: Origin::Initial,
            is_cropped: false,
            is_uploaded: true,
        };
        assert_eq!(entry.handle(), None);
        assert_eq!(entry.preview_url(), "https://cdn.test/a.jpg");
    }

    #[test]
    fn tracked_entry_previews_blob_url() {
        let entry = FileEntry {
            id: EntryId(2),
            source: ImageSource::Payload(ImagePayload::new("a.png", "image/png", vec![1])),
            preview: Preview::Tracked(HandleId(7)),
            origin: Origin::Selected,
            is_cropped: false,
            is_uploaded: false,
        };
        assert_eq!(entry.handle(), Some(HandleId(7)));
        assert_eq!(entry.preview_url(), "blob:image-uploader/7");
    }
}
