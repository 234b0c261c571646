//! Shared test utilities for the image-uploader test suite.
//!
//! Provides in-memory image fixtures and a hooks implementation that records
//! every callback, so tests can assert on exactly what the host would see.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let photo = png_payload("photo.png", 200, 150);
//! let mut hooks = RecordingHooks::default();
//! // ... drive an Uploader with `hooks` ...
//! assert_eq!(hooks.crop_closed, 1);
//! ```

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;

use crate::types::{ImagePayload, ImageSource};
use crate::upload::UploadResponse;
use crate::uploader::UploaderHooks;

// =========================================================================
// Image fixtures
// =========================================================================

/// Gradient image where pixel `(x, y)` is `(x % 256, y % 256, 128)`.
///
/// Crops can then be checked by reading back a single pixel.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// PNG-encoded gradient declared as `image/png`.
pub fn png_payload(name: &str, width: u32, height: u32) -> ImagePayload {
    let mut buf = Vec::new();
    gradient(width, height)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    ImagePayload::new(name, "image/png", buf)
}

/// JPEG-encoded gradient declared as `image/jpeg`.
pub fn jpeg_payload(name: &str, width: u32, height: u32) -> ImagePayload {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, 90);
    gradient(width, height).write_with_encoder(encoder).unwrap();
    ImagePayload::new(name, "image/jpeg", buf)
}

// =========================================================================
// Hooks
// =========================================================================

/// Records every hook invocation in call order.
#[derive(Debug, Default)]
pub struct RecordingHooks {
    pub files_changed: Vec<Vec<ImageSource>>,
    pub uploads: Vec<(Vec<ImagePayload>, Option<UploadResponse>)>,
    pub errors: Vec<String>,
    pub crop_opened: Vec<(ImageSource, Option<usize>)>,
    pub crop_completed: Vec<(ImagePayload, ImageSource, Option<usize>)>,
    pub crop_closed: usize,
    pub progress: Vec<u8>,
}

impl UploaderHooks for RecordingHooks {
    fn files_changed(&mut self, sources: &[ImageSource]) {
        self.files_changed.push(sources.to_vec());
    }

    fn upload_complete(&mut self, pending: &[ImagePayload], response: Option<&UploadResponse>) {
        self.uploads.push((pending.to_vec(), response.cloned()));
    }

    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn crop_opened(&mut self, source: &ImageSource, index: Option<usize>) {
        self.crop_opened.push((source.clone(), index));
    }

    fn crop_completed(
        &mut self,
        cropped: &ImagePayload,
        original: &ImageSource,
        index: Option<usize>,
    ) {
        self.crop_completed
            .push((cropped.clone(), original.clone(), index));
    }

    fn crop_closed(&mut self) {
        self.crop_closed += 1;
    }

    fn upload_progress(&mut self, percent: u8) {
        self.progress.push(percent);
    }
}
