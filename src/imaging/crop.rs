//! The crop engine: decode, cut, optionally scale and mask, re-encode.
//!
//! | Step | Crate / function |
//! |---|---|
//! | Decode | `image::load_from_memory` |
//! | Cut | `DynamicImage::crop_imm` |
//! | Scale (`output_size`) | `DynamicImage::resize_exact`, Lanczos3 |
//! | Circular mask | per-pixel alpha, see [`inside_circle`] |
//! | Encode JPEG | `JpegEncoder::new_with_quality` on RGB8 |
//! | Encode PNG/WebP/GIF/BMP | `DynamicImage::write_to` on RGBA8 |
//!
//! The output keeps the source media type when this build can encode it and
//! falls back to JPEG otherwise. Every failure is a [`CropError`]; callers
//! treat it like a cancelled crop.
//!
//! [`compress`] shares the encoder: a whole-image JPEG re-encode at a chosen
//! quality.

use super::calculations::{inside_circle, pixel_bounds};
use super::media::{FALLBACK_MEDIA_TYPE, describe_remote, encodable_format};
use super::params::{CropOptions, PixelRect, Quality};
use crate::types::ImagePayload;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba};
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CropError {
    #[error("Crop failed: could not load {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("Crop failed: could not decode image: {0}")]
    Decode(String),
    #[error("Crop failed: {0}")]
    Encode(String),
}

/// Bytes to crop plus the name and type the result should carry.
#[derive(Debug, Clone)]
pub struct CropInput {
    pub bytes: Arc<[u8]>,
    pub file_name: String,
    pub media_type: String,
}

impl CropInput {
    /// Crop an owned payload: its name and declared type are reused.
    pub fn from_payload(payload: &ImagePayload) -> Self {
        Self {
            bytes: Arc::clone(&payload.bytes),
            file_name: payload.name.clone(),
            media_type: payload.media_type.clone(),
        }
    }

    /// Crop bytes fetched from `url`: name and type come from the URL.
    pub fn from_remote(url: &str, bytes: impl Into<Arc<[u8]>>) -> Self {
        let (file_name, media_type) = describe_remote(url);
        Self {
            bytes: bytes.into(),
            file_name,
            media_type,
        }
    }
}

/// Width and height of an encoded image.
pub fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), CropError> {
    let img = image::load_from_memory(bytes).map_err(|e| CropError::Decode(e.to_string()))?;
    Ok((img.width(), img.height()))
}

/// Cut `rect` out of `input` and encode the result.
#[tracing::instrument(skip(input, options), fields(name = %input.file_name))]
pub fn crop(
    input: &CropInput,
    rect: &PixelRect,
    options: &CropOptions,
) -> Result<ImagePayload, CropError> {
    let bounds = pixel_bounds(rect).ok_or_else(|| {
        CropError::Encode(format!(
            "invalid crop rectangle {}x{} at ({}, {})",
            rect.width, rect.height, rect.x, rect.y
        ))
    })?;

    let source =
        image::load_from_memory(&input.bytes).map_err(|e| CropError::Decode(e.to_string()))?;

    let mut cropped = source.crop_imm(bounds.x, bounds.y, bounds.width, bounds.height);
    if cropped.width() == 0 || cropped.height() == 0 {
        return Err(CropError::Encode(format!(
            "crop region at ({}, {}) lies outside the {}x{} image",
            bounds.x,
            bounds.y,
            source.width(),
            source.height()
        )));
    }

    if let Some((width, height)) = options.output_size {
        if width == 0 || height == 0 {
            return Err(CropError::Encode("output size must be non-zero".into()));
        }
        cropped = cropped.resize_exact(width, height, FilterType::Lanczos3);
    }

    if options.circular {
        cropped = apply_circular_mask(cropped);
    }

    let (format, media_type) = match encodable_format(&input.media_type) {
        Some(format) => (format, input.media_type.clone()),
        None => (ImageFormat::Jpeg, FALLBACK_MEDIA_TYPE.to_string()),
    };
    let bytes = encode(&cropped, format, options)?;

    tracing::debug!(
        name = %input.file_name,
        media_type = %media_type,
        width = cropped.width(),
        height = cropped.height(),
        size = bytes.len(),
        "cropped image"
    );

    Ok(ImagePayload::new(input.file_name.clone(), media_type, bytes))
}

/// Quality used by [`compress`] when the caller has no preference.
pub const DEFAULT_COMPRESS_QUALITY: Quality = Quality(80);

/// Re-encode a whole image as JPEG at `quality`.
///
/// The name is kept and the media type becomes `image/jpeg`, whatever the
/// source type was. Transparency is flattened.
pub fn compress(payload: &ImagePayload, quality: Quality) -> Result<ImagePayload, CropError> {
    let source =
        image::load_from_memory(&payload.bytes).map_err(|e| CropError::Decode(e.to_string()))?;
    let options = CropOptions {
        quality,
        ..CropOptions::default()
    };
    let bytes = encode(&source, ImageFormat::Jpeg, &options)?;

    tracing::debug!(
        name = %payload.name,
        quality = quality.value(),
        before = payload.bytes.len(),
        after = bytes.len(),
        "compressed image"
    );

    Ok(ImagePayload::new(payload.name.clone(), FALLBACK_MEDIA_TYPE, bytes))
}

/// Clear every pixel outside the inscribed circle to transparent black.
fn apply_circular_mask(img: DynamicImage) -> DynamicImage {
    let mut rgba = img.into_rgba8();
    let (width, height) = rgba.dimensions();
    for (x, y, pixel) in rgba.enumerate_pixels_mut() {
        if !inside_circle(x, y, width, height) {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }
    DynamicImage::ImageRgba8(rgba)
}

fn encode(
    img: &DynamicImage,
    format: ImageFormat,
    options: &CropOptions,
) -> Result<Vec<u8>, CropError> {
    let mut buf = Vec::new();
    let result = match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel; flatten first.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buf, options.quality.value());
            rgb.write_with_encoder(encoder)
        }
        other => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut Cursor::new(&mut buf), other)
        }
    };
    result.map_err(|e| CropError::Encode(format!("{format:?} encode failed: {e}")))?;
    Ok(buf)
}
