//! Media-type and file-name helpers.
//!
//! The `image` crate already knows the mapping between extensions, MIME
//! types and codecs; these helpers restrict it to the formats compiled into
//! this crate and supply the fallbacks used when cropping.

use image::ImageFormat;
use std::path::Path;

/// File name used for a cropped remote image whose URL has no usable name.
pub const DEFAULT_CROP_NAME: &str = "cropped-image.jpg";

/// Media type used when the source type cannot be determined.
pub const FALLBACK_MEDIA_TYPE: &str = "image/jpeg";

/// Format to encode `media_type` with, if this build can write it.
pub fn encodable_format(media_type: &str) -> Option<ImageFormat> {
    ImageFormat::from_mime_type(media_type).filter(|f| f.writing_enabled())
}

/// Media type declared by a file extension, for formats this build can read.
pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    ImageFormat::from_path(path)
        .ok()
        .filter(|f| f.reading_enabled())
        .map(|f| f.to_mime_type())
}

/// Last path segment of `url`, without query string or fragment, when it
/// looks like a file name (contains a `.`).
pub fn file_name_from_url(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let last = without_query.rsplit('/').next()?;
    if last.contains('.') {
        Some(last.to_string())
    } else {
        None
    }
}

/// File name and media type for content loaded from `url`.
///
/// Falls back to [`DEFAULT_CROP_NAME`] and [`FALLBACK_MEDIA_TYPE`].
pub fn describe_remote(url: &str) -> (String, String) {
    let Some(name) = file_name_from_url(url) else {
        return (DEFAULT_CROP_NAME.to_string(), FALLBACK_MEDIA_TYPE.to_string());
    };
    let media_type = ImageFormat::from_path(&name)
        .ok()
        .filter(|f| f.writing_enabled())
        .map(|f| f.to_mime_type())
        .unwrap_or(FALLBACK_MEDIA_TYPE);
    (name, media_type.to_string())
}

/// Human-readable size: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exponent])
}
