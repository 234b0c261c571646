//! Image processing for the crop engine — pure Rust via the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::load_from_memory` → width/height |
//! | **Crop** | `crop_imm` + optional `resize_exact` + circular mask |
//! | **Encode** | source media type when writable, JPEG otherwise |
//! | **Compress** | whole-image JPEG re-encode at a given quality |
//!
//! The module is split into:
//! - **Calculations**: pure geometry (default crop area, pixel rounding, circle test)
//! - **Parameters**: rectangle, aspect ratio, quality and output options
//! - **Media**: media-type / file-name derivation and size formatting
//! - **Crop**: the engine itself

mod calculations;
pub mod crop;
pub mod media;
mod params;

pub use calculations::{PixelBounds, calculate_crop_area, pixel_bounds};
pub use crop::{
    CropError, CropInput, DEFAULT_COMPRESS_QUALITY, compress, crop, image_dimensions,
};
pub use media::{format_file_size, media_type_for_path};
pub use params::{AspectRatio, CropOptions, PixelRect, Quality};
