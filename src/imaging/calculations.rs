//! Pure geometry for crop operations.
//!
//! Nothing here touches pixels, so all of it is unit tested directly.

use super::params::{AspectRatio, PixelRect};

/// Whole-pixel crop region derived from a [`PixelRect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Round a selection rectangle to whole pixels.
///
/// Returns `None` for non-finite values, or when after rounding the origin
/// is negative or the width or height is not strictly positive. Bounds are
/// not clamped to the image.
pub fn pixel_bounds(rect: &PixelRect) -> Option<PixelBounds> {
    let values = [rect.x, rect.y, rect.width, rect.height];
    if values.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let [x, y, width, height] = values.map(f64::round);
    if x < 0.0 || y < 0.0 || width < 1.0 || height < 1.0 {
        return None;
    }

    Some(PixelBounds {
        x: x as u32,
        y: y as u32,
        width: width as u32,
        height: height as u32,
    })
}

/// Default selection for an image of `width`×`height`.
///
/// `Free` selects the whole image. A ratio selects the largest centred
/// rectangle with that width/height ratio.
pub fn calculate_crop_area(width: u32, height: u32, aspect: AspectRatio) -> PixelRect {
    let (w, h) = (width as f64, height as f64);
    let ratio = match aspect {
        AspectRatio::Free => return PixelRect::new(0.0, 0.0, w, h),
        AspectRatio::Ratio(r) => r,
    };

    if w / h > ratio {
        // Wider than wanted: full height, trim the sides
        let crop_w = h * ratio;
        PixelRect::new((w - crop_w) / 2.0, 0.0, crop_w, h)
    } else {
        let crop_h = w / ratio;
        PixelRect::new(0.0, (h - crop_h) / 2.0, w, crop_h)
    }
}

/// Whether pixel `(x, y)` lies inside the circle inscribed in a
/// `width`×`height` canvas. Pixel centres are tested.
pub fn inside_circle(x: u32, y: u32, width: u32, height: u32) -> bool {
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;
    let radius = width.min(height) as f64 / 2.0;
    let dx = x as f64 + 0.5 - cx;
    let dy = y as f64 + 0.5 - cy;
    dx * dx + dy * dy <= radius * radius
}
