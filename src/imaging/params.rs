//! Parameter types for crop operations.
//!
//! These describe *what* to cut and how to encode it. The pixel work lives in
//! [`crop`](super::crop).
//!
//! - [`PixelRect`] — the rectangle returned by the crop-selection UI, in source pixels.
//! - [`AspectRatio`] — `free` or a numeric width/height ratio. Serialised as `"free"` or a number.
//! - [`Quality`] — JPEG encode quality (1–100, default 92). Clamped on construction.
//! - [`CropOptions`] — output size, circular mask and quality for one crop.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Axis-aligned rectangle in source-image pixel coordinates.
///
/// Fractional values are accepted (selection UIs report them) and rounded to
/// whole pixels when the crop runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Crop aspect ratio handed to the selection UI.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AspectRatio {
    #[default]
    Free,
    /// Width divided by height.
    Ratio(f64),
}

impl Serialize for AspectRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AspectRatio::Free => serializer.serialize_str("free"),
            AspectRatio::Ratio(r) => serializer.serialize_f64(*r),
        }
    }
}

impl<'de> Deserialize<'de> for AspectRatio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Keyword(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(r) => Ok(AspectRatio::Ratio(r)),
            Raw::Keyword(k) if k == "free" => Ok(AspectRatio::Free),
            Raw::Keyword(k) => Err(serde::de::Error::custom(format!(
                "expected \"free\" or a number, got \"{k}\""
            ))),
        }
    }
}

/// Quality setting for lossy encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    /// Matches the browser canvas default of 0.92.
    fn default() -> Self {
        Self(92)
    }
}

/// Output settings for a single crop.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CropOptions {
    /// Scale the cropped region to exactly this `(width, height)`.
    /// `None` keeps the region at 1:1.
    pub output_size: Option<(u32, u32)>,
    /// Make pixels outside the inscribed circle transparent.
    pub circular: bool,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    struct Holder {
        aspect: AspectRatio,
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(250).value(), 100);
        assert_eq!(Quality::default().value(), 92);
    }

    #[test]
    fn aspect_ratio_parses_keyword_and_numbers() {
        let free: Holder = toml::from_str(r#"aspect = "free""#).unwrap();
        assert_eq!(free.aspect, AspectRatio::Free);

        let float: Holder = toml::from_str("aspect = 1.5").unwrap();
        assert_eq!(float.aspect, AspectRatio::Ratio(1.5));

        let int: Holder = toml::from_str("aspect = 1").unwrap();
        assert_eq!(int.aspect, AspectRatio::Ratio(1.0));
    }

    #[test]
    fn aspect_ratio_rejects_other_keywords() {
        let result: Result<Holder, _> = toml::from_str(r#"aspect = "square""#);
        assert!(result.is_err());
    }

    #[test]
    fn aspect_ratio_serializes_back() {
        let json = serde_json::to_string(&Holder {
            aspect: AspectRatio::Free,
        })
        .unwrap();
        assert_eq!(json, r#"{"aspect":"free"}"#);

        let json = serde_json::to_string(&Holder {
            aspect: AspectRatio::Ratio(0.8),
        })
        .unwrap();
        assert_eq!(json, r#"{"aspect":0.8}"#);
    }
}
