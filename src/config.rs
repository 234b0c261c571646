//! Uploader configuration.
//!
//! Handles loading, validating, and merging `uploader.toml`. Stock defaults
//! are overridden by whatever the file specifies; the file only needs the keys
//! it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! max_file_size = 5          # Per-file ceiling in MB
//! max_files = 1              # Collection ceiling; the drop target closes at this count
//! accepted_types = ["image/jpeg", "image/png", "image/webp"]
//! edit_mode = false          # Allow the edit action on initial images
//! disabled = false           # Ignore all selection input
//!
//! [upload]
//! # url = "https://example.com/upload"   # No url = no upload path
//! field_name = "image"       # Multipart field name
//! strategy = "single-request"            # or "multiple-requests"
//!
//! [crop]
//! enabled = false            # Route selections through the crop step
//! aspect_ratio = "free"      # "free" or width/height, e.g. 1.5
//! circular = false           # Mask output to the inscribed circle
//! jpeg_quality = 92          # JPEG quality for crop output (1-100)
//! # output_size = [400, 400] # Scale crops to an exact size
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{AspectRatio, CropOptions, Quality};
use crate::upload::{DispatchOptions, UploadStrategy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name looked up by the CLI.
pub const CONFIG_FILENAME: &str = "uploader.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Uploader configuration loaded from `uploader.toml`.
///
/// All fields have defaults matching the widget's stock behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploaderConfig {
    /// Per-file size ceiling in megabytes.
    pub max_file_size: f64,
    /// Maximum number of entries in the collection.
    pub max_files: usize,
    /// Media types accepted by the validator.
    pub accepted_types: Vec<String>,
    /// When false, entries that came from initial images cannot be re-cropped.
    pub edit_mode: bool,
    /// Suppress all selection input.
    pub disabled: bool,
    /// Upload endpoint and batching.
    pub upload: UploadConfig,
    /// Crop step settings.
    pub crop: CropConfig,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            max_file_size: 5.0,
            max_files: 1,
            accepted_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
            edit_mode: false,
            disabled: false,
            upload: UploadConfig::default(),
            crop: CropConfig::default(),
        }
    }
}

impl UploaderConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_file_size.is_finite() || self.max_file_size <= 0.0 {
            return Err(ConfigError::Validation(
                "max_file_size must be a positive number".into(),
            ));
        }
        if self.max_files == 0 {
            return Err(ConfigError::Validation("max_files must be at least 1".into()));
        }
        if self.accepted_types.is_empty() {
            return Err(ConfigError::Validation(
                "accepted_types must not be empty".into(),
            ));
        }
        if self.upload.url.as_deref().is_some_and(|u| u.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "upload.url must not be empty when set".into(),
            ));
        }
        if self.upload.field_name.is_empty() {
            return Err(ConfigError::Validation(
                "upload.field_name must not be empty".into(),
            ));
        }
        if let AspectRatio::Ratio(r) = self.crop.aspect_ratio {
            if !r.is_finite() || r <= 0.0 {
                return Err(ConfigError::Validation(
                    "crop.aspect_ratio must be \"free\" or a positive number".into(),
                ));
            }
        }
        if self.crop.output_size.is_some_and(|[w, h]| w == 0 || h == 0) {
            return Err(ConfigError::Validation(
                "crop.output_size values must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.crop.jpeg_quality) {
            return Err(ConfigError::Validation(
                "crop.jpeg_quality must be 1-100".into(),
            ));
        }
        Ok(())
    }

    /// Options handed to the crop engine.
    pub fn crop_options(&self) -> CropOptions {
        CropOptions {
            output_size: self.crop.output_size.map(|[w, h]| (w, h)),
            circular: self.crop.circular,
            quality: Quality::new(self.crop.jpeg_quality),
        }
    }

    /// Options handed to the upload dispatcher.
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            field_name: self.upload.field_name.clone(),
            strategy: self.upload.strategy,
        }
    }
}

/// Upload endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Endpoint receiving the multipart POST. Absent disables uploading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Multipart field name, repeated when several files share a request.
    pub field_name: String,
    /// One request for all files, or one request per file.
    pub strategy: UploadStrategy,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            url: None,
            field_name: "image".to_string(),
            strategy: UploadStrategy::SingleRequest,
        }
    }
}

/// Crop step settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    /// Send each selection through the crop step before it joins the collection.
    pub enabled: bool,
    /// Ratio handed to the selection UI.
    pub aspect_ratio: AspectRatio,
    /// Make pixels outside the inscribed circle transparent.
    pub circular: bool,
    /// JPEG encode quality for crop output.
    pub jpeg_quality: u8,
    /// Scale crops to exactly `[width, height]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_size: Option<[u32; 2]>,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            aspect_ratio: AspectRatio::Free,
            circular: false,
            jpeg_quality: Quality::default().value(),
            output_size: None,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(UploaderConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<UploaderConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: UploaderConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the file at `path`, falling back to stock defaults when
/// the file is missing.
pub fn load_config(path: &Path) -> Result<UploaderConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_none() {
        tracing::debug!(path = %path.display(), "no config file; using defaults");
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `uploader.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Image Uploader Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Per-file size ceiling in megabytes.
max_file_size = 5

# Maximum number of images in the collection. The drop target closes once
# this many images are present.
max_files = 1

# Media types accepted by validation.
accepted_types = ["image/jpeg", "image/png", "image/webp"]

# Allow the edit (re-crop) action on images supplied as initial images.
edit_mode = false

# Ignore all selection and drag input.
disabled = false

# ---------------------------------------------------------------------------
# Upload
# ---------------------------------------------------------------------------
[upload]
# Endpoint receiving the multipart POST. Without a url nothing is uploaded.
# url = "https://example.com/upload"

# Multipart field name. Repeated when several files share one request.
field_name = "image"

# "single-request": all files in one request.
# "multiple-requests": one request per file, sent one after another.
strategy = "single-request"

# ---------------------------------------------------------------------------
# Crop
# ---------------------------------------------------------------------------
[crop]
# Send each selection through the crop step before it joins the collection.
enabled = false

# "free" or a width/height ratio such as 1 (square) or 1.5 (3:2).
aspect_ratio = "free"

# Make pixels outside the inscribed circle transparent.
circular = false

# JPEG quality for crop output (1-100).
jpeg_quality = 92

# Scale every crop to exactly [width, height].
# output_size = [400, 400]
"##
}
