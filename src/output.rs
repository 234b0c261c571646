//! CLI output formatting for all commands.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! 001 dawn.jpg (1.5 MB, image/jpeg)
//!     OK
//! 002 scan.tiff (12 MB, image/tiff)
//!     File size exceeds 5MB limit
//!
//! 2 files checked, 1 rejected
//! ```
//!
//! ## Crop
//!
//! ```text
//! dawn.jpg → dawn-cropped.jpg
//!     Region: 100x100 at (10, 10)
//!     Output: 100x100 image/jpeg, 12.3 KB
//! ```
//!
//! ## Compress
//!
//! ```text
//! dawn.png → dawn.jpg
//!     Quality: 80
//!     Size: 1.5 MB → 310 KB
//! ```
//!
//! ## Upload
//!
//! ```text
//! Upload: 50%
//! Upload: 100%
//! 001 dawn.jpg (uploaded)
//!     Preview: blob:image-uploader/1
//! Response:
//! {
//!   "id": "123"
//! }
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects. [`ConsoleHooks`] is the
//! host side of a headless uploader and prints as events arrive.

use crate::imaging::{PixelRect, Quality, format_file_size};
use crate::types::{FileEntry, ImagePayload, ImageSource};
use crate::upload::UploadResponse;
use crate::uploader::UploaderHooks;
use crate::validation::ValidationError;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Final path component, or the whole path when there is none.
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `001 name (size, type)`
fn payload_header(index: usize, payload: &ImagePayload) -> String {
    format!(
        "{} {} ({}, {})",
        format_index(index),
        payload.name,
        format_file_size(payload.size()),
        payload.media_type
    )
}

// ============================================================================
// Check
// ============================================================================

/// Verdict for one checked file.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub payload: ImagePayload,
    pub error: Option<ValidationError>,
}

/// Per-file verdicts, then a summary. `count_error` is the batch-level
/// error when the file count exceeds the collection size.
pub fn format_check_results(
    results: &[CheckResult],
    count_error: Option<&ValidationError>,
) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, result) in results.iter().enumerate() {
        lines.push(payload_header(i + 1, &result.payload));
        let verdict = match &result.error {
            Some(e) => e.to_string(),
            None => "OK".to_string(),
        };
        lines.push(format!("{}{}", indent(1), verdict));
    }

    let rejected = results.iter().filter(|r| r.error.is_some()).count();
    lines.push(String::new());
    lines.push(format!(
        "{} {} checked, {} rejected",
        results.len(),
        plural(results.len(), "file"),
        rejected
    ));
    if let Some(e) = count_error {
        lines.push(e.to_string());
    }
    lines
}

pub fn print_check_results(results: &[CheckResult], count_error: Option<&ValidationError>) {
    for line in format_check_results(results, count_error) {
        println!("{}", line);
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

// ============================================================================
// Crop
// ============================================================================

pub fn format_crop_result(
    source: &Path,
    destination: &Path,
    rect: &PixelRect,
    output: &ImagePayload,
    dimensions: (u32, u32),
) -> Vec<String> {
    vec![
        format!("{} → {}", file_name(source), file_name(destination)),
        format!(
            "{}Region: {}x{} at ({}, {})",
            indent(1),
            rect.width.round(),
            rect.height.round(),
            rect.x.round(),
            rect.y.round()
        ),
        format!(
            "{}Output: {}x{} {}, {}",
            indent(1),
            dimensions.0,
            dimensions.1,
            output.media_type,
            format_file_size(output.size())
        ),
    ]
}

pub fn print_crop_result(
    source: &Path,
    destination: &Path,
    rect: &PixelRect,
    output: &ImagePayload,
    dimensions: (u32, u32),
) {
    for line in format_crop_result(source, destination, rect, output, dimensions) {
        println!("{}", line);
    }
}

// ============================================================================
// Compress
// ============================================================================

pub fn format_compress_result(
    source: &Path,
    destination: &Path,
    original: &ImagePayload,
    compressed: &ImagePayload,
    quality: Quality,
) -> Vec<String> {
    vec![
        format!("{} → {}", file_name(source), file_name(destination)),
        format!("{}Quality: {}", indent(1), quality.value()),
        format!(
            "{}Size: {} → {}",
            indent(1),
            format_file_size(original.size()),
            format_file_size(compressed.size())
        ),
    ]
}

pub fn print_compress_result(
    source: &Path,
    destination: &Path,
    original: &ImagePayload,
    compressed: &ImagePayload,
    quality: Quality,
) {
    for line in format_compress_result(source, destination, original, compressed, quality) {
        println!("{}", line);
    }
}

// ============================================================================
// Upload
// ============================================================================

pub fn format_upload_progress(percent: u8) -> String {
    format!("Upload: {}%", percent)
}

/// One header per entry with its upload state and preview location.
pub fn format_entries(entries: &[FileEntry]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let mut state = vec![if entry.is_uploaded { "uploaded" } else { "pending" }];
        if entry.is_cropped {
            state.push("cropped");
        }
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            entry.source.display_name(),
            state.join(", ")
        ));
        lines.push(format!("{}Preview: {}", indent(1), entry.preview_url()));
    }
    lines
}

/// Pretty-printed response body, or a note when nothing was sent.
pub fn format_upload_response(response: Option<&UploadResponse>) -> Vec<String> {
    let Some(response) = response else {
        return vec!["Nothing to upload".to_string()];
    };
    let body = serde_json::to_string_pretty(response).unwrap_or_else(|e| e.to_string());
    std::iter::once("Response:".to_string())
        .chain(body.lines().map(str::to_string))
        .collect()
}

pub fn print_entries(entries: &[FileEntry]) {
    for line in format_entries(entries) {
        println!("{}", line);
    }
}

/// Hooks for a headless uploader driven from the terminal.
///
/// Progress and crop notices go to stdout as they happen, errors to
/// stderr. Errors and the final upload outcome are kept for the caller.
#[derive(Debug, Default)]
pub struct ConsoleHooks {
    pub errors: Vec<String>,
    pub completed: Option<Option<UploadResponse>>,
}

impl ConsoleHooks {
    /// How the run ended: the first error, or the response when the upload
    /// completed (`None` when every file was already uploaded).
    pub fn outcome(&self) -> Result<Option<&UploadResponse>, String> {
        if let Some(error) = self.errors.first() {
            return Err(error.clone());
        }
        match &self.completed {
            Some(response) => Ok(response.as_ref()),
            None => Err("upload did not complete".to_string()),
        }
    }
}

impl UploaderHooks for ConsoleHooks {
    fn error(&mut self, message: &str) {
        eprintln!("Error: {}", message);
        self.errors.push(message.to_string());
    }

    fn crop_completed(
        &mut self,
        cropped: &ImagePayload,
        _original: &ImageSource,
        _index: Option<usize>,
    ) {
        println!(
            "Cropped {} ({})",
            cropped.name,
            format_file_size(cropped.size())
        );
    }

    fn upload_progress(&mut self, percent: u8) {
        println!("{}", format_upload_progress(percent));
    }

    fn upload_complete(&mut self, _pending: &[ImagePayload], response: Option<&UploadResponse>) {
        for line in format_upload_response(response) {
            println!("{}", line);
        }
        self.completed = Some(response.cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EntryId, HandleId, Origin, Preview};
    use serde_json::json;
    use std::path::PathBuf;

    fn payload(name: &str, size: usize) -> ImagePayload {
        ImagePayload::new(name, "image/jpeg", vec![0u8; size])
    }

    #[test]
    fn format_index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn indent_is_four_spaces_per_level() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn check_output_lists_verdicts_and_summary() {
        let results = vec![
            CheckResult {
                payload: payload("dawn.jpg", 1536),
                error: None,
            },
            CheckResult {
                payload: payload("huge.jpg", 10),
                error: Some(ValidationError::TooLarge { limit_mb: 5.0 }),
            },
        ];
        let lines = format_check_results(&results, None);
        assert_eq!(
            lines,
            vec![
                "001 dawn.jpg (1.5 KB, image/jpeg)",
                "    OK",
                "002 huge.jpg (10 Bytes, image/jpeg)",
                "    File size exceeds 5MB limit",
                "",
                "2 files checked, 1 rejected",
            ]
        );
    }

    #[test]
    fn check_output_appends_count_error() {
        let results = vec![CheckResult {
            payload: payload("a.jpg", 1),
            error: None,
        }];
        let lines = format_check_results(&results, Some(&ValidationError::TooMany { max: 0 }));
        assert_eq!(lines[3], "1 file checked, 0 rejected");
        assert_eq!(lines.last().unwrap(), "Maximum 0 files allowed");
    }

    #[test]
    fn crop_output_shows_region_and_result() {
        let lines = format_crop_result(
            &PathBuf::from("in/dawn.jpg"),
            &PathBuf::from("out/dawn-cropped.jpg"),
            &PixelRect::new(10.0, 10.0, 100.0, 100.0),
            &payload("dawn.jpg", 2048),
            (100, 100),
        );
        assert_eq!(
            lines,
            vec![
                "dawn.jpg → dawn-cropped.jpg",
                "    Region: 100x100 at (10, 10)",
                "    Output: 100x100 image/jpeg, 2 KB",
            ]
        );
    }

    #[test]
    fn compress_output_shows_quality_and_sizes() {
        let lines = format_compress_result(
            &PathBuf::from("in/dawn.png"),
            &PathBuf::from("dawn.jpg"),
            &payload("dawn.png", 3072),
            &payload("dawn.png", 1024),
            Quality::new(70),
        );
        assert_eq!(
            lines,
            vec!["dawn.png → dawn.jpg", "    Quality: 70", "    Size: 3 KB → 1 KB"]
        );
    }

    #[test]
    fn entries_show_state_and_preview() {
        let entries = vec![
            FileEntry {
                id: EntryId(1),
                source: ImageSource::Payload(payload("a.jpg", 1)),
                preview: Preview::Tracked(HandleId(3)),
                origin: Origin::Cropped,
                is_cropped: true,
                is_uploaded: false,
            },
            FileEntry {
                id: EntryId(2),
                source: ImageSource::Remote("https://cdn.test/b.jpg".into()),
                preview: Preview::Remote("https://cdn.test/b.jpg".into()),
                origin: Origin::Initial,
                is_cropped: false,
                is_uploaded: true,
            },
        ];
        assert_eq!(
            format_entries(&entries),
            vec![
                "001 a.jpg (pending, cropped)",
                "    Preview: blob:image-uploader/3",
                "002 https://cdn.test/b.jpg (uploaded)",
                "    Preview: https://cdn.test/b.jpg",
            ]
        );
    }

    #[test]
    fn response_is_pretty_printed() {
        let response = UploadResponse::Single(json!({"id": "123"}));
        assert_eq!(
            format_upload_response(Some(&response)),
            vec!["Response:", "{", "  \"id\": \"123\"", "}"]
        );
        assert_eq!(format_upload_response(None), vec!["Nothing to upload"]);
    }

    #[test]
    fn multiple_responses_print_as_array() {
        let response = UploadResponse::Multiple(vec![json!(1), json!(2)]);
        let lines = format_upload_response(Some(&response));
        assert_eq!(lines, vec!["Response:", "[", "  1,", "  2", "]"]);
    }

    #[test]
    fn console_hooks_keep_outcome() {
        let mut hooks = ConsoleHooks::default();
        hooks.error("boom");
        hooks.upload_complete(&[], None);
        assert_eq!(hooks.errors, vec!["boom".to_string()]);
        assert_eq!(hooks.completed, Some(None));
    }

    #[test]
    fn outcome_prefers_errors_then_completion() {
        let mut hooks = ConsoleHooks::default();
        assert_eq!(hooks.outcome(), Err("upload did not complete".to_string()));

        hooks.upload_complete(&[], None);
        assert_eq!(hooks.outcome(), Ok(None));

        let response = UploadResponse::Single(json!({"id": 7}));
        hooks.upload_complete(&[], Some(&response));
        assert_eq!(hooks.outcome(), Ok(Some(&response)));

        hooks.error("Upload failed with status 500");
        assert_eq!(
            hooks.outcome(),
            Err("Upload failed with status 500".to_string())
        );
    }

    #[test]
    fn progress_line() {
        assert_eq!(format_upload_progress(50), "Upload: 50%");
    }
}
