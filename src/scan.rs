//! File intake for the command line.
//!
//! Turns path arguments into [`ImagePayload`]s the way a browser file picker
//! would: the declared media type comes from the file extension, never from
//! the bytes.
//!
//! - Files named explicitly are always taken, even with an unknown
//!   extension, so validation can report them.
//! - Directories are walked recursively in name order and only files with
//!   a readable image extension are kept.

use crate::imaging::media_type_for_path;
use crate::types::ImagePayload;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Media type declared for files whose extension is not an image type.
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Path not found: {0}")]
    NotFound(PathBuf),
}

/// Expand `paths` into a flat, ordered file list.
pub fn collect_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>, ScanError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() && is_image(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else {
            return Err(ScanError::NotFound(path.clone()));
        }
    }
    Ok(files)
}

/// Read one file into a payload.
pub fn load_payload(path: &Path) -> Result<ImagePayload, ScanError> {
    let bytes = fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let media_type = media_type_for_path(path).unwrap_or(UNKNOWN_MEDIA_TYPE);
    tracing::debug!(path = %path.display(), %media_type, size = bytes.len(), "loaded file");
    Ok(ImagePayload::new(name, media_type, bytes))
}

/// [`collect_paths`] followed by [`load_payload`] for every file.
pub fn load_payloads(paths: &[PathBuf]) -> Result<Vec<ImagePayload>, ScanError> {
    collect_paths(paths)?
        .iter()
        .map(|p| load_payload(p))
        .collect()
}

fn is_image(path: &Path) -> bool {
    media_type_for_path(path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.png"), [1, 2, 3]).unwrap();
        fs::write(tmp.path().join("a.jpg"), [4, 5]).unwrap();
        fs::write(tmp.path().join("notes.txt"), "hello").unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("nested/c.webp"), [6]).unwrap();
        tmp
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn directory_walk_keeps_images_in_name_order() {
        let tmp = setup();
        let files = collect_paths(&[tmp.path().to_path_buf()]).unwrap();
        assert_eq!(names(&files), vec!["a.jpg", "b.png", "c.webp"]);
    }

    #[test]
    fn explicit_files_are_kept_regardless_of_extension() {
        let tmp = setup();
        let files = collect_paths(&[
            tmp.path().join("notes.txt"),
            tmp.path().join("b.png"),
        ])
        .unwrap();
        assert_eq!(names(&files), vec!["notes.txt", "b.png"]);
    }

    #[test]
    fn missing_path_is_error() {
        let tmp = setup();
        let result = collect_paths(&[tmp.path().join("nope.png")]);
        assert!(matches!(result, Err(ScanError::NotFound(_))));
    }

    #[test]
    fn payload_media_type_comes_from_extension() {
        let tmp = setup();
        let png = load_payload(&tmp.path().join("b.png")).unwrap();
        assert_eq!(png.name, "b.png");
        assert_eq!(png.media_type, "image/png");
        assert_eq!(png.size(), 3);

        let txt = load_payload(&tmp.path().join("notes.txt")).unwrap();
        assert_eq!(txt.media_type, UNKNOWN_MEDIA_TYPE);
    }

    #[test]
    fn load_payloads_reads_everything() {
        let tmp = setup();
        let payloads = load_payloads(&[tmp.path().join("nested")]).unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].media_type, "image/webp");
    }
}
