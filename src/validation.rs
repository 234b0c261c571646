//! Client-side checks applied to candidate files before they enter the
//! collection.
//!
//! Both entry points are pure. [`validate_batch`] short-circuits on a count
//! overflow: the whole batch is rejected with a single error and no per-file
//! checks run. Otherwise each file contributes at most one error, size
//! before type.

use crate::types::ImagePayload;
use thiserror::Error;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("File size exceeds {limit_mb}MB limit")]
    TooLarge { limit_mb: f64 },
    #[error("File type not supported. Accepted types: {}", accepted.join(", "))]
    UnsupportedType { accepted: Vec<String> },
    #[error("Maximum {max} files allowed")]
    TooMany { max: usize },
}

/// Check one file against the size ceiling and the media-type allow-list.
pub fn validate_one(
    file: &ImagePayload,
    max_size_mb: f64,
    accepted_types: &[String],
) -> Option<ValidationError> {
    let size_mb = file.size() as f64 / BYTES_PER_MB;
    if size_mb > max_size_mb {
        return Some(ValidationError::TooLarge {
            limit_mb: max_size_mb,
        });
    }

    if !accepted_types.iter().any(|t| t == &file.media_type) {
        return Some(ValidationError::UnsupportedType {
            accepted: accepted_types.to_vec(),
        });
    }

    None
}

/// Check a batch of new files against the collection they would join.
pub fn validate_batch(
    new_files: &[ImagePayload],
    existing_count: usize,
    max_count: usize,
    max_size_mb: f64,
    accepted_types: &[String],
) -> Vec<ValidationError> {
    if existing_count + new_files.len() > max_count {
        return vec![ValidationError::TooMany { max: max_count }];
    }

    new_files
        .iter()
        .filter_map(|f| validate_one(f, max_size_mb, accepted_types))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted() -> Vec<String> {
        vec![
            "image/jpeg".to_string(),
            "image/png".to_string(),
            "image/webp".to_string(),
        ]
    }

    fn file(name: &str, media_type: &str, size: usize) -> ImagePayload {
        ImagePayload::new(name, media_type, vec![0u8; size])
    }

    #[test]
    fn accepts_file_within_limits() {
        assert_eq!(
            validate_one(&file("a.jpg", "image/jpeg", 1024), 5.0, &accepted()),
            None
        );
    }

    #[test]
    fn size_exactly_at_limit_is_accepted() {
        let f = file("a.jpg", "image/jpeg", 1024 * 1024);
        assert_eq!(validate_one(&f, 1.0, &accepted()), None);
    }

    #[test]
    fn oversized_file_names_the_limit() {
        let f = file("big.jpg", "image/jpeg", 2 * 1024 * 1024 + 1);
        let err = validate_one(&f, 2.0, &accepted()).unwrap();
        assert_eq!(err, ValidationError::TooLarge { limit_mb: 2.0 });
        assert_eq!(err.to_string(), "File size exceeds 2MB limit");
    }

    #[test]
    fn fractional_limit_is_rendered_verbatim() {
        let f = file("big.jpg", "image/jpeg", 1024 * 1024);
        let err = validate_one(&f, 0.5, &accepted()).unwrap();
        assert_eq!(err.to_string(), "File size exceeds 0.5MB limit");
    }

    #[test]
    fn unsupported_type_lists_every_accepted_type() {
        let f = file("doc.pdf", "application/pdf", 10);
        let err = validate_one(&f, 5.0, &accepted()).unwrap();
        assert_eq!(
            err.to_string(),
            "File type not supported. Accepted types: image/jpeg, image/png, image/webp"
        );
    }

    #[test]
    fn size_is_checked_before_type() {
        let f = file("doc.pdf", "application/pdf", 3 * 1024 * 1024);
        assert!(matches!(
            validate_one(&f, 1.0, &accepted()),
            Some(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn batch_count_overflow_is_a_single_error() {
        // Both files are also invalid on their own; the count error wins.
        let files = vec![
            file("a.pdf", "application/pdf", 10),
            file("b.pdf", "application/pdf", 10),
        ];
        let errors = validate_batch(&files, 2, 3, 5.0, &accepted());
        assert_eq!(errors, vec![ValidationError::TooMany { max: 3 }]);
        assert_eq!(errors[0].to_string(), "Maximum 3 files allowed");
    }

    #[test]
    fn batch_filling_exactly_to_max_is_accepted() {
        let files = vec![file("a.jpg", "image/jpeg", 10)];
        assert!(validate_batch(&files, 2, 3, 5.0, &accepted()).is_empty());
    }

    #[test]
    fn batch_reports_one_error_per_invalid_file() {
        let files = vec![
            file("ok.jpg", "image/jpeg", 10),
            file("big.png", "image/png", 6 * 1024 * 1024),
            file("doc.gif", "image/gif", 10),
        ];
        let errors = validate_batch(&files, 0, 5, 5.0, &accepted());
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ValidationError::TooLarge { .. }));
        assert!(matches!(errors[1], ValidationError::UnsupportedType { .. }));
    }
}
