//! Upload batching.
//!
//! [`dispatch`] turns a list of files into one or more multipart submissions
//! according to [`UploadStrategy`]:
//!
//! - **single-request**: every file in one form under the same field name.
//!   Progress is reported once: 100 on success, 0 on failure.
//! - **multiple-requests** (more than one file): one form per file, issued
//!   strictly in order. Progress `done / total * 100` is reported before each
//!   request and 100 after the last. The first failure stops the run and
//!   names the file's 1-based position. Requests that already succeeded are
//!   not rolled back.
//!
//! Response bodies are decoded as generic JSON; an empty body is `null`.

use super::transport::{FormPart, Transport, TransportError, TransportResponse};
use crate::types::ImagePayload;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadStrategy {
    #[default]
    SingleRequest,
    MultipleRequests,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    pub field_name: String,
    pub strategy: UploadStrategy,
}

/// Decoded response bodies: one for a single request, one per file otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UploadResponse {
    Single(Value),
    Multiple(Vec<Value>),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("No files to upload")]
    NoFiles,
    #[error("Upload failed with status {status}")]
    Status { status: u16 },
    #[error("Upload failed for file {position} with status {status}")]
    FileStatus { position: usize, status: u16 },
    #[error("Upload failed: {0}")]
    Transport(TransportError),
    #[error("Upload failed for file {position}: {source}")]
    FileTransport {
        position: usize,
        source: TransportError,
    },
    #[error("Upload response is not valid JSON: {0}")]
    Decode(String),
}

impl UploadError {
    /// HTTP status behind the failure, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            UploadError::Status { status } | UploadError::FileStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// 1-based position of the failing file in a multiple-request run.
    pub fn position(&self) -> Option<usize> {
        match self {
            UploadError::FileStatus { position, .. }
            | UploadError::FileTransport { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Submit `files` to `endpoint`. See the [module docs](self) for the
/// strategy and progress contract.
#[tracing::instrument(
    skip(transport, files, options, on_progress),
    fields(count = files.len(), strategy = ?options.strategy)
)]
pub async fn dispatch<T: Transport>(
    transport: &T,
    files: &[ImagePayload],
    endpoint: &str,
    options: &DispatchOptions,
    on_progress: &mut dyn FnMut(u8),
) -> Result<UploadResponse, UploadError> {
    if files.is_empty() {
        return Err(UploadError::NoFiles);
    }

    if options.strategy == UploadStrategy::MultipleRequests && files.len() > 1 {
        return dispatch_each(transport, files, endpoint, options, on_progress).await;
    }

    tracing::info!(%endpoint, files = files.len(), "uploading in a single request");
    let parts = files
        .iter()
        .map(|f| FormPart {
            field: options.field_name.clone(),
            payload: f.clone(),
        })
        .collect();

    let result = match transport.submit(endpoint, parts).await {
        Ok(response) if response.is_success() => decode_body(&response),
        Ok(response) => Err(UploadError::Status {
            status: response.status,
        }),
        Err(e) => Err(UploadError::Transport(e)),
    };

    match result {
        Ok(body) => {
            on_progress(100);
            Ok(UploadResponse::Single(body))
        }
        Err(e) => {
            tracing::warn!(%endpoint, error = %e, "upload failed");
            on_progress(0);
            Err(e)
        }
    }
}

async fn dispatch_each<T: Transport>(
    transport: &T,
    files: &[ImagePayload],
    endpoint: &str,
    options: &DispatchOptions,
    on_progress: &mut dyn FnMut(u8),
) -> Result<UploadResponse, UploadError> {
    let total = files.len();
    let mut bodies = Vec::with_capacity(total);
    tracing::info!(%endpoint, files = total, "uploading one request per file");

    for (index, file) in files.iter().enumerate() {
        on_progress(percent(index, total));
        let position = index + 1;
        let part = FormPart {
            field: options.field_name.clone(),
            payload: file.clone(),
        };

        let result = match transport.submit(endpoint, vec![part]).await {
            Ok(response) if response.is_success() => decode_body(&response),
            Ok(response) => Err(UploadError::FileStatus {
                position,
                status: response.status,
            }),
            Err(source) => Err(UploadError::FileTransport { position, source }),
        };

        match result {
            Ok(body) => {
                tracing::debug!(position, name = %file.name, "file uploaded");
                bodies.push(body);
            }
            Err(e) => {
                tracing::warn!(%endpoint, position, error = %e, "upload failed; skipping remaining files");
                on_progress(0);
                return Err(e);
            }
        }
    }

    on_progress(100);
    Ok(UploadResponse::Multiple(bodies))
}

fn percent(done: usize, total: usize) -> u8 {
    ((done * 100) / total) as u8
}

fn decode_body(response: &TransportResponse) -> Result<Value, UploadError> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&response.body).map_err(|e| UploadError::Decode(e.to_string()))
}
