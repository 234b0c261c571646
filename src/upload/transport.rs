//! Network seam for the upload dispatcher and the crop engine's URL loader.
//!
//! The [`Transport`] trait defines the two calls the uploader needs: submit a
//! multipart form, and fetch the bytes behind a URL. The production
//! implementation is [`ReqwestTransport`](super::reqwest_transport::ReqwestTransport);
//! tests use a recording mock.

use crate::types::ImagePayload;
use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid request: {0}")]
    Request(String),
    #[error("server responded with status {0}")]
    Status(u16),
}

/// One file in a multipart submission.
#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub field: String,
    pub payload: ImagePayload,
}

/// Raw response: status plus undecoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for network transports.
pub trait Transport {
    /// POST `parts` as a multipart form to `endpoint`.
    ///
    /// Non-success statuses are returned as responses, not errors; only
    /// failures to complete the exchange are `Err`.
    fn submit(
        &self,
        endpoint: &str,
        parts: Vec<FormPart>,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;

    /// GET the bytes at `url`. Non-success statuses are errors here.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// A submission as seen by [`MockTransport`]: endpoint plus
    /// `(field, file name)` for every part.
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedRequest {
        pub endpoint: String,
        pub parts: Vec<(String, String)>,
    }

    /// Transport that replays queued responses and records every request.
    /// Uses Mutex (not RefCell) so the futures it returns are Send.
    #[derive(Default)]
    pub struct MockTransport {
        pub responses: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
        pub remote: Mutex<HashMap<String, Vec<u8>>>,
        pub requests: Mutex<Vec<RecordedRequest>>,
        pub fetched: Mutex<Vec<String>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_responses(
            responses: Vec<Result<TransportResponse, TransportError>>,
        ) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Self::default()
            }
        }

        pub fn with_remote(url: &str, bytes: Vec<u8>) -> Self {
            let mock = Self::default();
            mock.remote.lock().unwrap().insert(url.to_string(), bytes);
            mock
        }

        pub fn get_requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn get_fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    /// A response with `status` and a JSON body.
    pub fn json_response(status: u16, body: &str) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse {
            status,
            body: body.as_bytes().to_vec(),
        })
    }

    impl Transport for MockTransport {
        async fn submit(
            &self,
            endpoint: &str,
            parts: Vec<FormPart>,
        ) -> Result<TransportResponse, TransportError> {
            self.requests.lock().unwrap().push(RecordedRequest {
                endpoint: endpoint.to_string(),
                parts: parts
                    .iter()
                    .map(|p| (p.field.clone(), p.payload.name.clone()))
                    .collect(),
            });

            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| json_response(200, "{}"))
        }

        async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
            self.fetched.lock().unwrap().push(url.to_string());
            self.remote
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or(TransportError::Status(404))
        }
    }

    #[test]
    fn success_range_is_2xx() {
        let ok = TransportResponse {
            status: 204,
            body: Vec::new(),
        };
        let redirect = TransportResponse {
            status: 302,
            body: Vec::new(),
        };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
    }

    #[tokio::test]
    async fn mock_records_submissions_in_order() {
        let mock = MockTransport::with_responses(vec![json_response(201, r#"{"id":1}"#)]);
        let part = FormPart {
            field: "image".into(),
            payload: ImagePayload::new("a.png", "image/png", vec![1]),
        };

        let first = mock.submit("/upload", vec![part.clone()]).await.unwrap();
        let second = mock.submit("/upload", vec![part]).await.unwrap();

        assert_eq!(first.status, 201);
        assert_eq!(second.status, 200);
        assert_eq!(
            mock.get_requests()[0],
            RecordedRequest {
                endpoint: "/upload".into(),
                parts: vec![("image".into(), "a.png".into())],
            }
        );
    }

    #[tokio::test]
    async fn mock_fetch_misses_are_404() {
        let mock = MockTransport::with_remote("https://cdn.test/a.png", vec![9]);
        assert_eq!(mock.fetch("https://cdn.test/a.png").await.unwrap(), vec![9]);
        assert_eq!(
            mock.fetch("https://cdn.test/b.png").await,
            Err(TransportError::Status(404))
        );
    }
}
