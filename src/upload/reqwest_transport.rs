//! [`Transport`] over HTTP with `reqwest`.
//!
//! Multipart parts carry the payload's file name and, when declared, its
//! media type. No retries and no timeouts: a hung request stays pending.

use super::transport::{FormPart, Transport, TransportError, TransportResponse};
use reqwest::multipart::{Form, Part};

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxies, default headers, TLS roots).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn build_form(parts: Vec<FormPart>) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for FormPart { field, payload } in parts {
        let mut part = Part::bytes(payload.bytes.to_vec()).file_name(payload.name.clone());
        if !payload.media_type.is_empty() {
            part = part.mime_str(&payload.media_type).map_err(|e| {
                TransportError::Request(format!(
                    "invalid media type '{}' for {}: {e}",
                    payload.media_type, payload.name
                ))
            })?;
        }
        form = form.part(field, part);
    }
    Ok(form)
}

impl Transport for ReqwestTransport {
    async fn submit(
        &self,
        endpoint: &str,
        parts: Vec<FormPart>,
    ) -> Result<TransportResponse, TransportError> {
        let form = build_form(parts)?;
        tracing::debug!(%endpoint, "submitting multipart form");

        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        tracing::debug!(%endpoint, status, size = body.len(), "upload response");
        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImagePayload;

    #[test]
    fn form_accepts_declared_and_missing_media_types() {
        let parts = vec![
            FormPart {
                field: "image".into(),
                payload: ImagePayload::new("a.png", "image/png", vec![1, 2]),
            },
            FormPart {
                field: "image".into(),
                payload: ImagePayload::new("b.bin", "", vec![3]),
            },
        ];
        assert!(build_form(parts).is_ok());
    }

    #[test]
    fn form_rejects_malformed_media_type() {
        let parts = vec![FormPart {
            field: "image".into(),
            payload: ImagePayload::new("a.png", "not a mime", vec![1]),
        }];
        assert!(matches!(
            build_form(parts),
            Err(TransportError::Request(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_error() {
        let transport = ReqwestTransport::new();
        // Port 9 (discard) on localhost is closed in test environments.
        let result = transport.submit("http://127.0.0.1:9/upload", Vec::new()).await;
        assert!(matches!(result, Err(TransportError::Network(_))));
    }
}
