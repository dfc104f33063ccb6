use super::{InvoiceAuthorityClient, UpstreamError, UpstreamReply};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Client for the FBR digital invoicing "post invoice data" endpoint.
///
/// One instance serves one deployment mode; the endpoint is fixed at
/// construction. No retries: every call makes exactly one request.
#[derive(Clone)]
pub struct FbrClient {
    endpoint: Option<String>,
    http_client: reqwest::Client,
}

impl FbrClient {
    pub fn new(
        endpoint: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Arc<Self>, UpstreamError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(UpstreamError::Transport)?;

        Ok(Arc::new(Self {
            endpoint,
            http_client,
        }))
    }
}

#[async_trait]
impl InvoiceAuthorityClient for FbrClient {
    async fn post_invoice(
        &self,
        payload: &Map<String, Value>,
        token: &str,
    ) -> Result<UpstreamReply, UpstreamError> {
        let endpoint = self.endpoint.as_deref().ok_or(UpstreamError::NotConfigured)?;

        let resp = self
            .http_client
            .post(endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        // Rejections come back with non-2xx codes too; the body decides.
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(UpstreamError::Transport)?;

        let body: Value = serde_json::from_slice(&body)
            .map_err(|source| UpstreamError::InvalidBody { status, source })?;
        if !body.is_object() {
            tracing::debug!(http_status = status, "Invoice Authority API replied with a non-object body");
        }
        let reply = UpstreamReply::from_body(body);

        tracing::debug!(
            http_status = status,
            status_code = reply.status_code().unwrap_or("<missing>"),
            "Invoice Authority API replied"
        );

        Ok(reply)
    }

    fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}
