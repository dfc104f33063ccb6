use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub use fbr_types::{UpstreamReply, ValidationResponse, VALID_STATUS_CODE};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("no upstream endpoint configured")]
    NotConfigured,
    #[error("failed to reach Invoice Authority API: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Invoice Authority API returned a body that is not JSON (HTTP {status}): {source}")]
    InvalidBody {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Other(String),
}

/// One outbound call to the Invoice Authority API.
///
/// Implementations return the parsed reply whatever the HTTP status was; the
/// caller decides success from `validationResponse.statusCode`.
#[async_trait]
pub trait InvoiceAuthorityClient: Send + Sync {
    async fn post_invoice(
        &self,
        payload: &Map<String, Value>,
        token: &str,
    ) -> Result<UpstreamReply, UpstreamError>;

    fn endpoint(&self) -> Option<&str>;
}

pub mod fbr;
pub mod fbr_types;
pub mod mock;
