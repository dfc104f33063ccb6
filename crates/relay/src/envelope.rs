use crate::token::TokenSource;
use access_point::{UpstreamReply, ValidationResponse};
use chrono::Utc;
use config::Mode;
use serde::Serialize;
use serde_json::{json, Map, Value};

pub const SUCCESS_MESSAGE: &str = "Invoice submitted successfully";
pub const REJECTED_MESSAGE: &str = "Invoice validation failed";
pub const CONNECTION_FAILED_MESSAGE: &str = "Failed to connect to FBR server";
pub const NOT_SENT_MESSAGE: &str = "Invoice was not sent to FBR server";

/// Keys owned by the envelope. Upstream fields with these names are dropped.
const ENVELOPE_KEYS: [&str; 4] = ["success", "message", "mode", "tokenUsed"];

/// Normalized answer returned to the caller for every submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_used: Option<TokenSource>,
    #[serde(flatten)]
    pub upstream: UpstreamReply,
}

impl Envelope {
    /// Wrap a parsed upstream reply. Success iff statusCode is "00".
    /// A top-level upstream `error` is carried as the envelope's `error`.
    pub fn from_reply(mode: Mode, token_used: TokenSource, mut upstream: UpstreamReply) -> Self {
        let error = upstream.extra.remove("error");
        for key in ENVELOPE_KEYS {
            if upstream.extra.remove(key).is_some() {
                tracing::debug!(field = key, "Dropped upstream field shadowed by envelope");
            }
        }

        let success = upstream.is_valid();
        let message = if success {
            SUCCESS_MESSAGE
        } else {
            REJECTED_MESSAGE
        };
        Self {
            success,
            message: message.to_string(),
            error,
            mode,
            token_used: Some(token_used),
            upstream,
        }
    }

    /// The upstream could not be reached or its body was not JSON.
    pub fn connection_failed(
        mode: Mode,
        token_used: Option<TokenSource>,
        error: impl Into<String>,
    ) -> Self {
        Self::synthesized(mode, token_used, CONNECTION_FAILED_MESSAGE, error.into())
    }

    /// The request was refused before any upstream call was attempted.
    pub fn not_sent(mode: Mode, error: impl Into<String>) -> Self {
        Self::synthesized(mode, None, NOT_SENT_MESSAGE, error.into())
    }

    /// Shaped like the upstream's own rejections.
    fn synthesized(
        mode: Mode,
        token_used: Option<TokenSource>,
        message: &str,
        error: String,
    ) -> Self {
        let mut validation_extra = Map::new();
        validation_extra.insert("invoiceStatuses".to_string(), Value::Null);

        Self {
            success: false,
            message: message.to_string(),
            error: Some(Value::String(error)),
            mode,
            token_used,
            upstream: UpstreamReply {
                validation_response: Some(ValidationResponse {
                    status_code: Some(json!("01")),
                    status: Some(json!("Invalid")),
                    error: Some(json!(message)),
                    extra: validation_extra,
                }),
                invoice_number: None,
                dated: Some(json!(dated_now())),
                extra: Map::new(),
            },
        }
    }
}

/// Current UTC time as `YYYY-MM-DD HH:MM:SS`.
fn dated_now() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
