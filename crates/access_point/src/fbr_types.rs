//! Response shapes of the Invoice Authority API.
//!
//! Only the fields the relay reads are typed. Everything else is carried in
//! the `extra` maps so it can be passed back to the caller untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `validationResponse.statusCode` of an accepted invoice.
pub const VALID_STATUS_CODE: &str = "00";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_response: Option<ValidationResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dated: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UpstreamReply {
    /// Read any JSON body. Objects keep every field; a `validationResponse`
    /// that is not an object stays in `extra` untyped. Non-object bodies carry
    /// no status code at all.
    pub fn from_body(body: Value) -> Self {
        match body {
            Value::Object(map) => match serde_json::from_value(Value::Object(map.clone())) {
                Ok(reply) => reply,
                Err(_) => Self {
                    extra: map,
                    ..Self::default()
                },
            },
            _ => Self::default(),
        }
    }

    pub fn status_code(&self) -> Option<&str> {
        self.validation_response
            .as_ref()
            .and_then(|v| v.status_code.as_ref())
            .and_then(Value::as_str)
    }

    pub fn is_valid(&self) -> bool {
        self.status_code() == Some(VALID_STATUS_CODE)
    }
}
