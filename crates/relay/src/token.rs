use serde::Serialize;
use serde_json::{Map, Value};

/// Request field carrying a per-request token. Never forwarded upstream.
pub const CUSTOM_TOKEN_FIELD: &str = "customToken";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenSource {
    #[serde(rename = "Custom Token")]
    Custom,
    #[serde(rename = "Environment Token")]
    Environment,
}

/// Strip `customToken` from the payload and pick the bearer token.
///
/// A non-empty string override wins; anything else (absent, empty, not a
/// string) falls back to the configured default. Returns `None` only when
/// neither is available. The field is removed in every case.
pub fn select_token(
    payload: &mut Map<String, Value>,
    default_token: Option<&str>,
) -> Option<(String, TokenSource)> {
    match payload.remove(CUSTOM_TOKEN_FIELD) {
        Some(Value::String(token)) if !token.is_empty() => Some((token, TokenSource::Custom)),
        _ => default_token.map(|t| (t.to_string(), TokenSource::Environment)),
    }
}
