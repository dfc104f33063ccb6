use crate::models::InvoicePayload;
use anyhow::{Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex SHA-256 of the payload's JSON serialization. Used to correlate log lines
/// for the same submission without writing the payload itself to the log.
pub fn payload_fingerprint(payload: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

pub fn parse_invoice_payload(value: &Value) -> Result<InvoicePayload> {
    let payload: InvoicePayload = serde_json::from_value(value.clone())
        .context("Failed to read invoice payload fields")?;
    Ok(payload)
}
