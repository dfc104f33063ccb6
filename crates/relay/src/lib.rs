mod envelope;
mod token;

pub use envelope::Envelope;
pub use token::TokenSource;

use token::select_token;

use access_point::InvoiceAuthorityClient;
use config::{Mode, RelaySettings};
use fbr_einv_core::{parsing, validation};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::Instrument;

pub const SERVICE_NAME: &str = "FBR Invoice API";

/// Terminal state of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Rejected,
    ConnectionFailed,
}

impl Outcome {
    pub fn status_code(&self) -> u16 {
        match self {
            Outcome::Success => 200,
            Outcome::Rejected => 422,
            Outcome::ConnectionFailed => 502,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayResponse {
    pub outcome: Outcome,
    pub envelope: Envelope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Ready,
    NotConfigured,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub service: &'static str,
    pub mode: Mode,
    pub status: HealthStatus,
    pub endpoint: Option<String>,
}

/// Forwards invoice payloads to the Invoice Authority API and normalizes the
/// answer. Holds only immutable settings, so clones are cheap and independent.
#[derive(Clone)]
pub struct Relay {
    settings: Arc<RelaySettings>,
    client: Arc<dyn InvoiceAuthorityClient + 'static>,
}

impl Relay {
    pub fn new(settings: RelaySettings, client: Arc<dyn InvoiceAuthorityClient + 'static>) -> Self {
        Self {
            settings: Arc::new(settings),
            client,
        }
    }

    /// Submit one raw request body. Never fails: every problem ends up in the
    /// envelope.
    pub async fn submit(&self, body: &[u8]) -> RelayResponse {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("submit_invoice", %request_id, mode = %self.settings.mode);
        self.submit_inner(body).instrument(span).await
    }

    async fn submit_inner(&self, body: &[u8]) -> RelayResponse {
        let mode = self.settings.mode;

        let mut payload = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                tracing::warn!("Request body is not a JSON object");
                return self.refuse("Request body must be a JSON object");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Request body is not valid JSON");
                return self.refuse(format!("Invalid request body: {e}"));
            }
        };

        let Some((token, source)) = select_token(&mut payload, self.settings.default_token.as_deref())
        else {
            tracing::warn!("No custom token supplied and no default token configured");
            return self.refuse(format!(
                "No authorization token: request has no customToken and no default token is configured for {mode} mode"
            ));
        };

        inspect_payload(&payload);

        match self.client.post_invoice(&payload, &token).await {
            Ok(reply) => {
                let envelope = Envelope::from_reply(mode, source, reply);
                let outcome = if envelope.success {
                    Outcome::Success
                } else {
                    Outcome::Rejected
                };
                tracing::info!(
                    outcome = ?outcome,
                    token_source = ?source,
                    status_code = envelope.upstream.status_code().unwrap_or("<missing>"),
                    "Invoice relayed"
                );
                RelayResponse { outcome, envelope }
            }
            Err(e) => {
                tracing::error!(error = %e, token_source = ?source, "Invoice Authority API call failed");
                self.failed(Some(source), e.to_string())
            }
        }
    }

    fn failed(&self, source: Option<TokenSource>, error: impl Into<String>) -> RelayResponse {
        RelayResponse {
            outcome: Outcome::ConnectionFailed,
            envelope: Envelope::connection_failed(self.settings.mode, source, error),
        }
    }

    /// Answer a request that will not be forwarded at all. Reported with the
    /// same status as a failed connection, under its own message.
    pub fn refuse(&self, reason: impl Into<String>) -> RelayResponse {
        let reason = reason.into();
        tracing::warn!(%reason, "Invoice not forwarded");
        RelayResponse {
            outcome: Outcome::ConnectionFailed,
            envelope: Envelope::not_sent(self.settings.mode, reason),
        }
    }

    /// Read-only view of the configuration. Makes no outbound call.
    pub fn health(&self) -> HealthReport {
        let endpoint = self.client.endpoint().map(str::to_string);
        HealthReport {
            service: SERVICE_NAME,
            mode: self.settings.mode,
            status: if endpoint.is_some() {
                HealthStatus::Ready
            } else {
                HealthStatus::NotConfigured
            },
            endpoint,
        }
    }
}

/// Log what we are about to forward and whether it would pass the checks the
/// scenario pages apply. Forwarding happens regardless.
fn inspect_payload(payload: &Map<String, Value>) {
    let value = Value::Object(payload.clone());
    let fingerprint = parsing::payload_fingerprint(&value);

    match parsing::parse_invoice_payload(&value) {
        Ok(invoice) => {
            tracing::info!(
                scenario_id = invoice.scenario_id.as_deref().unwrap_or("<none>"),
                seller = %invoice.seller().ntn_cnic,
                buyer = %invoice.buyer().ntn_cnic,
                items = invoice.items.len(),
                %fingerprint,
                "Forwarding invoice"
            );
            if let Err(problems) = validation::validate(&invoice) {
                tracing::warn!(?problems, "Payload fails pre-submission checks");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, %fingerprint, "Forwarding payload with unexpected field types");
        }
    }
}
