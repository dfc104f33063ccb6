use super::{InvoiceAuthorityClient, UpstreamError, UpstreamReply, ValidationResponse};
use async_trait::async_trait;
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};

/// What the mock answers with.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// statusCode "00" and a generated invoice number
    Accept,
    /// the given statusCode with an error text
    Reject { status_code: String, error: String },
    /// a transport-style failure
    Fail(String),
}

/// A call the mock received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub token: String,
    pub payload: Map<String, Value>,
}

/// Stand-in for the Invoice Authority API, for offline runs and tests.
#[derive(Clone)]
pub struct MockClient {
    behavior: MockBehavior,
    latency: Duration,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl Default for MockClient {
    fn default() -> Self {
        Self {
            behavior: MockBehavior::Accept,
            latency: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_behavior(behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            ..Self::default()
        })
    }

    /// Accepts everything after `latency`, like a slow sandbox.
    pub fn simulated(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency,
            ..Self::default()
        })
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }
}

fn now_dated() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[async_trait]
impl InvoiceAuthorityClient for MockClient {
    async fn post_invoice(
        &self,
        payload: &Map<String, Value>,
        token: &str,
    ) -> Result<UpstreamReply, UpstreamError> {
        self.calls.lock().await.push(RecordedCall {
            token: token.to_string(),
            payload: payload.clone(),
        });

        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }

        match &self.behavior {
            MockBehavior::Accept => {
                let suffix: String = rand::thread_rng()
                    .sample_iter(&Alphanumeric)
                    .take(13)
                    .map(char::from)
                    .collect();
                Ok(UpstreamReply {
                    validation_response: Some(ValidationResponse {
                        status_code: Some(json!("00")),
                        status: Some(json!("Valid")),
                        error: Some(json!("")),
                        extra: Map::new(),
                    }),
                    invoice_number: Some(json!(format!("MOCK{}", suffix.to_uppercase()))),
                    dated: Some(json!(now_dated())),
                    extra: Map::new(),
                })
            }
            MockBehavior::Reject { status_code, error } => Ok(UpstreamReply {
                validation_response: Some(ValidationResponse {
                    status_code: Some(json!(status_code)),
                    status: Some(json!("Invalid")),
                    error: Some(json!(error)),
                    extra: Map::new(),
                }),
                invoice_number: None,
                dated: Some(json!(now_dated())),
                extra: Map::new(),
            }),
            MockBehavior::Fail(message) => Err(UpstreamError::Other(message.clone())),
        }
    }

    fn endpoint(&self) -> Option<&str> {
        Some("mock://invoice-authority")
    }
}
