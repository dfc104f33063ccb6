use access_point::fbr::FbrClient;
use config::{Mode, RelaySettings};
use relay::{HealthStatus, Outcome, Relay};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UPSTREAM_PATH: &str = "/di_data/v1/di/postinvoicedata_sb";

fn relay_for(server: &MockServer, default_token: Option<&str>) -> Relay {
    let endpoint = format!("{}{}", server.uri(), UPSTREAM_PATH);
    let settings = RelaySettings {
        mode: Mode::Sandbox,
        endpoint: Some(endpoint.clone()),
        default_token: default_token.map(str::to_string),
    };
    let client = FbrClient::new(Some(endpoint), None).unwrap();
    Relay::new(settings, client)
}

fn scenario_payload() -> Value {
    json!({
        "sellerNTNCNIC": "4641094",
        "sellerBusinessName": "ABC Trading",
        "buyerNTNCNIC": "1111111",
        "items": [{
            "hsCode": "0101.2100",
            "productDescription": "product Description",
            "rate": "18%",
            "quantity": 1.0
        }],
        "scenarioId": "SN001"
    })
}

#[tokio::test]
async fn sn001_accepted_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(UPSTREAM_PATH))
        .and(header("Authorization", "Bearer env-token"))
        .and(body_json(scenario_payload()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "validationResponse": { "statusCode": "00", "status": "Valid" },
            "invoiceNumber": "INV-001"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let relay = relay_for(&server, Some("env-token"));
    let resp = relay
        .submit(&serde_json::to_vec(&scenario_payload()).unwrap())
        .await;

    assert_eq!(resp.outcome, Outcome::Success);
    assert_eq!(resp.outcome.status_code(), 200);
    let wire = serde_json::to_value(&resp.envelope).unwrap();
    assert_eq!(wire["success"], true);
    assert_eq!(wire["invoiceNumber"], "INV-001");
    assert_eq!(wire["tokenUsed"], "Environment Token");
    assert_eq!(wire["mode"], "sandbox");
}

#[tokio::test]
async fn custom_token_reaches_upstream_and_body_is_stripped() {
    let server = MockServer::start().await;
    // body_json is an exact match, so a leftover customToken would not match
    Mock::given(method("POST"))
        .and(header("Authorization", "Bearer user-token"))
        .and(body_json(scenario_payload()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "validationResponse": { "statusCode": "00", "status": "Valid" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let relay = relay_for(&server, Some("env-token"));
    let mut payload = scenario_payload();
    payload["customToken"] = json!("user-token");
    let resp = relay.submit(&serde_json::to_vec(&payload).unwrap()).await;

    assert_eq!(resp.outcome, Outcome::Success);
    let wire = serde_json::to_value(&resp.envelope).unwrap();
    assert_eq!(wire["tokenUsed"], "Custom Token");
}

#[tokio::test]
async fn any_other_status_code_is_rejected() {
    for reply in [
        json!({ "validationResponse": { "statusCode": "01", "status": "Invalid", "error": "0401" } }),
        json!({ "validationResponse": { "status": "Invalid" } }),
        json!({ "message": "Unauthorized" }),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(&reply))
            .mount(&server)
            .await;

        let resp = relay_for(&server, Some("env-token"))
            .submit(&serde_json::to_vec(&scenario_payload()).unwrap())
            .await;

        assert_eq!(resp.outcome, Outcome::Rejected, "{reply}");
        assert_eq!(resp.outcome.status_code(), 422);
        assert!(!resp.envelope.success);
    }
}

#[tokio::test]
async fn json_without_readable_status_code_is_rejected() {
    for reply in [
        json!(null),
        json!([]),
        json!("Unauthorized"),
        json!({ "validationResponse": "bad" }),
        json!({ "validationResponse": [] }),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(&reply))
            .mount(&server)
            .await;

        let resp = relay_for(&server, Some("env-token"))
            .submit(&serde_json::to_vec(&scenario_payload()).unwrap())
            .await;

        assert_eq!(resp.outcome, Outcome::Rejected, "{reply}");
        assert_eq!(resp.outcome.status_code(), 422);
        let wire = serde_json::to_value(&resp.envelope).unwrap();
        assert_eq!(wire["success"], false);
        assert_eq!(wire["message"], "Invoice validation failed");
        if reply.is_object() {
            assert_eq!(wire["validationResponse"], reply["validationResponse"]);
        }
    }
}

#[tokio::test]
async fn upstream_error_detail_is_passed_through_on_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_token",
            "error_description": "expired"
        })))
        .mount(&server)
        .await;

    let resp = relay_for(&server, Some("env-token"))
        .submit(&serde_json::to_vec(&scenario_payload()).unwrap())
        .await;

    assert_eq!(resp.outcome, Outcome::Rejected);
    let wire = serde_json::to_value(&resp.envelope).unwrap();
    assert_eq!(wire["error"], "invalid_token");
    assert_eq!(wire["error_description"], "expired");
    assert_eq!(wire["tokenUsed"], "Environment Token");
}

#[tokio::test]
async fn non_json_upstream_body_is_502() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let resp = relay_for(&server, Some("env-token"))
        .submit(&serde_json::to_vec(&scenario_payload()).unwrap())
        .await;

    assert_eq!(resp.outcome, Outcome::ConnectionFailed);
    let wire = serde_json::to_value(&resp.envelope).unwrap();
    assert_eq!(wire["validationResponse"]["statusCode"], "01");
    assert_eq!(wire["validationResponse"]["invoiceStatuses"], Value::Null);
    assert!(wire["validationResponse"]
        .as_object()
        .unwrap()
        .contains_key("invoiceStatuses"));
}

#[tokio::test]
async fn unreachable_upstream_is_502() {
    let endpoint = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}{}", listener.local_addr().unwrap(), UPSTREAM_PATH)
    };
    let settings = RelaySettings {
        mode: Mode::Sandbox,
        endpoint: Some(endpoint.clone()),
        default_token: Some("env-token".into()),
    };
    let relay = Relay::new(settings, FbrClient::new(Some(endpoint), None).unwrap());

    let resp = relay
        .submit(&serde_json::to_vec(&scenario_payload()).unwrap())
        .await;

    assert_eq!(resp.outcome, Outcome::ConnectionFailed);
    assert_eq!(resp.outcome.status_code(), 502);
    assert_eq!(resp.envelope.upstream.status_code(), Some("01"));
}

#[tokio::test]
async fn health_check_makes_no_upstream_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let relay = relay_for(&server, None);
    let report = relay.health();

    assert_eq!(report.status, HealthStatus::Ready);
    assert_eq!(
        report.endpoint,
        Some(format!("{}{}", server.uri(), UPSTREAM_PATH))
    );
}

#[tokio::test]
async fn health_without_endpoint_is_not_configured() {
    let settings = RelaySettings {
        mode: Mode::Production,
        endpoint: None,
        default_token: Some("t".into()),
    };
    let relay = Relay::new(settings, FbrClient::new(None, None).unwrap());

    let report = relay.health();
    assert_eq!(report.status, HealthStatus::NotConfigured);
    assert_eq!(report.mode, Mode::Production);
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!({
            "service": "FBR Invoice API",
            "mode": "production",
            "status": "not_configured",
            "endpoint": null
        })
    );
}
