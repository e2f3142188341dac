//! End-to-end resolution flows against a mocked management API and downstream.

use std::sync::Arc;
use std::time::{Duration, Instant};

use infergate_api::{HttpTimeouts, ManagementApi, ManagementClient, build_http_client};
use infergate_engine::{EngineSettings, InferError, InferenceService, PollPolicy, TransferDefaults};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service(management: &MockServer, settings: EngineSettings) -> InferenceService {
    service_with_timeouts(management, settings, HttpTimeouts::default())
}

fn service_with_timeouts(management: &MockServer, settings: EngineSettings, timeouts: HttpTimeouts) -> InferenceService {
    let http = build_http_client(timeouts).expect("http client");
    let client = ManagementClient::new(&format!("{}/management", management.uri()), http.clone(), None).expect("management client");
    InferenceService::new(Arc::new(client) as Arc<dyn ManagementApi>, http, settings)
}

fn quick_poll() -> EngineSettings {
    EngineSettings {
        poll: PollPolicy {
            attempts: 3,
            delay: Duration::from_millis(20),
            ..PollPolicy::default()
        },
        ..EngineSettings::default()
    }
}

#[tokio::test]
async fn scenario_a_local_http_asset_is_called_directly() {
    let management = MockServer::start().await;
    let downstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/management/v3/assets/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@id": "a1",
            "dataAddress": { "type": "HttpData", "baseUrl": format!("{}/y", downstream.uri()) }
        })))
        .expect(1)
        .mount(&management)
        .await;
    Mock::given(method("POST"))
        .and(path("/y/v1/predict"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("prediction", "text/plain"),
        )
        .expect(1)
        .mount(&downstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/management/v3/contractagreements/request"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&management)
        .await;
    Mock::given(method("POST"))
        .and(path("/management/v3/transferprocesses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "@id": "unused" })))
        .expect(0)
        .mount(&management)
        .await;

    let response = service(&management, EngineSettings::default())
        .handle(br#"{"assetId":"a1","path":"/v1/predict","payload":{"inputs":"hi"}}"#)
        .await
        .expect("response");

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "text/plain");
    assert_eq!(response.body, b"prediction");

    let received = downstream.received_requests().await.expect("recording");
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn scenario_b_transfer_never_ready_times_out() {
    let management = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/management/v3/edrs/t1/dataaddress"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(3)
        .mount(&management)
        .await;

    let error = service(&management, quick_poll())
        .handle(br#"{"transferProcessId":"t1"}"#)
        .await
        .expect_err("timeout");

    assert!(matches!(error, InferError::NegotiationTimeout { .. }));
    assert_eq!(error.status_code(), 504);
    assert!(error.to_string().contains("t1"));
}

#[tokio::test]
async fn scenario_c_contract_is_negotiated_and_polled() {
    let management = MockServer::start().await;
    let downstream = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/management/v3/transferprocesses"))
        .and(body_partial_json(json!({
            "contractId": "c1",
            "counterPartyAddress": "http://peer",
            "protocol": "dataspace-protocol-http",
            "transferType": "HttpData-PULL"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "@id": "tp-c1" })))
        .expect(1)
        .mount(&management)
        .await;
    Mock::given(method("GET"))
        .and(path("/management/v3/edrs/tp-c1/dataaddress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "endpoint": downstream.uri(),
            "authorization": "edr-token",
            "authKey": "X-Edr-Auth"
        })))
        .expect(1)
        .mount(&management)
        .await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("x-edr-auth", "edr-token"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "busy": true })))
        .expect(1)
        .mount(&downstream)
        .await;

    let response = service(&management, quick_poll())
        .handle(br#"{"contractId":"c1","counterPartyAddress":"http://peer","method":"get","path":"models"}"#)
        .await
        .expect("response");

    assert_eq!(response.status, 503);
    assert_eq!(response.content_type, "application/json");
    assert_eq!(serde_json::from_slice::<serde_json::Value>(&response.body).expect("json"), json!({ "busy": true }));
}

#[tokio::test]
async fn scenario_d_latest_agreement_wins() {
    let management = MockServer::start().await;
    let downstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/management/v3/assets/a2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&management)
        .await;
    Mock::given(method("POST"))
        .and(path("/management/v3/contractagreements/request"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "assetId": "a2", "@id": "ag1", "timestamp": null },
            { "assetId": "a2", "@id": "ag2", "timestamp": "2024-01-01T00:00:00Z" }
        ])))
        .expect(1)
        .mount(&management)
        .await;
    Mock::given(method("POST"))
        .and(path("/management/v3/transferprocesses"))
        .and(body_partial_json(json!({ "contractId": "ag2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "@id": "tp-ag2" })))
        .expect(1)
        .mount(&management)
        .await;
    Mock::given(method("GET"))
        .and(path("/management/v3/edrs/tp-ag2/dataaddress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "edc:endpoint": downstream.uri(),
            "edc:authorization": "token-ag2"
        })))
        .mount(&management)
        .await;
    Mock::given(method("POST"))
        .and(path("/infer"))
        .and(header("authorization", "token-ag2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&downstream)
        .await;

    let settings = EngineSettings {
        transfer: TransferDefaults {
            counter_party_address: Some("http://peer".to_string()),
            ..TransferDefaults::default()
        },
        ..quick_poll()
    };
    let response = service(&management, settings)
        .handle(br#"{"assetId":"a2","path":"/infer","payload":"raw"}"#)
        .await
        .expect("response");
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"ok");
}

#[tokio::test]
async fn explicit_credential_touches_only_the_downstream() {
    let management = MockServer::start().await;
    let downstream = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/base/v1/x"))
        .and(header("authorization", "abc"))
        .and(header("x-trace", "t-1"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&downstream)
        .await;

    let body = json!({
        "endpoint": format!("{}/base/", downstream.uri()),
        "authorization": "abc",
        "method": "put",
        "path": "/v1/x",
        "headers": { "X-Trace": "t-1" }
    });
    let response = service(&management, EngineSettings::default())
        .handle(body.to_string().as_bytes())
        .await
        .expect("response");

    assert_eq!(response.status, 201);
    assert_eq!(response.content_type, "application/json");
    assert!(management.received_requests().await.expect("recording").is_empty());
}

#[tokio::test]
async fn unresolvable_and_malformed_requests_make_no_calls() {
    let management = MockServer::start().await;
    let service = service(&management, EngineSettings::default());

    let unresolvable = service.handle(br#"{"path":"/v1/x"}"#).await.expect_err("unresolvable");
    assert!(matches!(unresolvable, InferError::UnresolvableIdentifier));

    let empty = service.handle(b"  ").await.expect_err("empty");
    assert!(matches!(empty, InferError::MalformedRequest { .. }));

    let garbage = service.handle(b"{not json").await.expect_err("garbage");
    assert_eq!(garbage.status_code(), 400);

    assert!(management.received_requests().await.expect("recording").is_empty());
}

#[tokio::test]
async fn unknown_asset_without_agreement_is_not_found() {
    let management = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/management/v3/assets/a3"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&management)
        .await;
    Mock::given(method("POST"))
        .and(path("/management/v3/contractagreements/request"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&management)
        .await;

    let error = service(&management, EngineSettings::default())
        .handle(br#"{"assetId":"a3"}"#)
        .await
        .expect_err("no agreement");
    assert!(matches!(error, InferError::NoAgreementFound { .. }));
    assert_eq!(error.to_payload()["error_code"], json!("NO_AGREEMENT_FOUND"));
}

#[tokio::test]
async fn unreachable_downstream_is_upstream_failure() {
    let management = MockServer::start().await;
    let error = service(&management, EngineSettings::default())
        .handle(br#"{"endpoint":"http://127.0.0.1:9","authorization":"abc"}"#)
        .await
        .expect_err("unreachable");
    assert_eq!(error.status_code(), 502);
}

fn short_timeouts() -> HttpTimeouts {
    HttpTimeouts {
        request: Duration::from_millis(200),
        connect: Duration::from_millis(200),
    }
}

fn counter_party_defaults(settings: EngineSettings) -> EngineSettings {
    EngineSettings {
        transfer: TransferDefaults {
            counter_party_address: Some("http://peer".to_string()),
            ..TransferDefaults::default()
        },
        ..settings
    }
}

#[tokio::test]
async fn hung_edr_lookups_end_in_negotiation_timeout() {
    let management = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/management/v3/edrs/t1/dataaddress"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "endpoint": "http://late", "authorization": "late" }))
                .set_delay(Duration::from_secs(3)),
        )
        .expect(2)
        .mount(&management)
        .await;

    let settings = EngineSettings {
        poll: PollPolicy {
            attempts: 2,
            delay: Duration::from_millis(20),
            ..PollPolicy::default()
        },
        ..EngineSettings::default()
    };
    let start = Instant::now();
    let error = service_with_timeouts(&management, settings, short_timeouts())
        .handle(br#"{"transferProcessId":"t1"}"#)
        .await
        .expect_err("timeout");

    assert!(matches!(error, InferError::NegotiationTimeout { attempts: 2, .. }));
    assert!(error.to_string().contains("t1"));
    assert!(start.elapsed() < Duration::from_secs(2), "{:?}", start.elapsed());
}

#[tokio::test]
async fn hung_transfer_initiation_is_upstream_failure_without_retry() {
    let management = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/management/v3/transferprocesses"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "@id": "tp-late" }))
                .set_delay(Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&management)
        .await;
    Mock::given(method("GET"))
        .and(path("/management/v3/edrs/tp-late/dataaddress"))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&management)
        .await;

    let error = service_with_timeouts(&management, counter_party_defaults(quick_poll()), short_timeouts())
        .handle(br#"{"contractId":"c1"}"#)
        .await
        .expect_err("upstream");

    assert!(matches!(error, InferError::UpstreamCallFailed { .. }));
    assert_eq!(error.status_code(), 502);
}

#[tokio::test]
async fn repeated_agreement_page_stops_paging() {
    let management = MockServer::start().await;
    let page: Vec<_> = (0..50).map(|index| json!({ "@id": format!("ag{index}"), "assetId": "other" })).collect();
    Mock::given(method("GET"))
        .and(path("/management/v3/assets/a1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&management)
        .await;
    Mock::given(method("POST"))
        .and(path("/management/v3/contractagreements/request"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page))
        .expect(2)
        .mount(&management)
        .await;

    let error = service(&management, EngineSettings::default())
        .handle(br#"{"assetId":"a1"}"#)
        .await
        .expect_err("no agreement");
    assert!(matches!(error, InferError::NoAgreementFound { .. }));
}

#[tokio::test]
async fn agreement_pages_advance_through_top_level_offset() {
    let management = MockServer::start().await;
    let downstream = MockServer::start().await;
    let first_page: Vec<_> = (0..50).map(|index| json!({ "@id": format!("ag{index}"), "assetId": "other" })).collect();

    Mock::given(method("GET"))
        .and(path("/management/v3/assets/a1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&management)
        .await;
    Mock::given(method("POST"))
        .and(path("/management/v3/contractagreements/request"))
        .and(body_partial_json(json!({ "@type": "QuerySpec", "offset": 0, "limit": 50 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(first_page))
        .expect(1)
        .mount(&management)
        .await;
    Mock::given(method("POST"))
        .and(path("/management/v3/contractagreements/request"))
        .and(body_partial_json(json!({ "@type": "QuerySpec", "offset": 50, "limit": 50 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "@id": "ag-late", "assetId": "a1" }])))
        .expect(1)
        .mount(&management)
        .await;
    Mock::given(method("POST"))
        .and(path("/management/v3/transferprocesses"))
        .and(body_partial_json(json!({ "contractId": "ag-late" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "@id": "tp-late" })))
        .expect(1)
        .mount(&management)
        .await;
    Mock::given(method("GET"))
        .and(path("/management/v3/edrs/tp-late/dataaddress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "endpoint": downstream.uri(),
            "authorization": "token-late"
        })))
        .mount(&management)
        .await;
    Mock::given(method("POST"))
        .and(header("authorization", "token-late"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&downstream)
        .await;

    let response = service(&management, counter_party_defaults(quick_poll()))
        .handle(br#"{"assetId":"a1"}"#)
        .await
        .expect("response");
    assert_eq!(response.status, 200);
}
