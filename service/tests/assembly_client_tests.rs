//! HTTP client behavior against a stubbed portal.

#![allow(clippy::unwrap_used, clippy::panic)]

mod common;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use assembly_api::assembly::{ApiClientError, AssemblyApiClient, HttpAssemblyClient};

use common::{array_envelope, bill_record, member_record, object_envelope, result_envelope};

const ROSTER_PATH: &str = "/nwvrqwxyaytdsfvhu";
const BILL_FEED_PATH: &str = "/ncocpgfiaoituanbr";
const PROPOSER_PATH: &str = "/BILLINFOPPSR";

fn client(server: &MockServer) -> HttpAssemblyClient {
    HttpAssemblyClient::new(server.uri(), "test-key", Duration::from_secs(5))
}

#[tokio::test]
async fn bill_page_parses_object_envelope_and_sends_credentials() {
    let server = MockServer::start().await;
    let rows = vec![
        bill_record("PRC_A1", "소득세법 일부개정법률안(정부)", None),
        bill_record("PRC_A2", "국적법 일부개정법률안(정부)", None),
    ];
    Mock::given(method("GET"))
        .and(path(BILL_FEED_PATH))
        .and(query_param("KEY", "test-key"))
        .and(query_param("Type", "json"))
        .and(query_param("AGE", "22"))
        .and(query_param("pIndex", "1"))
        .and(query_param("pSize", "100"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(object_envelope("ncocpgfiaoituanbr", rows)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let records = client(&server).fetch_bill_page(22, 1, 100).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].get("BILL_ID").and_then(serde_json::Value::as_str),
        Some("PRC_A1")
    );
}

#[tokio::test]
async fn roster_parses_array_envelope() {
    let server = MockServer::start().await;
    let rows = vec![
        member_record("홍길동", "더불어민주당"),
        member_record("김철수", "국민의힘"),
    ];
    Mock::given(method("GET"))
        .and(path(ROSTER_PATH))
        .and(query_param("ASSEMBLY", "22"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(array_envelope("nwvrqwxyaytdsfvhu", rows)),
        )
        .mount(&server)
        .await;

    let records = client(&server)
        .fetch_members(22, None, None)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn no_data_sentinel_is_an_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BILL_FEED_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(result_envelope("INFO-200", "해당하는 데이터가 없습니다.")),
        )
        .mount(&server)
        .await;

    let records = client(&server).fetch_bill_page(22, 1, 100).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn upstream_error_code_surfaces_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BILL_FEED_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(result_envelope("ERROR-290", "인증키가 유효하지 않습니다.")),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_bill_page(22, 1, 100)
        .await
        .unwrap_err();
    match err {
        ApiClientError::Upstream { code, .. } => assert_eq!(code, "ERROR-290"),
        other => panic!("expected upstream error, got {other}"),
    }
}

#[tokio::test]
async fn non_success_status_surfaces_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BILL_FEED_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_bill_page(22, 1, 100)
        .await
        .unwrap_err();
    match err {
        ApiClientError::Status { status, .. } => assert_eq!(status, 503),
        other => panic!("expected status error, got {other}"),
    }
}

#[tokio::test]
async fn proposer_detail_overrides_title_default() {
    let server = MockServer::start().await;
    let rows = vec![
        json!({"PPSR_NM": "홍길동", "REP_DIV": "대표발의"})
            .as_object()
            .cloned()
            .unwrap(),
        json!({"PPSR_NM": "김철수", "REP_DIV": "공동발의"})
            .as_object()
            .cloned()
            .unwrap(),
    ];
    Mock::given(method("GET"))
        .and(path(PROPOSER_PATH))
        .and(query_param("BILL_ID", "PRC_A1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(object_envelope("BILLINFOPPSR", rows)),
        )
        .mount(&server)
        .await;

    let record = bill_record("PRC_A1", "소득세법 일부개정법률안(이몽룡의원 대표발의)", None);
    let info = client(&server).fetch_bill_proposers("PRC_A1", &record).await;
    assert_eq!(info.rep_proposer.as_deref(), Some("홍길동"));
    assert_eq!(info.co_proposers, vec!["김철수".to_string()]);
}

#[tokio::test]
async fn five_empty_proposer_answers_open_the_breaker() {
    let server = MockServer::start().await;
    // Exactly five calls must reach the server; the sixth short-circuits.
    Mock::given(method("GET"))
        .and(path(PROPOSER_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(result_envelope("INFO-200", "해당하는 데이터가 없습니다.")),
        )
        .expect(5)
        .mount(&server)
        .await;

    let api = client(&server);
    let record = bill_record("PRC_A1", "소득세법 일부개정법률안(이몽룡의원 대표발의)", None);

    for _ in 0..5 {
        api.fetch_bill_proposers("PRC_A1", &record).await;
    }
    assert!(api.proposer_breaker_open());

    // Sixth call falls back to the title-derived default without a request.
    let info = api.fetch_bill_proposers("PRC_A1", &record).await;
    assert_eq!(info.rep_proposer.as_deref(), Some("이몽룡의원"));
}

#[tokio::test]
async fn one_success_resets_the_failure_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROPOSER_PATH))
        .and(query_param("BILL_ID", "FAIL"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(result_envelope("INFO-200", "해당하는 데이터가 없습니다.")),
        )
        .mount(&server)
        .await;
    let good_row = vec![json!({"PPSR_NM": "홍길동", "REP_DIV": "대표발의"})
        .as_object()
        .cloned()
        .unwrap()];
    Mock::given(method("GET"))
        .and(path(PROPOSER_PATH))
        .and(query_param("BILL_ID", "OK"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(object_envelope("BILLINFOPPSR", good_row)),
        )
        .mount(&server)
        .await;

    let api = client(&server);
    let record = bill_record("FAIL", "어느 의안(이몽룡의원 대표발의)", None);

    for _ in 0..4 {
        api.fetch_bill_proposers("FAIL", &record).await;
    }
    assert!(!api.proposer_breaker_open());

    api.fetch_bill_proposers("OK", &record).await;
    assert!(!api.proposer_breaker_open());

    // Four more failures after the reset still leave the breaker closed.
    for _ in 0..4 {
        api.fetch_bill_proposers("FAIL", &record).await;
    }
    assert!(!api.proposer_breaker_open());

    api.fetch_bill_proposers("FAIL", &record).await;
    assert!(api.proposer_breaker_open());
}
