//! End-to-end tests of `KmaClient` against a mock HTTP server.

use std::time::Duration;

use kma_core::{
    ClientConfig, ForecastQuery, KmaClient, KmaError, ObservationQuery, RetryConfig,
    TransportError,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const FORECAST_PATH: &str = "/VilageFcstInfoService_2.0/getVilageFcst";
const ASOS_PATH: &str = "/AsosHourlyInfoService/getWthrDataList";

fn forecast_item(time: &str, category: &str, value: &str) -> serde_json::Value {
    serde_json::json!({
        "baseDate": "20210225",
        "baseTime": "0500",
        "category": category,
        "fcstDate": "20210225",
        "fcstTime": time,
        "fcstValue": value,
        "nx": 62,
        "ny": 121
    })
}

fn ok_envelope(items: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "response": {
            "header": { "resultCode": "00", "resultMsg": "NORMAL_SERVICE" },
            "body": {
                "dataType": "JSON",
                "items": { "item": items },
                "pageNo": 1,
                "numOfRows": 300,
                "totalCount": 3
            }
        }
    })
}

fn test_client(server: &MockServer, retry: RetryConfig) -> KmaClient {
    let config = ClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        retry,
    };
    #[allow(clippy::expect_used)]
    KmaClient::with_config("TEST_KEY", &config).expect("Failed to create client")
}

fn forecast_query() -> ForecastQuery {
    ForecastQuery::new("20210225", "0500", "62", "121")
}

// ============================================================================
// Success scenarios
// ============================================================================

#[tokio::test]
async fn forecast_is_fetched_and_pivoted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .and(query_param("ServiceKey", "TEST_KEY"))
        .and(query_param("dataType", "JSON"))
        .and(query_param("base_date", "20210225"))
        .and(query_param("base_time", "0500"))
        .and(query_param("nx", "62"))
        .and(query_param("ny", "121"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(serde_json::json!([
            forecast_item("0600", "TMP", "5"),
            forecast_item("0600", "POP", "30"),
            forecast_item("0900", "TMP", "7"),
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, RetryConfig::none());
    let result = client.fetch_forecast(&forecast_query()).await;
    assert!(result.is_ok(), "Expected success, got: {result:?}");

    let table = result.unwrap();
    assert_eq!(table.columns(), ["DT_base", "DT_fcst", "NX", "NY", "POP", "TMP"]);
    assert_eq!(table.len(), 2);

    let row = table.at("202102250900").unwrap();
    assert_eq!(row.get("TMP"), Some("7"));
    assert_eq!(row.get("POP"), None);
    assert_eq!(row.get("NY"), Some("121"));
}

#[tokio::test]
async fn single_observation_is_one_row() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "response": {
            "header": { "resultCode": "00", "resultMsg": "NORMAL_SERVICE" },
            "body": {
                "dataType": "JSON",
                "items": { "item": {
                    "tm": "2021-11-16 00:00", "stnId": "108", "stnNm": "서울", "ta": "3.1", "rn": ""
                } },
                "totalCount": 1
            }
        }
    });

    Mock::given(method("GET"))
        .and(path(ASOS_PATH))
        .and(query_param("stnIds", "108"))
        .and(query_param("dataCd", "ASOS"))
        .and(query_param("dateCd", "HR"))
        .and(query_param("startHh", "00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = test_client(&server, RetryConfig::none());
    let table = client
        .fetch_observations(&ObservationQuery::new("108", "20211116", "00", "20211116", "00"))
        .await
        .unwrap();

    assert_eq!(table.columns(), ["tm", "stnId", "stnNm", "ta", "rn"]);
    assert_eq!(table.len(), 1);
    assert_eq!(table.row(0).unwrap().get("stnNm"), Some("서울"));
    assert_eq!(table.row(0).unwrap().get("rn"), Some(""));
}

#[tokio::test]
async fn empty_forecast_page_is_a_valid_empty_table() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "response": {
            "header": { "resultCode": "00", "resultMsg": "NORMAL_SERVICE" },
            "body": { "dataType": "JSON", "items": "", "totalCount": 0 }
        }
    });

    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = test_client(&server, RetryConfig::none());
    let table = client.fetch_forecast(&forecast_query()).await.unwrap();

    assert!(table.is_empty());
    assert_eq!(table.columns(), ["DT_base", "DT_fcst", "NX", "NY"]);
}

// ============================================================================
// Error scenarios
// ============================================================================

#[tokio::test]
async fn provider_fault_is_reported_with_code_and_message() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "response": { "header": { "resultCode": "10", "resultMsg": "INVALID_REQUEST_PARAMETER_ERROR" } }
    });

    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, RetryConfig::new(3, 1, 5));
    let err = client.fetch_forecast(&forecast_query()).await.unwrap_err();

    match err {
        KmaError::Api(fault) => {
            assert_eq!(fault.code, "10");
            assert_eq!(fault.message, "INVALID_REQUEST_PARAMETER_ERROR");
        }
        other => panic!("Expected ApiFault, got: {other:?}"),
    }
}

#[tokio::test]
async fn http_error_status_is_a_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("SERVICE_KEY_IS_NOT_REGISTERED_ERROR"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, RetryConfig::new(3, 1, 5));
    let err = client.fetch_forecast(&forecast_query()).await.unwrap_err();

    match err {
        KmaError::Transport(TransportError::Status { status, body, .. }) => {
            assert_eq!(status, 401);
            assert!(body.contains("SERVICE_KEY_IS_NOT_REGISTERED_ERROR"));
        }
        other => panic!("Expected HTTP status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(serde_json::json!([
            forecast_item("0600", "TMP", "5"),
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, RetryConfig::new(3, 1, 5));
    let table = client.fetch_forecast(&forecast_query()).await.unwrap();
    assert_eq!(table.len(), 1);
}

#[tokio::test]
async fn retries_give_up_with_last_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server, RetryConfig::new(1, 1, 5));
    let err = client.fetch_forecast(&forecast_query()).await.unwrap_err();
    assert!(matches!(
        err,
        KmaError::Transport(TransportError::Status { status: 503, .. })
    ));
}

#[tokio::test]
async fn record_without_category_is_malformed() {
    let server = MockServer::start().await;

    let mut broken = forecast_item("0900", "TMP", "7");
    broken.as_object_mut().unwrap().remove("category");

    Mock::given(method("GET"))
        .and(path(FORECAST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(serde_json::json!([
            forecast_item("0600", "TMP", "5"),
            broken,
        ]))))
        .mount(&server)
        .await;

    let client = test_client(&server, RetryConfig::none());
    let err = client.fetch_forecast(&forecast_query()).await.unwrap_err();
    assert!(matches!(
        err,
        KmaError::MalformedRecord { index: 1, field: "category" }
    ));
}
