//! The real spreadsheet and call API clients against mock servers.

use std::collections::HashMap;

use assert_matches::assert_matches;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use olive_relay::config::{CallApiConfig, ServiceAccountKey, SheetCredentials, SheetsConfig};
use olive_relay::dispatch::{BlandDispatcher, CallDispatcher};
use olive_relay::error::RelayError;
use olive_relay::lead::{CallPayload, CallSettings, LeadSubmission};
use olive_relay::sheets::{GoogleSheetsSink, RowSink};

fn sheets_config(server: &MockServer) -> SheetsConfig {
    SheetsConfig {
        spreadsheet_id: "sheet-1".to_string(),
        sheet_name: "Sheet1".to_string(),
        api_url: server.uri(),
        credentials: SheetCredentials::AccessToken("ya29.token".to_string()),
    }
}

const TEST_PRIVATE_KEY: &str = include_str!("fixtures/service_account_key.pem");
const TEST_PUBLIC_KEY: &str = include_str!("fixtures/service_account_key.pub.pem");
const CLIENT_EMAIL: &str = "relay@olive-test.iam.gserviceaccount.com";

fn service_account_config(server: &MockServer) -> SheetsConfig {
    SheetsConfig {
        credentials: SheetCredentials::ServiceAccount(ServiceAccountKey {
            client_email: CLIENT_EMAIL.to_string(),
            private_key: TEST_PRIVATE_KEY.to_string(),
            token_uri: format!("{}/token", server.uri()),
        }),
        ..sheets_config(server)
    }
}

/// Decoded `application/x-www-form-urlencoded` body of a recorded request.
fn form_fields(request: &wiremock::Request) -> HashMap<String, String> {
    let body = String::from_utf8_lossy(&request.body);
    reqwest::Url::parse(&format!("http://form.local/?{body}"))
        .unwrap()
        .query_pairs()
        .into_owned()
        .collect()
}

fn call_config(server: &MockServer) -> CallApiConfig {
    CallApiConfig {
        api_url: format!("{}/v1/calls", server.uri()),
        api_key: "bland-key".to_string(),
        settings: CallSettings::default(),
    }
}

fn payload() -> CallPayload {
    let lead = LeadSubmission {
        name: "Asha".into(),
        phone: "9876543210".into(),
        company: "Acme".into(),
        company_product: "Solar panels".into(),
        ..Default::default()
    };
    CallPayload::for_lead(&lead, &CallSettings::default())
}

#[tokio::test]
async fn sheet_row_is_appended_with_raw_insert_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-1/values/Sheet1!A:E:append"))
        .and(query_param("valueInputOption", "RAW"))
        .and(query_param("insertDataOption", "INSERT_ROWS"))
        .and(header("authorization", "Bearer ya29.token"))
        .and(body_json(json!({"values": [["Asha", "", "9876543210", "Acme", "Solar panels"]]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updates": {"updatedRows": 1}})))
        .expect(1)
        .mount(&server)
        .await;

    let sink = GoogleSheetsSink::new(&sheets_config(&server), reqwest::Client::new()).unwrap();
    let row: Vec<String> = ["Asha", "", "9876543210", "Acme", "Solar panels"]
        .into_iter()
        .map(String::from)
        .collect();
    sink.append_row(&row).await.unwrap();
}

#[tokio::test]
async fn sheet_rejection_keeps_upstream_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("The caller does not have permission"))
        .mount(&server)
        .await;

    let sink = GoogleSheetsSink::new(&sheets_config(&server), reqwest::Client::new()).unwrap();
    let err = sink.append_row(&["Asha".to_string()]).await.unwrap_err();
    assert_matches!(
        err,
        RelayError::Sheet { status: 403, ref body } if body == "The caller does not have permission"
    );
}

#[tokio::test]
async fn call_is_posted_with_raw_api_key() {
    let server = MockServer::start().await;
    let expected = serde_json::to_value(payload()).unwrap();
    Mock::given(method("POST"))
        .and(path("/v1/calls"))
        .and(header("authorization", "bland-key"))
        .and(body_json(expected))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"status":"success","call_id":"c-1"}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = BlandDispatcher::new(&call_config(&server), reqwest::Client::new());
    let response = dispatcher.dispatch(&payload()).await.unwrap();
    assert_eq!(response.body, r#"{"status":"success","call_id":"c-1"}"#);
    assert_eq!(response.content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn call_api_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/calls"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "invalid phone"})))
        .mount(&server)
        .await;

    let dispatcher = BlandDispatcher::new(&call_config(&server), reqwest::Client::new());
    let err = dispatcher.dispatch(&payload()).await.unwrap_err();
    assert_eq!(err.to_string(), "Request failed with status code 400");
    assert_matches!(err, RelayError::CallApi { status: 400, .. });
}

#[tokio::test]
async fn service_account_token_is_exchanged_once_and_reused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.exchanged",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-1/values/Sheet1!A:E:append"))
        .and(header("authorization", "Bearer ya29.exchanged"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let config = service_account_config(&server);
    let sink = GoogleSheetsSink::new(&config, reqwest::Client::new()).unwrap();
    sink.append_row(&["Asha".to_string()]).await.unwrap();
    sink.append_row(&["Ravi".to_string()]).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let exchange = requests
        .iter()
        .find(|request| request.url.path() == "/token")
        .unwrap();
    let fields = form_fields(exchange);
    assert_eq!(
        fields.get("grant_type").map(String::as_str),
        Some("urn:ietf:params:oauth:grant-type:jwt-bearer")
    );

    let token_uri = format!("{}/token", server.uri());
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[token_uri.as_str()]);
    let claims = decode::<serde_json::Value>(
        &fields["assertion"],
        &DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap(),
        &validation,
    )
    .unwrap()
    .claims;
    assert_eq!(claims["iss"], CLIENT_EMAIL);
    assert_eq!(claims["scope"], "https://www.googleapis.com/auth/spreadsheets");
    assert_eq!(claims["aud"], token_uri.as_str());
    assert_eq!(
        claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
        3600
    );
}

#[tokio::test]
async fn rejected_token_exchange_is_a_credentials_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid JWT Signature."
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-1/values/Sheet1!A:E:append"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let sink =
        GoogleSheetsSink::new(&service_account_config(&server), reqwest::Client::new()).unwrap();
    let err = sink.append_row(&["Asha".to_string()]).await.unwrap_err();
    assert_matches!(err, RelayError::Credentials(ref message) if message.contains("status code 400") && message.contains("invalid_grant"));
}
