#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use olive_relay::dispatch::{CallApiResponse, CallDispatcher};
use olive_relay::error::{RelayError, RelayResult};
use olive_relay::lead::{CallPayload, CallSettings};
use olive_relay::router::build_app_router;
use olive_relay::sheets::RowSink;
use olive_relay::state::AppState;

/// Records appended rows; fails every append when `fail_with` is set.
#[derive(Default)]
pub struct RecordingSink {
    pub rows: Mutex<Vec<Vec<String>>>,
    pub fail_with: Option<u16>,
}

impl RecordingSink {
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with: Some(status),
            ..Default::default()
        }
    }
}

#[async_trait]
impl RowSink for RecordingSink {
    async fn append_row(&self, row: &[String]) -> RelayResult<()> {
        if let Some(status) = self.fail_with {
            return Err(RelayError::Sheet {
                status,
                body: "quota exceeded".to_string(),
            });
        }
        self.rows.lock().unwrap().push(row.to_vec());
        Ok(())
    }
}

/// Records payloads and answers with a canned reply.
pub struct RecordingDispatcher {
    pub payloads: Mutex<Vec<CallPayload>>,
    pub reply: RelayResult<CallApiResponse>,
}

impl RecordingDispatcher {
    pub fn replying(body: &str) -> Self {
        Self {
            payloads: Mutex::default(),
            reply: Ok(CallApiResponse {
                content_type: Some("application/json".to_string()),
                body: body.to_string(),
            }),
        }
    }

    pub fn rejecting(status: u16) -> Self {
        Self {
            payloads: Mutex::default(),
            reply: Err(RelayError::CallApi {
                status,
                body: "{\"message\": \"invalid phone number\"}".to_string(),
            }),
        }
    }

    pub fn calls(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }
}

#[async_trait]
impl CallDispatcher for RecordingDispatcher {
    async fn dispatch(&self, payload: &CallPayload) -> RelayResult<CallApiResponse> {
        self.payloads.lock().unwrap().push(payload.clone());
        match &self.reply {
            Ok(response) => Ok(response.clone()),
            Err(RelayError::CallApi { status, body }) => Err(RelayError::CallApi {
                status: *status,
                body: body.clone(),
            }),
            Err(other) => Err(RelayError::Credentials(other.to_string())),
        }
    }
}

/// Build the relay router around in-memory fakes, with the same middleware
/// stack production uses.
pub fn build_test_app(sink: Arc<RecordingSink>, dispatcher: Arc<RecordingDispatcher>) -> Router {
    let state = AppState {
        sink,
        dispatcher,
        settings: Arc::new(CallSettings::default()),
    };
    build_app_router(state, 30)
}

pub async fn get(app: Router, uri: &str) -> axum::response::Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> axum::response::Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

pub fn assert_status(response: &axum::response::Response, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
