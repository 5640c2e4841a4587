//! Outbound voice-call dispatch.

use async_trait::async_trait;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::config::CallApiConfig;
use crate::error::{RelayError, RelayResult};
use crate::lead::CallPayload;

/// Places a call for a lead.
#[async_trait]
pub trait CallDispatcher: Send + Sync {
    async fn dispatch(&self, payload: &CallPayload) -> RelayResult<CallApiResponse>;
}

/// Successful call API reply, forwarded to the webhook caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallApiResponse {
    pub content_type: Option<String>,
    pub body: String,
}

impl IntoResponse for CallApiResponse {
    fn into_response(self) -> Response {
        match self.content_type {
            Some(content_type) => {
                (StatusCode::OK, [(CONTENT_TYPE, content_type)], self.body).into_response()
            }
            None => (StatusCode::OK, self.body).into_response(),
        }
    }
}

/// Client for the Bland call API.
pub struct BlandDispatcher {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl BlandDispatcher {
    pub fn new(config: &CallApiConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl CallDispatcher for BlandDispatcher {
    async fn dispatch(&self, payload: &CallPayload) -> RelayResult<CallApiResponse> {
        // The key goes in as-is, without a `Bearer` prefix.
        let response = self
            .client
            .post(&self.api_url)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RelayError::CallApi {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(phone_number = %payload.phone_number, "Call dispatched");
        Ok(CallApiResponse { content_type, body })
    }
}
