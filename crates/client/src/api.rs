//! REST API client for the Olive campaign backend.
//!
//! Every request carries `Authorization: Bearer <token>` taken from the
//! injected [`SessionProvider`] at send time, so a sign-in or logout takes
//! effect on the next call without rebuilding the client.

use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use olive_core::call::{Call, CallAction, Transcript};
use olive_core::campaign::{Campaign, CreateCampaign, UpdateCampaign};
use olive_core::customer::{CreateCustomer, Customer, UpdateCustomer};
use olive_core::customer_set::{CustomerSet, CustomerSetUpload, UpdateCustomerSet};
use olive_core::lifecycle::{CampaignAction, ExecuteCampaignRequest, ExecuteCampaignResponse};
use olive_core::service::{CreateService, ServiceKind, ServiceRecord, UpdateService};
use olive_core::test_call::OutboundCallRequest;

use crate::error::ClientError;
use crate::session::SessionProvider;

/// HTTP client for one Olive backend.
#[derive(Clone)]
pub struct OliveApi {
    client: reqwest::Client,
    api_url: String,
    session: Arc<dyn SessionProvider>,
}

impl OliveApi {
    /// * `api_url` - Base HTTP URL, e.g. `https://api.olive.test`.
    pub fn new(api_url: impl Into<String>, session: Arc<dyn SessionProvider>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, session)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            api_url,
            session,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /* ----------------------------------------------------------------------
       Campaigns
       ---------------------------------------------------------------------- */

    pub async fn list_campaigns(&self) -> Result<Vec<Campaign>, ClientError> {
        let response = self.request(Method::GET, "/campaigns").await.send().await?;
        Self::parse_response(response).await
    }

    pub async fn get_campaign(&self, id: &str) -> Result<Campaign, ClientError> {
        let response = self
            .request(Method::GET, &format!("/campaigns/{id}"))
            .await
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn create_campaign(&self, body: &CreateCampaign) -> Result<Campaign, ClientError> {
        let response = self
            .request(Method::POST, "/campaigns")
            .await
            .json(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn update_campaign(
        &self,
        id: &str,
        body: &UpdateCampaign,
    ) -> Result<Campaign, ClientError> {
        let response = self
            .request(Method::PATCH, &format!("/campaigns/{id}"))
            .await
            .json(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn delete_campaign(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .request(Method::DELETE, &format!("/campaigns/{id}"))
            .await
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// Ask the execution engine to start or stop a campaign.
    ///
    /// Sends `POST /campaigns/{id}/execute`. The returned status is the
    /// engine's, which may differ from the one requested.
    pub async fn execute_campaign(
        &self,
        id: &str,
        action: CampaignAction,
    ) -> Result<ExecuteCampaignResponse, ClientError> {
        let response = self
            .request(Method::POST, &format!("/campaigns/{id}/execute"))
            .await
            .json(&ExecuteCampaignRequest { action })
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /* ----------------------------------------------------------------------
       Customer sets
       ---------------------------------------------------------------------- */

    pub async fn list_customer_sets(&self) -> Result<Vec<CustomerSet>, ClientError> {
        let response = self
            .request(Method::GET, "/customer-sets")
            .await
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn get_customer_set(&self, id: &str) -> Result<CustomerSet, ClientError> {
        let response = self
            .request(Method::GET, &format!("/customer-sets/{id}"))
            .await
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Create a customer set by uploading its file as `multipart/form-data`.
    pub async fn create_customer_set(
        &self,
        upload: &CustomerSetUpload,
    ) -> Result<CustomerSet, ClientError> {
        let mut form = Form::new();
        for (name, value) in upload.text_fields() {
            form = form.text(name, value);
        }
        let file = Part::bytes(upload.file.bytes.clone())
            .file_name(upload.file.file_name.clone())
            .mime_str(&upload.file.content_type)?;
        form = form.part("file", file);

        let response = self
            .request(Method::POST, "/customer-sets")
            .await
            .multipart(form)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn update_customer_set(
        &self,
        id: &str,
        body: &UpdateCustomerSet,
    ) -> Result<CustomerSet, ClientError> {
        let response = self
            .request(Method::PATCH, &format!("/customer-sets/{id}"))
            .await
            .json(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn delete_customer_set(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .request(Method::DELETE, &format!("/customer-sets/{id}"))
            .await
            .send()
            .await?;
        Self::check_status(response).await
    }

    /* ----------------------------------------------------------------------
       Customers
       ---------------------------------------------------------------------- */

    pub async fn list_customers(&self, customer_set_id: &str) -> Result<Vec<Customer>, ClientError> {
        let response = self
            .request(Method::GET, "/customers")
            .await
            .query(&[("customer_set_id", customer_set_id)])
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn get_customer(&self, id: &str) -> Result<Customer, ClientError> {
        let response = self
            .request(Method::GET, &format!("/customers/{id}"))
            .await
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn create_customer(&self, body: &CreateCustomer) -> Result<Customer, ClientError> {
        let response = self
            .request(Method::POST, "/customers")
            .await
            .json(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn update_customer(
        &self,
        id: &str,
        body: &UpdateCustomer,
    ) -> Result<Customer, ClientError> {
        let response = self
            .request(Method::PATCH, &format!("/customers/{id}"))
            .await
            .json(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /* ----------------------------------------------------------------------
       Calls
       ---------------------------------------------------------------------- */

    pub async fn list_calls(&self) -> Result<Vec<Call>, ClientError> {
        let response = self.request(Method::GET, "/calls").await.send().await?;
        Self::parse_response(response).await
    }

    pub async fn get_call(&self, id: &str) -> Result<Call, ClientError> {
        let response = self
            .request(Method::GET, &format!("/calls/{id}"))
            .await
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Fetch a call's transcript. `None` when the call has none stored.
    pub async fn get_call_transcript(&self, id: &str) -> Result<Option<Transcript>, ClientError> {
        let response = self
            .request(Method::GET, &format!("/calls/{id}/transcript"))
            .await
            .send()
            .await?;
        let body: TranscriptBody = Self::parse_response(response).await?;
        Ok(body.into_text().map(|text| Transcript::parse(&text)))
    }

    /// Fetch the actions recorded during a call, oldest first.
    pub async fn get_call_actions(&self, id: &str) -> Result<Vec<CallAction>, ClientError> {
        let response = self
            .request(Method::GET, &format!("/calls/{id}/actions"))
            .await
            .send()
            .await?;
        let actions: Option<Vec<CallAction>> = Self::parse_response(response).await?;
        Ok(actions.unwrap_or_default())
    }

    /// Place a one-off test call (`POST /calls/outbound`).
    pub async fn start_outbound_call(
        &self,
        body: &OutboundCallRequest,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .request(Method::POST, "/calls/outbound")
            .await
            .json(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /* ----------------------------------------------------------------------
       Services
       ---------------------------------------------------------------------- */

    pub async fn list_services(&self, kind: ServiceKind) -> Result<Vec<ServiceRecord>, ClientError> {
        let response = self
            .request(Method::GET, &format!("/{}", kind.collection()))
            .await
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn get_service(&self, kind: ServiceKind, id: &str) -> Result<ServiceRecord, ClientError> {
        let response = self
            .request(Method::GET, &format!("/{}/{id}", kind.collection()))
            .await
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn create_service(
        &self,
        kind: ServiceKind,
        body: &CreateService,
    ) -> Result<ServiceRecord, ClientError> {
        let response = self
            .request(Method::POST, &format!("/{}", kind.collection()))
            .await
            .json(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn update_service(
        &self,
        kind: ServiceKind,
        id: &str,
        body: &UpdateService,
    ) -> Result<ServiceRecord, ClientError> {
        let response = self
            .request(Method::PATCH, &format!("/{}/{id}", kind.collection()))
            .await
            .json(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let token = self.session.access_token().await;
        tracing::debug!(%method, path, "Olive API request");
        self.client
            .request(method, format!("{}{}", self.api_url, path))
            .bearer_auth(token)
    }

    /// Map a non-2xx response to [`ClientError::Unauthorized`] (401) or
    /// [`ClientError::Api`] carrying the server's message.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), ClientError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Pull a human-readable message out of an error body: the first string
/// among `detail`, `error` and `message`, else the raw body.
pub fn error_message(body: &str) -> String {
    let Ok(serde_json::Value::Object(fields)) = serde_json::from_str::<serde_json::Value>(body)
    else {
        return body.to_string();
    };
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| match fields.get(*key) {
            Some(serde_json::Value::String(text)) => Some(text.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        })
        .unwrap_or_else(|| body.to_string())
}

/// The transcript endpoint answers with a bare string, `null`, or
/// `{"transcript": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TranscriptBody {
    Text(String),
    Wrapped {
        #[serde(default)]
        transcript: Option<String>,
    },
    Empty(()),
}

impl TranscriptBody {
    fn into_text(self) -> Option<String> {
        match self {
            TranscriptBody::Text(text) => Some(text),
            TranscriptBody::Wrapped { transcript } => transcript,
            TranscriptBody::Empty(()) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_detail() {
        assert_eq!(
            error_message(r#"{"detail": "Campaign not found", "message": "x"}"#),
            "Campaign not found"
        );
        assert_eq!(error_message(r#"{"error": "bad action"}"#), "bad action");
    }

    #[test]
    fn structured_detail_is_kept_as_json_text() {
        assert_eq!(
            error_message(r#"{"detail": [{"loc": ["body", "name"]}]}"#),
            r#"[{"loc":["body","name"]}]"#
        );
    }

    #[test]
    fn non_json_body_is_returned_verbatim() {
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(r#"{"status": 500}"#), r#"{"status": 500}"#);
    }

    #[test]
    fn transcript_body_shapes() {
        let text: TranscriptBody = serde_json::from_str(r#""BOT: Hi""#).unwrap();
        assert_eq!(text.into_text().as_deref(), Some("BOT: Hi"));
        let wrapped: TranscriptBody = serde_json::from_str(r#"{"transcript": null}"#).unwrap();
        assert_eq!(wrapped.into_text(), None);
        let empty: TranscriptBody = serde_json::from_str("null").unwrap();
        assert_eq!(empty.into_text(), None);
    }
}
