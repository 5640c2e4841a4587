//! Dashboard operations: the composition of session, API and cache.
//!
//! Each write validates locally first and sends nothing when a rule fails.
//! Reads go through the cache; successful writes invalidate the keys listed
//! in [`crate::cache::invalidations`], failed writes leave it untouched. A
//! 401 from the backend logs the session out.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use olive_core::call::{Call, CallAction, Transcript};
use olive_core::campaign::Campaign;
use olive_core::campaign_form::CampaignForm;
use olive_core::customer::{CreateCustomer, Customer, UpdateCustomer};
use olive_core::customer_set::{CustomerSet, CustomerSetForm, CustomerSetUpload, UploadFile};
use olive_core::lifecycle::{check_action, CampaignAction, ExecuteCampaignResponse};
use olive_core::service::{CreateService, ServiceKind, ServiceRecord, UpdateService};
use olive_core::test_call::TestCallForm;
use olive_core::types::RecordId;

use crate::api::OliveApi;
use crate::cache::{invalidations, Mutation, QueryKey, ResponseCache};
use crate::error::ClientError;
use crate::session::SessionProvider;

pub type ClientResult<T> = Result<T, ClientError>;

pub struct Dashboard {
    api: OliveApi,
    cache: Arc<ResponseCache>,
    session: Arc<dyn SessionProvider>,
}

impl Dashboard {
    pub fn new(api: OliveApi, cache: Arc<ResponseCache>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            api,
            cache,
            session,
        }
    }

    /// Build the API client and cache around `session`.
    pub fn connect(api_url: impl Into<String>, session: Arc<dyn SessionProvider>) -> Self {
        let api = OliveApi::new(api_url, Arc::clone(&session));
        Self::new(api, Arc::new(ResponseCache::new()), session)
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn api(&self) -> &OliveApi {
        &self.api
    }

    // ------------------------------------------------------------------
    // Campaigns
    // ------------------------------------------------------------------

    pub async fn campaigns(&self) -> ClientResult<Vec<Campaign>> {
        self.cached(QueryKey::Campaigns, || self.api.list_campaigns())
            .await
    }

    pub async fn campaign(&self, id: &str) -> ClientResult<Campaign> {
        self.cached(QueryKey::Campaign(id.to_string()), || self.api.get_campaign(id))
            .await
    }

    /// Validate `form` and create the campaign under the signed-in user's
    /// organization.
    pub async fn create_campaign(&self, form: &CampaignForm) -> ClientResult<Campaign> {
        let validated = form.submit()?;
        let organization_id = self.organization_id().await?;
        let body = validated.into_create(organization_id);

        let result = self.api.create_campaign(&body).await;
        let campaign = self.mutated(Mutation::CreateCampaign, result).await?;
        tracing::info!(id = %campaign.id, name = campaign.display_name(), "Campaign created");
        Ok(campaign)
    }

    /// Validate `form` and replace the campaign's editable fields, including
    /// its full customer set membership.
    pub async fn update_campaign(&self, id: &str, form: &CampaignForm) -> ClientResult<Campaign> {
        let body = form.submit()?.into_update();

        let result = self.api.update_campaign(id, &body).await;
        let campaign = self
            .mutated(Mutation::UpdateCampaign(id.to_string()), result)
            .await?;
        tracing::info!(id = %campaign.id, customer_sets = campaign.customer_sets.len(), "Campaign updated");
        Ok(campaign)
    }

    pub async fn delete_campaign(&self, id: &str) -> ClientResult<()> {
        let result = self.api.delete_campaign(id).await;
        self.mutated(Mutation::DeleteCampaign(id.to_string()), result)
            .await?;
        tracing::info!(id = %id, "Campaign deleted");
        Ok(())
    }

    /// Request `action` for a campaign as currently displayed.
    ///
    /// An action the displayed status does not allow is rejected without a
    /// request. On success the engine's reported status is returned; the
    /// caller should show that, not the requested one.
    pub async fn execute_campaign(
        &self,
        campaign: &Campaign,
        action: CampaignAction,
    ) -> ClientResult<ExecuteCampaignResponse> {
        check_action(action, &campaign.status)?;

        let result = self.api.execute_campaign(&campaign.id, action).await;
        let response = self
            .mutated(Mutation::ExecuteCampaign(campaign.id.clone()), result)
            .await?;
        tracing::info!(
            id = %campaign.id,
            %action,
            requested = %action.requested_status(),
            reported = %response.status,
            "Campaign action executed"
        );
        Ok(response)
    }

    // ------------------------------------------------------------------
    // Customer sets
    // ------------------------------------------------------------------

    pub async fn customer_sets(&self) -> ClientResult<Vec<CustomerSet>> {
        self.cached(QueryKey::CustomerSets, || self.api.list_customer_sets())
            .await
    }

    pub async fn customer_set(&self, id: &str) -> ClientResult<CustomerSet> {
        self.cached(QueryKey::CustomerSet(id.to_string()), || {
            self.api.get_customer_set(id)
        })
        .await
    }

    /// Check the selected files and upload the customer set.
    pub async fn create_customer_set(
        &self,
        form: CustomerSetForm,
        files: Vec<UploadFile>,
    ) -> ClientResult<CustomerSet> {
        let organization_id = self.organization_id().await?;
        let upload = CustomerSetUpload::new(organization_id, form, files)?;

        let result = self.api.create_customer_set(&upload).await;
        let set = self.mutated(Mutation::CreateCustomerSet, result).await?;
        tracing::info!(
            id = %set.id,
            file = %upload.file.file_name,
            bytes = upload.file.size(),
            "Customer set uploaded"
        );
        Ok(set)
    }

    pub async fn update_customer_set(
        &self,
        id: &str,
        form: &CustomerSetForm,
    ) -> ClientResult<CustomerSet> {
        let result = self.api.update_customer_set(id, form).await;
        let set = self
            .mutated(Mutation::UpdateCustomerSet(id.to_string()), result)
            .await?;
        tracing::info!(id = %set.id, "Customer set updated");
        Ok(set)
    }

    pub async fn delete_customer_set(&self, id: &str) -> ClientResult<()> {
        let result = self.api.delete_customer_set(id).await;
        self.mutated(Mutation::DeleteCustomerSet(id.to_string()), result)
            .await?;
        tracing::info!(id = %id, "Customer set deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Customers
    // ------------------------------------------------------------------

    pub async fn customers(&self, customer_set_id: &str) -> ClientResult<Vec<Customer>> {
        self.cached(QueryKey::Customers(customer_set_id.to_string()), || {
            self.api.list_customers(customer_set_id)
        })
        .await
    }

    pub async fn customer(&self, id: &str) -> ClientResult<Customer> {
        self.cached(QueryKey::Customer(id.to_string()), || self.api.get_customer(id))
            .await
    }

    pub async fn create_customer(&self, body: &CreateCustomer) -> ClientResult<Customer> {
        let result = self.api.create_customer(body).await;
        let customer = self.mutated(Mutation::CreateCustomer, result).await?;
        tracing::info!(id = %customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn update_customer(&self, id: &str, body: &UpdateCustomer) -> ClientResult<Customer> {
        let result = self.api.update_customer(id, body).await;
        let customer = self
            .mutated(Mutation::UpdateCustomer(id.to_string()), result)
            .await?;
        tracing::info!(id = %customer.id, "Customer updated");
        Ok(customer)
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    pub async fn calls(&self) -> ClientResult<Vec<Call>> {
        self.cached(QueryKey::Calls, || self.api.list_calls()).await
    }

    pub async fn call(&self, id: &str) -> ClientResult<Call> {
        self.cached(QueryKey::Call(id.to_string()), || self.api.get_call(id))
            .await
    }

    /// `Ok(None)` when the call has no stored transcript.
    pub async fn call_transcript(&self, id: &str) -> ClientResult<Option<Transcript>> {
        self.cached(QueryKey::CallTranscript(id.to_string()), || {
            self.api.get_call_transcript(id)
        })
        .await
    }

    pub async fn call_actions(&self, id: &str) -> ClientResult<Vec<CallAction>> {
        self.cached(QueryKey::CallActions(id.to_string()), || {
            self.api.get_call_actions(id)
        })
        .await
    }

    /// Validate and place a test call. Returns the backend's reply.
    pub async fn test_call(&self, form: &TestCallForm) -> ClientResult<serde_json::Value> {
        let body = form.submit()?;
        let result = self.api.start_outbound_call(&body).await;
        let reply = self.guard(result).await?;
        tracing::info!(to = %body.mobile_number, "Test call initiated");
        Ok(reply)
    }

    // ------------------------------------------------------------------
    // Services
    // ------------------------------------------------------------------

    pub async fn services(&self, kind: ServiceKind) -> ClientResult<Vec<ServiceRecord>> {
        self.cached(QueryKey::Services(kind), || self.api.list_services(kind))
            .await
    }

    pub async fn service(&self, kind: ServiceKind, id: &str) -> ClientResult<ServiceRecord> {
        self.cached(QueryKey::Service(kind, id.to_string()), || {
            self.api.get_service(kind, id)
        })
        .await
    }

    pub async fn create_service(
        &self,
        kind: ServiceKind,
        body: &CreateService,
    ) -> ClientResult<ServiceRecord> {
        let result = self.api.create_service(kind, body).await;
        let record = self.mutated(Mutation::CreateService(kind), result).await?;
        tracing::info!(%kind, id = %record.id, "Service created");
        Ok(record)
    }

    pub async fn update_service(
        &self,
        kind: ServiceKind,
        id: &str,
        body: &UpdateService,
    ) -> ClientResult<ServiceRecord> {
        let result = self.api.update_service(kind, id, body).await;
        let record = self
            .mutated(Mutation::UpdateService(kind, id.to_string()), result)
            .await?;
        tracing::info!(%kind, id = %record.id, "Service updated");
        Ok(record)
    }

    /// Organization of the signed-in user.
    pub async fn organization_id(&self) -> ClientResult<RecordId> {
        self.session
            .current_user()
            .await
            .and_then(|user| user.organization_id)
            .ok_or(ClientError::NoOrganization)
    }

    // ---- private helpers ----

    /// Serve `key` from the cache, fetching and storing it on a miss.
    async fn cached<T, F, Fut>(&self, key: QueryKey, fetch: F) -> ClientResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        if let Some(hit) = self.cache.get::<T>(&key).await {
            return Ok(hit);
        }
        let value = self.guard(fetch().await).await?;
        self.cache.put(key, &value).await;
        Ok(value)
    }

    /// Apply the invalidations for `mutation` when `result` succeeded.
    async fn mutated<T>(&self, mutation: Mutation, result: ClientResult<T>) -> ClientResult<T> {
        let value = self.guard(result).await?;
        let dropped = self.cache.invalidate(&invalidations(&mutation)).await;
        tracing::debug!(?mutation, dropped, "Cache invalidated");
        Ok(value)
    }

    /// Log the session out when the backend rejected the credential.
    async fn guard<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(ClientError::Unauthorized) = &result {
            tracing::warn!("Backend rejected the session, signing out");
            self.session.logout().await;
        }
        result
    }
}
