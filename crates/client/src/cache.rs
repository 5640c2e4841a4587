//! Read cache for backend responses.
//!
//! Results are stored as JSON under a typed [`QueryKey`]. Writes never patch
//! cached entries: a successful mutation drops the affected keys (see
//! [`invalidations`]) and the next read refetches them.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use olive_core::service::ServiceKind;
use olive_core::types::RecordId;

/// Identity of one cached read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Campaigns,
    Campaign(RecordId),
    CustomerSets,
    CustomerSet(RecordId),
    /// Customers of one customer set.
    Customers(RecordId),
    Customer(RecordId),
    Calls,
    Call(RecordId),
    CallTranscript(RecordId),
    CallActions(RecordId),
    Services(ServiceKind),
    Service(ServiceKind, RecordId),
}

/// A key with its record id erased; used to invalidate a whole family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryFamily {
    Campaigns,
    Campaign,
    CustomerSets,
    CustomerSet,
    Customers,
    Customer,
    Calls,
    Call,
    CallTranscript,
    CallActions,
    Services(ServiceKind),
    Service(ServiceKind),
}

impl QueryKey {
    pub fn family(&self) -> QueryFamily {
        match self {
            QueryKey::Campaigns => QueryFamily::Campaigns,
            QueryKey::Campaign(_) => QueryFamily::Campaign,
            QueryKey::CustomerSets => QueryFamily::CustomerSets,
            QueryKey::CustomerSet(_) => QueryFamily::CustomerSet,
            QueryKey::Customers(_) => QueryFamily::Customers,
            QueryKey::Customer(_) => QueryFamily::Customer,
            QueryKey::Calls => QueryFamily::Calls,
            QueryKey::Call(_) => QueryFamily::Call,
            QueryKey::CallTranscript(_) => QueryFamily::CallTranscript,
            QueryKey::CallActions(_) => QueryFamily::CallActions,
            QueryKey::Services(kind) => QueryFamily::Services(*kind),
            QueryKey::Service(kind, _) => QueryFamily::Service(*kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    Exact(QueryKey),
    Family(QueryFamily),
}

impl Invalidation {
    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            Invalidation::Exact(exact) => exact == key,
            Invalidation::Family(family) => key.family() == *family,
        }
    }
}

/// A successful write against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateCampaign,
    UpdateCampaign(RecordId),
    DeleteCampaign(RecordId),
    ExecuteCampaign(RecordId),
    CreateCustomerSet,
    UpdateCustomerSet(RecordId),
    DeleteCustomerSet(RecordId),
    CreateCustomer,
    UpdateCustomer(RecordId),
    CreateService(ServiceKind),
    UpdateService(ServiceKind, RecordId),
}

/// Keys to drop after `mutation` succeeds.
pub fn invalidations(mutation: &Mutation) -> Vec<Invalidation> {
    use Invalidation::{Exact, Family};

    match mutation {
        Mutation::CreateCampaign | Mutation::DeleteCampaign(_) => vec![Exact(QueryKey::Campaigns)],
        Mutation::UpdateCampaign(id) | Mutation::ExecuteCampaign(id) => {
            vec![Exact(QueryKey::Campaign(id.clone()))]
        }
        Mutation::CreateCustomerSet => vec![Exact(QueryKey::CustomerSets)],
        Mutation::UpdateCustomerSet(id) => vec![Exact(QueryKey::CustomerSet(id.clone()))],
        // Campaigns may have referenced the deleted set.
        Mutation::DeleteCustomerSet(_) => vec![
            Family(QueryFamily::Campaign),
            Exact(QueryKey::Campaigns),
            Exact(QueryKey::CustomerSets),
        ],
        Mutation::CreateCustomer => vec![Family(QueryFamily::Customers)],
        Mutation::UpdateCustomer(id) => vec![
            Family(QueryFamily::Customers),
            Exact(QueryKey::Customer(id.clone())),
        ],
        Mutation::CreateService(kind) => vec![Exact(QueryKey::Services(*kind))],
        Mutation::UpdateService(kind, id) => vec![
            Exact(QueryKey::Services(*kind)),
            Exact(QueryKey::Service(*kind, id.clone())),
        ],
    }
}

/// Shared response cache.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<QueryKey, serde_json::Value>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `key`. An entry that no longer decodes as `T` is a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entries = self.entries.read().await;
        let value = entries.get(key)?;
        match T::deserialize(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::debug!(?key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    pub async fn put<T: Serialize>(&self, key: QueryKey, value: &T) {
        match serde_json::to_value(value) {
            Ok(json) => {
                self.entries.write().await.insert(key, json);
            }
            Err(e) => tracing::warn!(?key, error = %e, "Failed to cache response"),
        }
    }

    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Drop every entry matched by any of `rules`; returns how many went.
    pub async fn invalidate(&self, rules: &[Invalidation]) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !rules.iter().any(|rule| rule.matches(key)));
        before - entries.len()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
