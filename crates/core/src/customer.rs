//! Customers ingested from customer set files.

use serde::{Deserialize, Serialize};

use crate::types::RecordId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: RecordId,
    pub organization_id: RecordId,
    #[serde(default)]
    pub customer_set_id: Option<RecordId>,
    pub name: String,
    pub mobile_number: String,
    /// Free-form columns carried over from the uploaded file.
    #[serde(default)]
    pub customer_metadata: serde_json::Value,
}

/// Body of `POST /customers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCustomer {
    pub organization_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_set_id: Option<RecordId>,
    pub name: String,
    pub mobile_number: String,
    pub customer_metadata: serde_json::Value,
}

/// Body of `PATCH /customers/{id}`. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateCustomer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_metadata: Option<serde_json::Value>,
}
