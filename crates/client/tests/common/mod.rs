//! Shared helpers for the client integration tests.

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::MockServer;

use olive_client::dashboard::Dashboard;
use olive_client::session::{Session, SessionProvider, SessionStore, SessionUser};

pub const TOKEN: &str = "test-access-token";
pub const ORG_ID: &str = "org-1";

pub fn session() -> Session {
    Session {
        user: SessionUser {
            id: "usr-1".to_string(),
            email: Some("ops@olive.test".to_string()),
            organization_id: Some(ORG_ID.to_string()),
        },
        access_token: TOKEN.to_string(),
    }
}

/// A dashboard pointed at `server`, signed in, plus its session store.
pub fn signed_in(server: &MockServer) -> (Dashboard, Arc<SessionStore>) {
    let store = Arc::new(SessionStore::new(Some(session())));
    let provider: Arc<dyn SessionProvider> = store.clone();
    (Dashboard::connect(server.uri(), provider), store)
}

pub fn campaign_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "organization_id": ORG_ID,
        "name": "Sale Outreach",
        "description": null,
        "type": "OUTBOUND",
        "status": status,
        "prompt": "Greet and pitch",
        "initial_message": "",
        "max_duration": 0,
        "max_retries": 0,
        "end_date": null,
        "telephony_service_id": null,
        "telephony_service_config": null,
        "transcriber_id": null,
        "transcriber_config": null,
        "agent_id": null,
        "agent_config": null,
        "synthesizer_id": null,
        "synthesizer_config": null,
        "customer_sets": []
    })
}

pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or_default()
}
