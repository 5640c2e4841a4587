//! Session state: who is signed in and which credential to send.
//!
//! The client never reads ambient globals for auth. A [`SessionProvider`]
//! is handed to [`crate::api::OliveApi`] and [`crate::dashboard::Dashboard`]
//! at construction, and [`SessionStore`] is the in-process implementation
//! whose changes can be observed through a watch channel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use olive_core::types::RecordId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: RecordId,
    #[serde(default)]
    pub email: Option<String>,
    /// Tenant new records are created under.
    #[serde(default)]
    pub organization_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: SessionUser,
    pub access_token: String,
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_user(&self) -> Option<SessionUser>;

    /// Bearer credential for the next request; empty when signed out.
    async fn access_token(&self) -> String;

    /// Drop the current session.
    async fn logout(&self);
}

/// Session held in memory and published on every change.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<Option<Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionStore {
    pub fn new(session: Option<Session>) -> Self {
        let (tx, _rx) = watch::channel(session);
        Self { tx }
    }

    pub fn sign_in(&self, session: Session) {
        tracing::info!(user_id = %session.user.id, "Signed in");
        self.tx.send_replace(Some(session));
    }

    /// Receiver that observes every sign-in and logout.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    pub fn session(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }
}

#[async_trait]
impl SessionProvider for SessionStore {
    async fn current_user(&self) -> Option<SessionUser> {
        self.tx.borrow().as_ref().map(|s| s.user.clone())
    }

    async fn access_token(&self) -> String {
        self.tx
            .borrow()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_default()
    }

    async fn logout(&self) {
        if self.tx.send_replace(None).is_some() {
            tracing::info!("Signed out");
        }
    }
}
