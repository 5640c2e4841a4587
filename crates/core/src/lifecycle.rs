//! Campaign start/stop gating.
//!
//! The dashboard only distinguishes RUNNING from everything else. START is
//! offered while a campaign is not running and STOP while it is. An action is
//! a request to the execution engine: the status shown afterwards is whatever
//! the engine reports, never a locally assumed transition.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::campaign::CampaignStatus;
use crate::error::CoreError;
use crate::types::RecordId;

/// Status given to a freshly created campaign.
pub const INITIAL_STATUS: CampaignStatus = CampaignStatus::Idle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CampaignAction {
    Start,
    Stop,
}

impl CampaignAction {
    /// Status the engine is asked to move the campaign to.
    pub fn requested_status(self) -> CampaignStatus {
        match self {
            CampaignAction::Start => CampaignStatus::Running,
            CampaignAction::Stop => CampaignStatus::Idle,
        }
    }

    pub fn is_allowed(self, status: &CampaignStatus) -> bool {
        match self {
            CampaignAction::Start => !status.is_running(),
            CampaignAction::Stop => status.is_running(),
        }
    }
}

impl fmt::Display for CampaignAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CampaignAction::Start => f.write_str("START"),
            CampaignAction::Stop => f.write_str("STOP"),
        }
    }
}

/// The one action offered for a campaign in `status`.
pub fn available_action(status: &CampaignStatus) -> CampaignAction {
    if status.is_running() {
        CampaignAction::Stop
    } else {
        CampaignAction::Start
    }
}

/// Reject an action that is not legal for the displayed status.
pub fn check_action(action: CampaignAction, status: &CampaignStatus) -> Result<(), CoreError> {
    if action.is_allowed(status) {
        Ok(())
    } else {
        Err(CoreError::ActionNotAllowed {
            action,
            status: status.clone(),
        })
    }
}

/// Body of `POST /campaigns/{id}/execute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteCampaignRequest {
    pub action: CampaignAction,
}

/// Engine reply to an execute request. Fields beyond these are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteCampaignResponse {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub status: CampaignStatus,
    #[serde(default)]
    pub message: Option<String>,
}
