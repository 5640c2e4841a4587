//! Campaign records as exchanged with the backend.
//!
//! The full set of campaign statuses belongs to the execution engine. The
//! values we know about get their own variants; anything else round-trips
//! untouched through [`CampaignStatus::Other`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::channel::{ChannelBinding, ChannelSlot};
use crate::error::CoreError;
use crate::types::RecordId;

/* --------------------------------------------------------------------------
   Campaign type
   -------------------------------------------------------------------------- */

/// Direction of the calls a campaign places or receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CampaignType {
    Outbound,
    Inbound,
}

impl CampaignType {
    pub const ALL: [CampaignType; 2] = [CampaignType::Outbound, CampaignType::Inbound];

    pub fn as_str(self) -> &'static str {
        match self {
            CampaignType::Outbound => "OUTBOUND",
            CampaignType::Inbound => "INBOUND",
        }
    }
}

impl fmt::Display for CampaignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::InvalidValue {
                field: "type",
                value: s.to_string(),
            })
    }
}

/* --------------------------------------------------------------------------
   Campaign status
   -------------------------------------------------------------------------- */

/// Lifecycle label reported by the execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CampaignStatus {
    Draft,
    Ready,
    Idle,
    Running,
    Completed,
    /// A status this client does not know; preserved verbatim.
    Other(String),
}

impl CampaignStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CampaignStatus::Draft => "DRAFT",
            CampaignStatus::Ready => "READY",
            CampaignStatus::Idle => "IDLE",
            CampaignStatus::Running => "RUNNING",
            CampaignStatus::Completed => "COMPLETED",
            CampaignStatus::Other(raw) => raw,
        }
    }

    /// The only distinction the dashboard draws between statuses.
    pub fn is_running(&self) -> bool {
        matches!(self, CampaignStatus::Running)
    }
}

impl From<String> for CampaignStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "DRAFT" => CampaignStatus::Draft,
            "READY" => CampaignStatus::Ready,
            "IDLE" => CampaignStatus::Idle,
            "RUNNING" => CampaignStatus::Running,
            "COMPLETED" => CampaignStatus::Completed,
            _ => CampaignStatus::Other(raw),
        }
    }
}

impl From<&str> for CampaignStatus {
    fn from(raw: &str) -> Self {
        CampaignStatus::from(raw.to_string())
    }
}

impl From<CampaignStatus> for String {
    fn from(status: CampaignStatus) -> Self {
        match status {
            CampaignStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/* --------------------------------------------------------------------------
   Records
   -------------------------------------------------------------------------- */

/// A campaign as returned by `GET /campaigns` and `GET /campaigns/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: RecordId,
    pub organization_id: RecordId,
    /// Stored campaigns may be unnamed.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub campaign_type: CampaignType,
    pub status: CampaignStatus,
    pub prompt: String,
    #[serde(default)]
    pub initial_message: String,
    #[serde(default)]
    pub max_duration: u32,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub telephony_service_id: Option<RecordId>,
    #[serde(default)]
    pub telephony_service_config: Option<serde_json::Value>,
    #[serde(default)]
    pub transcriber_id: Option<RecordId>,
    #[serde(default)]
    pub transcriber_config: Option<serde_json::Value>,
    #[serde(default)]
    pub agent_id: Option<RecordId>,
    #[serde(default)]
    pub agent_config: Option<serde_json::Value>,
    #[serde(default)]
    pub synthesizer_id: Option<RecordId>,
    #[serde(default)]
    pub synthesizer_config: Option<serde_json::Value>,
    #[serde(default)]
    pub customer_sets: Vec<RecordId>,
}

impl Campaign {
    /// The service reference and override stored for one channel slot.
    pub fn channel(&self, slot: ChannelSlot) -> ChannelBinding {
        let (service_id, config) = match slot {
            ChannelSlot::Telephony => (&self.telephony_service_id, &self.telephony_service_config),
            ChannelSlot::Transcriber => (&self.transcriber_id, &self.transcriber_config),
            ChannelSlot::Agent => (&self.agent_id, &self.agent_config),
            ChannelSlot::Synthesizer => (&self.synthesizer_id, &self.synthesizer_config),
        };
        ChannelBinding {
            service_id: service_id.clone(),
            config: config.clone(),
        }
    }

    /// Name for display; empty when the stored name is null.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Customer set membership; order carries no meaning.
    pub fn customer_set_ids(&self) -> BTreeSet<&str> {
        self.customer_sets.iter().map(String::as_str).collect()
    }
}

/// Body of `POST /campaigns`.
///
/// Channel fields are always serialized, so an absent override goes over
/// the wire as `null` and an empty override as `{}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCampaign {
    pub organization_id: RecordId,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub campaign_type: CampaignType,
    pub status: CampaignStatus,
    pub prompt: String,
    pub initial_message: String,
    pub max_duration: u32,
    pub max_retries: u32,
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub telephony_service_id: Option<RecordId>,
    pub telephony_service_config: Option<serde_json::Value>,
    pub transcriber_id: Option<RecordId>,
    pub transcriber_config: Option<serde_json::Value>,
    pub agent_id: Option<RecordId>,
    pub agent_config: Option<serde_json::Value>,
    pub synthesizer_id: Option<RecordId>,
    pub synthesizer_config: Option<serde_json::Value>,
    pub customer_sets: Vec<RecordId>,
}

/// Body of `PATCH /campaigns/{id}` as produced by the campaign form.
///
/// Form-owned fields are always present; the numeric bounds, end date and
/// language are only sent when explicitly set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCampaign {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub campaign_type: CampaignType,
    pub prompt: String,
    pub initial_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub telephony_service_id: Option<RecordId>,
    pub telephony_service_config: Option<serde_json::Value>,
    pub transcriber_id: Option<RecordId>,
    pub transcriber_config: Option<serde_json::Value>,
    pub agent_id: Option<RecordId>,
    pub agent_config: Option<serde_json::Value>,
    pub synthesizer_id: Option<RecordId>,
    pub synthesizer_config: Option<serde_json::Value>,
    /// Full membership; the backend replaces the association wholesale.
    pub customer_sets: Vec<RecordId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn stored_campaign() -> serde_json::Value {
        json!({
            "id": "cmp-1",
            "organization_id": "org-1",
            "name": "Sale Outreach",
            "description": null,
            "type": "OUTBOUND",
            "status": "PAUSED_BY_ENGINE",
            "prompt": "Greet and pitch",
            "initial_message": "Hello",
            "max_duration": 300,
            "max_retries": 2,
            "end_date": "2024-12-31",
            "telephony_service_id": "tel-1",
            "telephony_service_config": {},
            "transcriber_id": null,
            "transcriber_config": null,
            "agent_id": null,
            "agent_config": {"temperature": 0.5},
            "synthesizer_id": null,
            "synthesizer_config": null,
            "customer_sets": ["cs-2", "cs-1"]
        })
    }

    #[test]
    fn campaign_type_parses_known_values_only() {
        assert_eq!("INBOUND".parse::<CampaignType>().unwrap(), CampaignType::Inbound);
        assert_matches!(
            "outbound".parse::<CampaignType>(),
            Err(CoreError::InvalidValue { field: "type", .. })
        );
    }

    #[test]
    fn unknown_status_round_trips_verbatim() {
        let campaign: Campaign = serde_json::from_value(stored_campaign()).unwrap();
        assert_eq!(
            campaign.status,
            CampaignStatus::Other("PAUSED_BY_ENGINE".to_string())
        );
        let back = serde_json::to_value(&campaign).unwrap();
        assert_eq!(back["status"], "PAUSED_BY_ENGINE");
    }

    #[test]
    fn only_running_counts_as_running() {
        assert!(CampaignStatus::from("RUNNING").is_running());
        for raw in ["DRAFT", "READY", "IDLE", "COMPLETED", "running"] {
            assert!(!CampaignStatus::from(raw).is_running(), "{raw}");
        }
    }

    #[test]
    fn empty_override_is_distinct_from_null() {
        let campaign: Campaign = serde_json::from_value(stored_campaign()).unwrap();
        let telephony = campaign.channel(ChannelSlot::Telephony);
        assert_eq!(telephony.config, Some(json!({})));
        assert_eq!(campaign.channel(ChannelSlot::Transcriber).config, None);

        let back = serde_json::to_value(&campaign).unwrap();
        assert_eq!(back["telephony_service_config"], json!({}));
        assert!(back["transcriber_config"].is_null());
    }

    #[test]
    fn customer_set_membership_ignores_order() {
        let campaign: Campaign = serde_json::from_value(stored_campaign()).unwrap();
        let ids: Vec<_> = campaign.customer_set_ids().into_iter().collect();
        assert_eq!(ids, vec!["cs-1", "cs-2"]);
    }

    #[test]
    fn unnamed_campaign_still_decodes() {
        let mut stored = stored_campaign();
        stored["name"] = serde_json::Value::Null;
        let campaign: Campaign = serde_json::from_value(stored).unwrap();
        assert_eq!(campaign.name, None);
        assert_eq!(campaign.display_name(), "");

        let mut stored = stored_campaign();
        stored.as_object_mut().unwrap().remove("name");
        let campaign: Campaign = serde_json::from_value(stored).unwrap();
        assert_eq!(campaign.name, None);
    }

    #[test]
    fn end_date_parses_as_calendar_date() {
        let campaign: Campaign = serde_json::from_value(stored_campaign()).unwrap();
        assert_eq!(campaign.end_date, NaiveDate::from_ymd_opt(2024, 12, 31));
    }
}
