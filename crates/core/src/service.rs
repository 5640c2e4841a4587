//! Registered channel services (agents, synthesizers, transcribers,
//! telephony services).
//!
//! All four kinds share one record shape, `{id, name, config}`, and differ
//! only in the collection they live under.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelConfig, ChannelSlot};
use crate::error::CoreError;
use crate::types::RecordId;
use crate::validation::FormErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    Agent,
    Synthesizer,
    Transcriber,
    TelephonyService,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 4] = [
        ServiceKind::Agent,
        ServiceKind::Synthesizer,
        ServiceKind::Transcriber,
        ServiceKind::TelephonyService,
    ];

    /// Collection path segment, e.g. `telephony-services`.
    pub fn collection(self) -> &'static str {
        match self {
            ServiceKind::Agent => "agents",
            ServiceKind::Synthesizer => "synthesizers",
            ServiceKind::Transcriber => "transcribers",
            ServiceKind::TelephonyService => "telephony-services",
        }
    }

    /// The campaign channel slot this kind of service fills.
    pub fn slot(self) -> ChannelSlot {
        match self {
            ServiceKind::Agent => ChannelSlot::Agent,
            ServiceKind::Synthesizer => ChannelSlot::Synthesizer,
            ServiceKind::Transcriber => ChannelSlot::Transcriber,
            ServiceKind::TelephonyService => ChannelSlot::Telephony,
        }
    }

    fn singular(self) -> &'static str {
        match self {
            ServiceKind::Agent => "agent",
            ServiceKind::Synthesizer => "synthesizer",
            ServiceKind::Transcriber => "transcriber",
            ServiceKind::TelephonyService => "telephony-service",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

impl FromStr for ServiceKind {
    type Err = CoreError;

    /// Accepts the singular or collection form (`agent`, `agents`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.singular() == s || kind.collection() == s)
            .ok_or_else(|| CoreError::InvalidValue {
                field: "kind",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

/// Body of `POST /{collection}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateService {
    pub name: String,
    pub config: serde_json::Value,
}

impl CreateService {
    /// Build from form input, with the configuration edited as JSON text.
    ///
    /// The name must be non-blank and the configuration must be a JSON
    /// object; blank configuration text means `{}`.
    pub fn from_text(name: &str, config_text: Option<&str>) -> Result<Self, CoreError> {
        let mut errors = FormErrors::new();
        if name.trim().is_empty() {
            errors.add("name", "Please enter a valid name");
        }
        let config = parse_object(config_text, &mut errors);
        errors
            .into_result(Self {
                name: name.to_string(),
                config: config.unwrap_or_else(|| serde_json::json!({})),
            })
            .map_err(CoreError::from)
    }
}

/// Body of `PATCH /{collection}/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateService {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl UpdateService {
    pub fn from_text(name: Option<&str>, config_text: Option<&str>) -> Result<Self, CoreError> {
        let mut errors = FormErrors::new();
        if name.is_some_and(|n| n.trim().is_empty()) {
            errors.add("name", "Please enter a valid name");
        }
        let config = parse_object(config_text, &mut errors);
        errors
            .into_result(Self {
                name: name.map(str::to_string),
                config,
            })
            .map_err(CoreError::from)
    }
}

fn parse_object(text: Option<&str>, errors: &mut FormErrors) -> Option<serde_json::Value> {
    match ChannelConfig::from_text(text).to_wire() {
        Ok(Some(value)) if value.is_object() => Some(value),
        Ok(Some(_)) => {
            errors.add("config", "Configuration must be a JSON object");
            None
        }
        Ok(None) => None,
        Err(message) => {
            errors.add("config", message);
            None
        }
    }
}
