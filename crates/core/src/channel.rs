//! Per-channel service configuration.
//!
//! A campaign has four channel slots (telephony, transcriber, agent,
//! synthesizer). Each slot independently carries an optional reference to a
//! registered service and an optional JSON override. How the two combine is
//! decided by the execution engine; this side only has to transmit both
//! faithfully, keeping `null` and `{}` apart.
//!
//! Overrides are edited as text. [`ChannelConfig`] holds the three states an
//! edited override can be in, so a half-typed value never masquerades as a
//! parsed one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::RecordId;
use crate::validation::INVALID_JSON_MESSAGE;

/* --------------------------------------------------------------------------
   Slots
   -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSlot {
    Telephony,
    Transcriber,
    Agent,
    Synthesizer,
}

impl ChannelSlot {
    pub const ALL: [ChannelSlot; 4] = [
        ChannelSlot::Telephony,
        ChannelSlot::Transcriber,
        ChannelSlot::Agent,
        ChannelSlot::Synthesizer,
    ];

    /// Wire name of the service reference field.
    pub fn id_field(self) -> &'static str {
        match self {
            ChannelSlot::Telephony => "telephony_service_id",
            ChannelSlot::Transcriber => "transcriber_id",
            ChannelSlot::Agent => "agent_id",
            ChannelSlot::Synthesizer => "synthesizer_id",
        }
    }

    /// Wire name of the override field; validation errors are keyed by it.
    pub fn config_field(self) -> &'static str {
        match self {
            ChannelSlot::Telephony => "telephony_service_config",
            ChannelSlot::Transcriber => "transcriber_config",
            ChannelSlot::Agent => "agent_config",
            ChannelSlot::Synthesizer => "synthesizer_config",
        }
    }
}

impl fmt::Display for ChannelSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChannelSlot::Telephony => "telephony",
            ChannelSlot::Transcriber => "transcriber",
            ChannelSlot::Agent => "agent",
            ChannelSlot::Synthesizer => "synthesizer",
        };
        f.write_str(label)
    }
}

/* --------------------------------------------------------------------------
   Override value
   -------------------------------------------------------------------------- */

/// An override as it stands in an edit session.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ChannelConfig {
    /// No override.
    #[default]
    Absent,
    /// Text that does not parse as JSON. Kept so it can be shown back.
    InvalidText(String),
    /// A parsed override. May be an empty object.
    Valid(serde_json::Value),
}

impl ChannelConfig {
    /// Lift a stored override into an edit session.
    pub fn from_stored(value: Option<&serde_json::Value>) -> Self {
        match value {
            None | Some(serde_json::Value::Null) => ChannelConfig::Absent,
            Some(v) => ChannelConfig::Valid(v.clone()),
        }
    }

    /// Interpret text typed into an override input.
    ///
    /// Missing, blank, or literal `null` text means no override.
    pub fn from_text(text: Option<&str>) -> Self {
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            return ChannelConfig::Absent;
        };
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Null) => ChannelConfig::Absent,
            Ok(value) => ChannelConfig::Valid(value),
            Err(_) => ChannelConfig::InvalidText(text.to_string()),
        }
    }

    /// Text to place in the editor: canonical JSON for a parsed override,
    /// the raw text for an unparsable one.
    pub fn edit_text(&self) -> Option<String> {
        match self {
            ChannelConfig::Absent => None,
            ChannelConfig::InvalidText(raw) => Some(raw.clone()),
            ChannelConfig::Valid(value) => Some(canonical_json(value)),
        }
    }

    /// Value to submit, or the field-scoped message when the text is invalid.
    pub fn to_wire(&self) -> Result<Option<serde_json::Value>, &'static str> {
        match self {
            ChannelConfig::Absent => Ok(None),
            ChannelConfig::InvalidText(_) => Err(INVALID_JSON_MESSAGE),
            ChannelConfig::Valid(value) => Ok(Some(value.clone())),
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ChannelConfig::InvalidText(_))
    }
}

/// Pretty-printed JSON with two-space indentation.
///
/// Rendering a value parsed from its own rendering is a no-op.
pub fn canonical_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/* --------------------------------------------------------------------------
   Binding
   -------------------------------------------------------------------------- */

/// What a campaign says about one channel slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelBinding {
    pub service_id: Option<RecordId>,
    pub config: Option<serde_json::Value>,
}

/// How the execution engine is expected to resolve a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelResolution {
    /// Neither reference nor override: the organization default applies.
    OrganizationDefault,
    /// The referenced service's stored configuration applies.
    Service,
    /// The override is merged onto the referenced service's configuration.
    ServiceWithOverride,
    /// An unregistered, one-off configuration (used by test calls).
    AdHoc,
}

impl ChannelBinding {
    pub fn resolution(&self) -> ChannelResolution {
        match (&self.service_id, &self.config) {
            (None, None) => ChannelResolution::OrganizationDefault,
            (Some(_), None) => ChannelResolution::Service,
            (Some(_), Some(_)) => ChannelResolution::ServiceWithOverride,
            (None, Some(_)) => ChannelResolution::AdHoc,
        }
    }
}
