//! The campaign create/edit form.
//!
//! The form holds what a user is editing: plain text for the scalar fields
//! and a [`ChannelInput`] per channel slot whose override is edited as
//! canonical JSON text. [`CampaignForm::submit`] runs every rule, and only a
//! form without violations yields a [`ValidatedCampaign`] that can be turned
//! into a create or update payload.

use std::collections::HashSet;

use validator::Validate;

use crate::campaign::{Campaign, CampaignType, CreateCampaign, UpdateCampaign};
use crate::channel::{ChannelBinding, ChannelConfig, ChannelSlot};
use crate::lifecycle::INITIAL_STATUS;
use crate::types::RecordId;
use crate::validation::FormErrors;

/// Message for a `type` value outside {OUTBOUND, INBOUND}.
pub const INVALID_TYPE_MESSAGE: &str = "Please enter a valid type";

/// One channel slot as edited in the form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelInput {
    pub service_id: Option<RecordId>,
    pub config: ChannelConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct CampaignForm {
    #[validate(length(min = 2, message = "Please enter a valid name"))]
    pub name: String,
    pub description: Option<String>,
    /// Raw `type` selection; parsed on submit.
    pub campaign_type: String,
    #[validate(length(min = 2, message = "Please enter a valid prompt"))]
    pub prompt: String,
    pub initial_message: String,
    pub telephony: ChannelInput,
    pub transcriber: ChannelInput,
    pub agent: ChannelInput,
    pub synthesizer: ChannelInput,
    pub customer_sets: Vec<RecordId>,
}

impl CampaignForm {
    /// Start an edit session from a stored campaign.
    pub fn from_campaign(campaign: &Campaign) -> Self {
        let input = |slot| {
            let binding = campaign.channel(slot);
            ChannelInput {
                service_id: binding.service_id,
                config: ChannelConfig::from_stored(binding.config.as_ref()),
            }
        };
        Self {
            name: campaign.name.clone().unwrap_or_default(),
            description: campaign.description.clone(),
            campaign_type: campaign.campaign_type.as_str().to_string(),
            prompt: campaign.prompt.clone(),
            initial_message: campaign.initial_message.clone(),
            telephony: input(ChannelSlot::Telephony),
            transcriber: input(ChannelSlot::Transcriber),
            agent: input(ChannelSlot::Agent),
            synthesizer: input(ChannelSlot::Synthesizer),
            customer_sets: campaign.customer_sets.clone(),
        }
    }

    pub fn channel(&self, slot: ChannelSlot) -> &ChannelInput {
        match slot {
            ChannelSlot::Telephony => &self.telephony,
            ChannelSlot::Transcriber => &self.transcriber,
            ChannelSlot::Agent => &self.agent,
            ChannelSlot::Synthesizer => &self.synthesizer,
        }
    }

    pub fn channel_mut(&mut self, slot: ChannelSlot) -> &mut ChannelInput {
        match slot {
            ChannelSlot::Telephony => &mut self.telephony,
            ChannelSlot::Transcriber => &mut self.transcriber,
            ChannelSlot::Agent => &mut self.agent,
            ChannelSlot::Synthesizer => &mut self.synthesizer,
        }
    }

    /// Text shown in the override editor for `slot`.
    pub fn config_text(&self, slot: ChannelSlot) -> Option<String> {
        self.channel(slot).config.edit_text()
    }

    /// Replace the override for `slot` with edited text.
    pub fn set_config_text(&mut self, slot: ChannelSlot, text: Option<&str>) {
        self.channel_mut(slot).config = ChannelConfig::from_text(text);
    }

    /// Run every rule and collect all violations.
    pub fn submit(&self) -> Result<ValidatedCampaign, FormErrors> {
        let mut errors = FormErrors::new();

        if let Err(report) = self.validate() {
            errors.absorb(&report);
        }

        let campaign_type = match self.campaign_type.parse::<CampaignType>() {
            Ok(t) => Some(t),
            Err(_) => {
                errors.add("type", INVALID_TYPE_MESSAGE);
                None
            }
        };

        let mut bindings: [ChannelBinding; 4] = Default::default();
        for (slot, binding) in ChannelSlot::ALL.into_iter().zip(bindings.iter_mut()) {
            let input = self.channel(slot);
            match input.config.to_wire() {
                Ok(config) => {
                    *binding = ChannelBinding {
                        service_id: input.service_id.clone(),
                        config,
                    };
                }
                Err(message) => errors.add(slot.config_field(), message),
            }
        }

        let Some(campaign_type) = campaign_type else {
            return Err(errors);
        };

        let [telephony, transcriber, agent, synthesizer] = bindings;
        errors.into_result(ValidatedCampaign {
            name: self.name.clone(),
            description: self.description.clone(),
            campaign_type,
            prompt: self.prompt.clone(),
            initial_message: self.initial_message.clone(),
            telephony,
            transcriber,
            agent,
            synthesizer,
            customer_sets: dedup_preserving_order(&self.customer_sets),
        })
    }
}

/// A form that passed every rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCampaign {
    pub name: String,
    pub description: Option<String>,
    pub campaign_type: CampaignType,
    pub prompt: String,
    pub initial_message: String,
    pub telephony: ChannelBinding,
    pub transcriber: ChannelBinding,
    pub agent: ChannelBinding,
    pub synthesizer: ChannelBinding,
    pub customer_sets: Vec<RecordId>,
}

impl ValidatedCampaign {
    /// Creation payload. New campaigns start IDLE with zero bounds, no end
    /// date and no customer sets; targets are attached by later edits.
    pub fn into_create(self, organization_id: RecordId) -> CreateCampaign {
        CreateCampaign {
            organization_id,
            name: self.name,
            description: self.description,
            campaign_type: self.campaign_type,
            status: INITIAL_STATUS,
            prompt: self.prompt,
            initial_message: self.initial_message,
            max_duration: 0,
            max_retries: 0,
            end_date: None,
            language: None,
            telephony_service_id: self.telephony.service_id,
            telephony_service_config: self.telephony.config,
            transcriber_id: self.transcriber.service_id,
            transcriber_config: self.transcriber.config,
            agent_id: self.agent.service_id,
            agent_config: self.agent.config,
            synthesizer_id: self.synthesizer.service_id,
            synthesizer_config: self.synthesizer.config,
            customer_sets: Vec::new(),
        }
    }

    /// Update payload carrying the full customer set membership.
    pub fn into_update(self) -> UpdateCampaign {
        UpdateCampaign {
            name: self.name,
            description: self.description,
            campaign_type: self.campaign_type,
            prompt: self.prompt,
            initial_message: self.initial_message,
            max_duration: None,
            max_retries: None,
            end_date: None,
            language: None,
            telephony_service_id: self.telephony.service_id,
            telephony_service_config: self.telephony.config,
            transcriber_id: self.transcriber.service_id,
            transcriber_config: self.transcriber.config,
            agent_id: self.agent.service_id,
            agent_config: self.agent.config,
            synthesizer_id: self.synthesizer.service_id,
            synthesizer_config: self.synthesizer.config,
            customer_sets: self.customer_sets,
        }
    }
}

fn dedup_preserving_order(ids: &[RecordId]) -> Vec<RecordId> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::CampaignStatus;
    use crate::validation::INVALID_JSON_MESSAGE;
    use serde_json::json;

    fn filled_form() -> CampaignForm {
        CampaignForm {
            name: "Sale Outreach".to_string(),
            campaign_type: "OUTBOUND".to_string(),
            prompt: "Greet and pitch".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_form_creates_idle_campaign() {
        let create = filled_form()
            .submit()
            .unwrap()
            .into_create("org-1".to_string());

        assert_eq!(create.status, CampaignStatus::Idle);
        assert_eq!(create.campaign_type, CampaignType::Outbound);
        assert!(create.customer_sets.is_empty());
        assert_eq!((create.max_duration, create.max_retries), (0, 0));
        assert_eq!(create.end_date, None);
    }

    #[test]
    fn short_name_and_prompt_are_reported_together() {
        let form = CampaignForm {
            name: "A".to_string(),
            prompt: "x".to_string(),
            campaign_type: "OUTBOUND".to_string(),
            ..Default::default()
        };
        let errors = form.submit().unwrap_err();
        assert_eq!(errors.get("name"), Some(&["Please enter a valid name".to_string()][..]));
        assert_eq!(
            errors.get("prompt"),
            Some(&["Please enter a valid prompt".to_string()][..])
        );
    }

    #[test]
    fn unknown_type_is_a_field_error() {
        let form = CampaignForm {
            campaign_type: "BROADCAST".to_string(),
            ..filled_form()
        };
        let errors = form.submit().unwrap_err();
        assert_eq!(errors.get("type"), Some(&[INVALID_TYPE_MESSAGE.to_string()][..]));
    }

    #[test]
    fn invalid_override_is_tagged_to_its_field() {
        let mut form = filled_form();
        form.set_config_text(ChannelSlot::Synthesizer, Some("{voice: maya}"));
        form.set_config_text(ChannelSlot::Agent, Some("{\"temperature\": 0.5}"));

        let errors = form.submit().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["synthesizer_config"]);
        assert_eq!(
            errors.get("synthesizer_config"),
            Some(&[INVALID_JSON_MESSAGE.to_string()][..])
        );
    }

    #[test]
    fn reference_and_override_are_transmitted_independently() {
        let mut form = filled_form();
        form.telephony.service_id = Some("tel-1".to_string());
        form.set_config_text(ChannelSlot::Telephony, Some("{}"));
        form.set_config_text(ChannelSlot::Synthesizer, Some("{\"voice\": \"maya\"}"));

        let body = serde_json::to_value(form.submit().unwrap().into_create("org-1".into()))
            .unwrap();
        assert_eq!(body["telephony_service_id"], "tel-1");
        assert_eq!(body["telephony_service_config"], json!({}));
        assert!(body["transcriber_id"].is_null());
        assert!(body["transcriber_config"].is_null());
        assert!(body["synthesizer_id"].is_null());
        assert_eq!(body["synthesizer_config"], json!({"voice": "maya"}));
        assert_eq!(body["status"], "IDLE");
    }

    #[test]
    fn editing_without_changes_submits_the_stored_values() {
        let campaign: Campaign = serde_json::from_value(json!({
            "id": "cmp-1",
            "organization_id": "org-1",
            "name": "Renewals",
            "type": "INBOUND",
            "status": "RUNNING",
            "prompt": "Answer renewal questions",
            "agent_id": "agt-1",
            "agent_config": {"temperature": 0.5, "goodbye_phrases": ["bye"]},
            "telephony_service_config": {},
            "customer_sets": ["cs-1", "cs-2"]
        }))
        .unwrap();

        let mut form = CampaignForm::from_campaign(&campaign);
        for slot in ChannelSlot::ALL {
            let text = form.config_text(slot);
            form.set_config_text(slot, text.as_deref());
        }

        let update = form.submit().unwrap().into_update();
        assert_eq!(update.agent_id.as_deref(), Some("agt-1"));
        assert_eq!(update.agent_config, campaign.agent_config);
        assert_eq!(update.telephony_service_config, Some(json!({})));
        assert_eq!(update.synthesizer_config, None);
        assert_eq!(update.customer_sets, vec!["cs-1", "cs-2"]);
    }

    #[test]
    fn update_sends_full_deduplicated_membership() {
        let mut form = filled_form();
        form.customer_sets = vec!["cs-3".into(), "cs-1".into(), "cs-3".into()];

        let body = serde_json::to_value(form.submit().unwrap().into_update()).unwrap();
        assert_eq!(body["customer_sets"], json!(["cs-3", "cs-1"]));
        assert!(body.get("max_retries").is_none());
    }

    #[test]
    fn empty_membership_is_still_sent() {
        let body = serde_json::to_value(filled_form().submit().unwrap().into_update()).unwrap();
        assert_eq!(body["customer_sets"], json!([]));
    }
}
