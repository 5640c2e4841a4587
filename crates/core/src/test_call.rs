//! One-off test calls placed through `POST /calls/outbound`.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::validation::FormErrors;

pub const DEFAULT_VOICE: &str = "hi-IN-Standard-B";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterruptSensitivity {
    #[default]
    Low,
    High,
}

impl std::str::FromStr for InterruptSensitivity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "high" => Ok(Self::High),
            other => Err(CoreError::InvalidValue {
                field: "interrupt_sensitivity",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesizerKind {
    #[default]
    Google,
    Elevenlabs,
}

impl std::str::FromStr for SynthesizerKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "elevenlabs" => Ok(Self::Elevenlabs),
            other => Err(CoreError::InvalidValue {
                field: "synthesizer",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct TestCallForm {
    #[validate(length(min = 10, message = "Please enter a valid mobile number"))]
    pub mobile_number: String,
    #[validate(length(min = 2, message = "Please enter a valid name"))]
    pub name: String,
    #[validate(length(min = 2, message = "Please enter a valid company name"))]
    pub company: String,
    #[validate(length(min = 2, message = "Please enter a valid company product"))]
    pub company_product: String,
    /// Blank means "use the backend's default prompt".
    pub prompt: String,
    pub initial_message: String,
    pub interrupt_sensitivity: InterruptSensitivity,
    pub synthesizer: SynthesizerKind,
    #[validate(length(min = 2, message = "Please enter a valid voice"))]
    pub voice: String,
}

impl Default for TestCallForm {
    fn default() -> Self {
        Self {
            mobile_number: String::new(),
            name: String::new(),
            company: String::new(),
            company_product: String::new(),
            prompt: String::new(),
            initial_message: String::new(),
            interrupt_sensitivity: InterruptSensitivity::default(),
            synthesizer: SynthesizerKind::default(),
            voice: DEFAULT_VOICE.to_string(),
        }
    }
}

impl TestCallForm {
    pub fn submit(&self) -> Result<OutboundCallRequest, FormErrors> {
        let mut errors = FormErrors::new();
        if let Err(report) = self.validate() {
            errors.absorb(&report);
        }
        errors.into_result(OutboundCallRequest {
            mobile_number: self.mobile_number.trim().to_string(),
            name: self.name.clone(),
            company: self.company.clone(),
            company_product: self.company_product.clone(),
            prompt: non_blank(&self.prompt),
            initial_message: non_blank(&self.initial_message),
            interrupt_sensitivity: self.interrupt_sensitivity,
            synthesizer: self.synthesizer,
            voice: self.voice.clone(),
        })
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| text.to_string())
}

/// Body of `POST /calls/outbound`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundCallRequest {
    pub mobile_number: String,
    pub name: String,
    pub company: String,
    pub company_product: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_message: Option<String>,
    pub interrupt_sensitivity: InterruptSensitivity,
    pub synthesizer: SynthesizerKind,
    pub voice: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filled() -> TestCallForm {
        TestCallForm {
            mobile_number: "9876543210".into(),
            name: "Asha".into(),
            company: "Acme".into(),
            company_product: "Solar panels".into(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_match_the_test_call_page() {
        let form = TestCallForm::default();
        assert_eq!(form.interrupt_sensitivity, InterruptSensitivity::Low);
        assert_eq!(form.synthesizer, SynthesizerKind::Google);
        assert_eq!(form.voice, DEFAULT_VOICE);
    }

    #[test]
    fn blank_form_reports_every_required_field() {
        let errors = TestCallForm::default().submit().unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["company", "company_product", "mobile_number", "name"]
        );
        assert_eq!(
            errors.get("mobile_number"),
            Some(&["Please enter a valid mobile number".to_string()][..])
        );
    }

    #[test]
    fn blank_prompt_and_greeting_are_left_to_the_backend() {
        let body = serde_json::to_value(filled().submit().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "mobile_number": "9876543210",
                "name": "Asha",
                "company": "Acme",
                "company_product": "Solar panels",
                "interrupt_sensitivity": "low",
                "synthesizer": "google",
                "voice": "hi-IN-Standard-B"
            })
        );
    }

    #[test]
    fn custom_prompt_is_sent() {
        let form = TestCallForm {
            prompt: "Pitch the annual plan".into(),
            synthesizer: SynthesizerKind::Elevenlabs,
            ..filled()
        };
        let body = serde_json::to_value(form.submit().unwrap()).unwrap();
        assert_eq!(body["prompt"], "Pitch the annual plan");
        assert_eq!(body["synthesizer"], "elevenlabs");
    }

    #[test]
    fn sensitivity_parses_lowercase_only() {
        assert_eq!("high".parse::<InterruptSensitivity>().unwrap(), InterruptSensitivity::High);
        assert!("HIGH".parse::<InterruptSensitivity>().is_err());
    }
}
