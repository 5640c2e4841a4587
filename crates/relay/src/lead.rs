//! Lead submissions and the call request built from them.

use serde::{Deserialize, Serialize};

pub const DEFAULT_COUNTRY_CODE: &str = "+91";
pub const DEFAULT_VOICE: &str = "maya";

/// Agent instructions. `{name}`, `{company}` and `{company_product}` are
/// filled from the lead.
pub const DEFAULT_TASK_TEMPLATE: &str = "You're Lucy, a relationship manager at {company}. \
You are calling a customer who left items in their cart without completing the order, \
and your goal is to convince them to go through with it. You may offer a discount \
coupon code if you think it will help. Example dialogue: \
Person: Hello? \
You: Hi, this is Lucy from {company}. Could you confirm your name for me? \
Person: Oh hi, this is {name}. \
You: Hi {name}, great to meet you! I noticed you recently left {company_product} in your cart \
on our website. I wanted to see if you had any questions or needed help with your order. \
Person: I got busy and couldn't complete the purchase. \
You: No worries at all. If it helps, I can offer you 10% off with the coupon code SAVE10. \
Person: That sounds good, but I need to check with my team first. \
You: I understand. Would it help if I follow up tomorrow? How about 10 AM or 3 PM? \
Person: 10 AM works. \
You: Great, I'll call you at 10 AM tomorrow. Is there anything else you need in the meantime? \
Person: No, that's all. \
You: Perfect. Have a great day! Goodbye!";

pub const DEFAULT_FIRST_SENTENCE_TEMPLATE: &str = "Hello {name}, this is a representative \
from {company}. We noticed you added {company_product} to your cart but haven't completed \
the purchase. We are offering you a special discount to complete your purchase.";

/// Body of `POST /api/webhook`. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadSubmission {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub company: String,
    pub company_product: String,
}

impl LeadSubmission {
    /// Spreadsheet row, in column order A..E.
    pub fn sheet_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.company.clone(),
            self.company_product.clone(),
        ]
    }

    fn placeholder(&self, key: &str) -> Option<&str> {
        match key {
            "name" => Some(&self.name),
            "company" => Some(&self.company),
            "company_product" => Some(&self.company_product),
            _ => None,
        }
    }
}

/// Substitute lead fields into `template` in a single pass. Unknown
/// placeholders are left as written.
pub fn render_template(template: &str, lead: &LeadSubmission) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let substituted = tail.find('}').and_then(|close| {
            lead.placeholder(&tail[1..close])
                .map(|value| (value, &tail[close + 1..]))
        });
        match substituted {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Fixed parts of every call request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSettings {
    pub country_code: String,
    pub voice: String,
    pub task_template: String,
    pub first_sentence_template: String,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            task_template: DEFAULT_TASK_TEMPLATE.to_string(),
            first_sentence_template: DEFAULT_FIRST_SENTENCE_TEMPLATE.to_string(),
        }
    }
}

/// Request body for the voice-call API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallPayload {
    pub phone_number: String,
    pub task: String,
    pub voice: String,
    pub first_sentence: String,
    pub wait_for_greeting: bool,
    pub block_interruptions: bool,
    pub interruption_threshold: u32,
    pub model: String,
    pub keywords: Vec<String>,
    pub language: String,
    pub record: bool,
    pub answered_by_enabled: bool,
}

impl CallPayload {
    pub fn for_lead(lead: &LeadSubmission, settings: &CallSettings) -> Self {
        Self {
            phone_number: format!("{}{}", settings.country_code, lead.phone),
            task: render_template(&settings.task_template, lead),
            voice: settings.voice.clone(),
            first_sentence: render_template(&settings.first_sentence_template, lead),
            wait_for_greeting: false,
            block_interruptions: false,
            interruption_threshold: 50,
            model: "enhanced".to_string(),
            keywords: ["discount", "offer", "purchase"]
                .into_iter()
                .map(String::from)
                .collect(),
            language: "en".to_string(),
            record: true,
            answered_by_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lead() -> LeadSubmission {
        LeadSubmission {
            name: "Asha".into(),
            phone: "9876543210".into(),
            email: "asha@example.com".into(),
            company: "Acme".into(),
            company_product: "Solar panels".into(),
        }
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let lead: LeadSubmission = serde_json::from_value(json!({"name": "Asha"})).unwrap();
        assert_eq!(lead.phone, "");
        assert_eq!(lead.sheet_row(), vec!["Asha", "", "", "", ""]);
    }

    #[test]
    fn row_columns_are_name_email_phone_company_product() {
        assert_eq!(
            lead().sheet_row(),
            vec!["Asha", "asha@example.com", "9876543210", "Acme", "Solar panels"]
        );
    }

    #[test]
    fn templates_substitute_once_and_keep_unknown_placeholders() {
        let sneaky = LeadSubmission {
            name: "{company}".into(),
            company: "Acme".into(),
            ..Default::default()
        };
        assert_eq!(
            render_template("Hi {name} from {company} {unknown} {", &sneaky),
            "Hi {company} from Acme {unknown} {"
        );
    }

    #[test]
    fn payload_matches_call_api_contract() {
        let payload = serde_json::to_value(CallPayload::for_lead(&lead(), &CallSettings::default())).unwrap();
        assert_eq!(payload["phone_number"], "+919876543210");
        assert_eq!(payload["voice"], "maya");
        assert_eq!(payload["wait_for_greeting"], false);
        assert_eq!(payload["block_interruptions"], false);
        assert_eq!(payload["interruption_threshold"], 50);
        assert_eq!(payload["model"], "enhanced");
        assert_eq!(payload["keywords"], json!(["discount", "offer", "purchase"]));
        assert_eq!(payload["language"], "en");
        assert_eq!(payload["record"], true);
        assert_eq!(payload["answered_by_enabled"], true);
        assert!(payload["first_sentence"]
            .as_str()
            .unwrap()
            .starts_with("Hello Asha, this is a representative from Acme."));
        assert!(payload["task"].as_str().unwrap().contains("left Solar panels in your cart"));
    }
}
