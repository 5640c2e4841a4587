use crate::campaign::CampaignStatus;
use crate::lifecycle::CampaignAction;
use crate::validation::FormErrors;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(FormErrors),

    #[error("Action {action} is not allowed while the campaign is {status}")]
    ActionNotAllowed {
        action: CampaignAction,
        status: CampaignStatus,
    },

    #[error("Invalid value for {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },
}

impl From<FormErrors> for CoreError {
    fn from(errors: FormErrors) -> Self {
        CoreError::Validation(errors)
    }
}
