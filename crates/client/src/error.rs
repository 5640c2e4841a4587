use olive_core::error::CoreError;
use olive_core::validation::FormErrors;

/// Errors surfaced by the REST client and the dashboard layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Rejected locally before any request was sent.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The backend rejected the bearer credential.
    #[error("Session expired or missing, sign in again")]
    Unauthorized,

    /// The signed-in user has no organization to scope records to.
    #[error("No organization is associated with the current session")]
    NoOrganization,

    /// The backend returned a non-2xx status.
    #[error("Olive API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<FormErrors> for ClientError {
    fn from(errors: FormErrors) -> Self {
        ClientError::Core(CoreError::Validation(errors))
    }
}

impl ClientError {
    /// Field errors when the failure was a local validation rejection.
    pub fn form_errors(&self) -> Option<&FormErrors> {
        match self {
            ClientError::Core(CoreError::Validation(errors)) => Some(errors),
            _ => None,
        }
    }
}
