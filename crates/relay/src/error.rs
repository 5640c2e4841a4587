use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failure anywhere in the relay pipeline.
///
/// Every variant answers `500 Internal Server Error: <message>`; the detail
/// (including upstream status and body) only goes to the log.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The spreadsheet API rejected the append.
    #[error("Spreadsheet append failed with status code {status}")]
    Sheet { status: u16, body: String },

    /// The voice-call API returned a non-2xx status.
    #[error("Request failed with status code {status}")]
    CallApi { status: u16, body: String },

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Service-account signing or token exchange failed.
    #[error("Spreadsheet credentials rejected: {0}")]
    Credentials(String),
}

pub type RelayResult<T> = Result<T, RelayError>;

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match &self {
            RelayError::Sheet { status, body } | RelayError::CallApi { status, body } => {
                tracing::error!(error = %self, upstream_status = status, upstream_body = %body, "Lead relay failed");
            }
            RelayError::Request(err) => {
                tracing::error!(error = %self, upstream_status = ?err.status(), "Lead relay failed");
            }
            RelayError::Credentials(_) => {
                tracing::error!(error = %self, "Lead relay failed");
            }
        }

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal Server Error: {self}"),
        )
            .into_response()
    }
}
