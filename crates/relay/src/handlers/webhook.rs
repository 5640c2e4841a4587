//! Lead webhook: record the lead, then place the follow-up call.

use axum::extract::State;
use axum::Json;

use crate::dispatch::CallApiResponse;
use crate::error::RelayResult;
use crate::lead::{CallPayload, LeadSubmission};
use crate::state::AppState;

/// POST /api/webhook
///
/// Appends the lead to the spreadsheet and only then asks the call API to
/// ring them. Answers with the call API's reply verbatim.
pub async fn submit_lead(
    State(state): State<AppState>,
    Json(lead): Json<LeadSubmission>,
) -> RelayResult<CallApiResponse> {
    tracing::info!(
        name = %lead.name,
        company = %lead.company,
        company_product = %lead.company_product,
        "Received lead"
    );

    state.sink.append_row(&lead.sheet_row()).await?;
    tracing::debug!(name = %lead.name, "Lead row appended");

    let payload = CallPayload::for_lead(&lead, &state.settings);
    state.dispatcher.dispatch(&payload).await
}
