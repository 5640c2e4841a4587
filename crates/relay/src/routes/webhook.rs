use axum::routing::post;
use axum::Router;

use crate::handlers::webhook;
use crate::state::AppState;

/// ```text
/// POST   /webhook           -> submit_lead
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(webhook::submit_lead))
}
