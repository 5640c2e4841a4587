pub mod health;
pub mod webhook;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /webhook          lead submission (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(webhook::router())
}
