use std::sync::Arc;

use crate::dispatch::CallDispatcher;
use crate::lead::CallSettings;
use crate::sheets::RowSink;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Where lead rows are recorded.
    pub sink: Arc<dyn RowSink>,
    /// Places the follow-up call.
    pub dispatcher: Arc<dyn CallDispatcher>,
    pub settings: Arc<CallSettings>,
}
