//! Lead webhook relay.
//!
//! Receives form submissions on `POST /api/webhook`, records each lead as a
//! spreadsheet row and asks the voice-call API to phone the lead. The
//! spreadsheet and call API sit behind [`sheets::RowSink`] and
//! [`dispatch::CallDispatcher`] so the HTTP layer can be exercised without
//! either service.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod lead;
pub mod router;
pub mod routes;
pub mod sheets;
pub mod state;
