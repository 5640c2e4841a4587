//! Client side of the Olive campaign platform.
//!
//! [`api::OliveApi`] talks to the campaign backend over REST,
//! [`session`] supplies the bearer credential and signed-in user,
//! [`cache::ResponseCache`] keeps read results keyed by [`cache::QueryKey`],
//! and [`dashboard::Dashboard`] ties the three together the way the admin
//! dashboard does: validate first, send, then invalidate on success.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod session;
