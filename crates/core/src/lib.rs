//! Olive campaign domain library.
//!
//! Campaign, customer-set, call and service records as the external
//! backend exposes them, plus the client-side contracts that guard what is
//! submitted back: field validation, per-channel configuration handling and
//! lifecycle action gating. Nothing in this crate performs I/O.

pub mod call;
pub mod campaign;
pub mod campaign_form;
pub mod channel;
pub mod customer;
pub mod customer_set;
pub mod error;
pub mod lifecycle;
pub mod service;
pub mod test_call;
pub mod types;
pub mod validation;
