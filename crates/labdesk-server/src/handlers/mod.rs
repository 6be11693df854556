//! Route handlers, one module per resource.
//!
//! Every handler follows the same flow: validate the input, call the
//! storage backend, then respond. Failures are [`labdesk_api::ApiError`]s.

pub mod health;
pub mod orders;
pub mod patients;
