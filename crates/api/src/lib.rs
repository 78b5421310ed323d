//! `stockbook-api` — HTTP surface over the stock ledger.
//!
//! Authentication/session handling is an external collaborator: callers
//! arrive with a validated user id in the `x-user-id` header, and this crate
//! only parses and threads it through as the ownership scope.

pub mod app;
pub mod context;
