//! `stockbook-schema` — runtime discovery of drifted column names.
//!
//! Deployments of the backing store disagree on column names (`stock_quantity`
//! vs `stock`, `user_id` vs `owner_id`). This crate probes which candidates a
//! table actually exposes and caches the resolution for the process lifetime.
//!
//! Probe-based discovery is a degraded-mode safety net by nature; the adapter
//! caches aggressively and fails open (an indeterminate probe counts as
//! "present") so a store outage is never misread as schema drift.

pub mod adapter;
pub mod probe;
pub mod signals;

pub use adapter::SchemaAdapter;
pub use probe::{ColumnProbe, ProbeOutcome};
pub use signals::{is_missing_column, is_missing_procedure};
