//! Per-kind reconcilers.
//!
//! Each reconciler turns an action plus a natural key into a no-op, a create
//! or a delete against the remote service, and reports the outcome as an
//! [`Item`](crate::ledger::Item). Remote state is read fresh on every call.

pub mod group;
pub mod search;
pub mod system;

pub use group::GroupReconciler;
pub use search::{SearchKey, SearchReconciler};
pub use system::{SystemKey, SystemReconciler};
