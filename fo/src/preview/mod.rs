//! Plan preview: tree parsing and before/after reconciliation
//!
//! The server reports the pending reorganization as one nested tree in which
//! some leaves carry a move marker. This module parses that tree exactly once
//! at the boundary into a typed recursive structure, then flattens it into
//! two entry lists: the directory as it is now, and as it will be after the
//! plan is applied.

mod reconcile;
mod tree;

pub use reconcile::{EntryKind, FlatEntry, Reconciled, reconcile};
pub use tree::PreviewNode;
