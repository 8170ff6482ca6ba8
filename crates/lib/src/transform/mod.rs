//! Synthesis of the target and updated snapshots a transform is built from.
//!
//! A transform document records row operations and per-field changes
//! against a baseline. The native engine only produces transforms from two
//! complete databases, so [`TransformDiffEngine`] splits the document into a
//! `target` snapshot (before) and an `updated` snapshot (after) whose
//! difference is exactly the recorded change set.

mod diff;
mod summary;
mod types;

pub use diff::TransformDiffEngine;
pub use summary::{RevisionNumber, parse_revision_number};
pub use types::{TransformError, TransformPair};
