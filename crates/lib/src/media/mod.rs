//! Assignment of files to media (disks) and cabinets, and file sequencing.
//!
//! Two modes exist. Manual mode trusts the authored `Media` table and the
//! `DiskId` of every file. Auto mode is selected by a `MediaTemplate` row and
//! bin-packs compressed files into cabinets under a size budget, replacing any
//! authored `Media` rows.

mod assign;
mod budget;
mod sequence;

pub use assign::{AssignmentMode, CabinetGroup, MediaAssigner, MediaAssignment};
pub use budget::{budget_bytes, override_from_env, parse_override, resolve_budget};
pub use sequence::sequence_files;

use thiserror::Error;

use crate::table::SchemaError;

#[derive(Debug, Error)]
pub enum MediaError {
  #[error("a MediaTemplate cannot be combined with {media_rows} authored Media rows")]
  ConflictingMediaAuthoring { media_rows: usize },

  #[error("{variable} must be a positive number of megabytes, got '{value}'")]
  InvalidOverride { variable: String, value: String },

  #[error("a media size of {megabytes} MB is too large")]
  BudgetTooLarge { megabytes: String },

  #[error(transparent)]
  Schema(#[from] SchemaError),
}
