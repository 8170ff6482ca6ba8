//! Deterministic identifiers derived from canonical content.
//!
//! Identifiers are name-based (version 3) UUIDs, so the same namespace and
//! canonical input always produce the same value across builds.

mod canonical;
mod component;

pub use canonical::{DirectoryResolver, STANDARD_DIRECTORIES, is_standard_directory, is_volatile_path};
pub use component::ComponentGuidGenerator;

use thiserror::Error;
use uuid::Uuid;

use crate::table::SchemaError;

#[derive(Debug, Error)]
pub enum GuidError {
  #[error("directory '{directory}' referenced by '{referenced_by}' does not exist")]
  UnresolvedDirectory { directory: String, referenced_by: String },

  #[error("directory '{directory}' is its own ancestor")]
  DirectoryCycle { directory: String },

  #[error(transparent)]
  Schema(#[from] SchemaError),
}

/// Version-3 UUID of `canonical_input` (UTF-8) within `namespace`.
pub fn stable_id(namespace: &Uuid, canonical_input: &str) -> Uuid {
  Uuid::new_v3(namespace, canonical_input.as_bytes())
}

/// Render `id` the way installer tables store GUIDs: braced and upper-case.
pub fn format_guid(id: &Uuid) -> String {
  id.braced().to_string().to_uppercase()
}
