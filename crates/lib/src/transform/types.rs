use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::table::{Output, OutputKind, SchemaError};

/// The two snapshots whose difference is a transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformPair {
  pub target: Output,
  pub updated: Output,
  /// Validation flags carried in summary property 16, if present.
  pub validation_flags: Option<i64>,
}

#[derive(Debug, Error)]
pub enum TransformError {
  #[error("transform contains no differences")]
  NoDifferences,

  #[error("expected a {expected:?} document, got {actual:?}")]
  WrongKind { expected: OutputKind, actual: OutputKind },

  #[error("sub-storage '{name}': {source}")]
  SubStorage {
    name: String,
    #[source]
    source: Box<TransformError>,
  },

  #[error(transparent)]
  Schema(#[from] SchemaError),
}
