//! Bind configuration.
//!
//! Loaded from a TOML file; every field has a default so an empty file (or
//! no file at all) is a valid configuration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("cabinet_threads must be at least 1")]
  NoCabinetThreads,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindConfig {
  /// Compression default for files that leave it unset. `None` defers to the
  /// package's summary information.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default_compressed: Option<bool>,

  /// Worker threads used to build cabinets.
  pub cabinet_threads: usize,

  /// Scratch directory for files the binder creates (e.g. the empty
  /// placeholder used by transforms).
  pub intermediate_dir: PathBuf,

  /// Where built cabinets are written.
  pub cabinet_dir: PathBuf,

  /// Stop carrying the product identity properties into every transform.
  pub suppress_identity_rows: bool,
}

impl Default for BindConfig {
  fn default() -> Self {
    Self {
      default_compressed: None,
      cabinet_threads: num_cpus(),
      intermediate_dir: PathBuf::from("obj"),
      cabinet_dir: PathBuf::from("cab"),
      suppress_identity_rows: false,
    }
  }
}

impl BindConfig {
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let config: BindConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    config.validate()?;
    Ok(config)
  }

  /// Load `path` when given, otherwise the defaults.
  pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
    match path {
      Some(path) => Self::load(path),
      None => Ok(Self::default()),
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.cabinet_threads == 0 {
      return Err(ConfigError::NoCabinetThreads);
    }
    Ok(())
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
