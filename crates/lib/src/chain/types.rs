use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::DEFAULT_ROLLBACK_BOUNDARY_ID;
use crate::diagnostics::SourceLineNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageKind {
  Msi,
  Msp,
  Msu,
  Exe,
  RollbackBoundaryMarker,
}

/// One authored position in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainEntry {
  Package(String),
  RollbackBoundary(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetCodeKind {
  ProductCode,
  UpgradeCode,
}

/// A product a patch applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetCode {
  pub kind: TargetCodeKind,
  pub code: String,
}

fn default_true() -> bool {
  true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainPackageInfo {
  pub id: String,
  pub kind: PackageKind,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rollback_boundary_forward: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rollback_boundary_backward_id: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub payloads: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub product_code: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub upgrade_code: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub target_codes: Vec<TargetCode>,
  #[serde(default)]
  pub slipstream: bool,
  #[serde(default = "default_true")]
  pub vital: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub location: Option<SourceLineNumber>,
}

impl ChainPackageInfo {
  pub fn new(id: impl Into<String>, kind: PackageKind) -> Self {
    Self {
      id: id.into(),
      kind,
      rollback_boundary_forward: None,
      rollback_boundary_backward_id: None,
      payloads: Vec::new(),
      product_code: None,
      upgrade_code: None,
      target_codes: Vec::new(),
      slipstream: false,
      vital: true,
      location: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackBoundaryInfo {
  pub id: String,
  #[serde(default = "default_true")]
  pub vital: bool,
  #[serde(default)]
  pub is_default: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub location: Option<SourceLineNumber>,
}

impl RollbackBoundaryInfo {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      vital: true,
      is_default: false,
      location: None,
    }
  }

  /// The boundary every chain implicitly starts with.
  pub fn implicit_default() -> Self {
    Self {
      id: DEFAULT_ROLLBACK_BOUNDARY_ID.to_string(),
      vital: true,
      is_default: true,
      location: None,
    }
  }
}

/// Authored chain: entry order plus the packages and boundaries it names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDocument {
  pub entries: Vec<ChainEntry>,
  #[serde(default)]
  pub packages: Vec<ChainPackageInfo>,
  #[serde(default)]
  pub boundaries: Vec<RollbackBoundaryInfo>,
}

/// A patch bundled to apply together with a package it targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlipstreamAssociation {
  pub msp: String,
  pub msi: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainPlan {
  pub packages: Vec<ChainPackageInfo>,
  pub used_boundaries: Vec<RollbackBoundaryInfo>,
  pub slipstreams: Vec<SlipstreamAssociation>,
}

#[derive(Debug, Error)]
pub enum ChainError {
  #[error("chain refers to unknown {kind} '{id}'")]
  UnknownChainEntry { kind: &'static str, id: String },

  #[error("package '{0}' appears more than once in the chain")]
  DuplicateChainPackage(String),
}
