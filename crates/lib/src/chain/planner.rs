use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::diagnostics::{DiagnosticCode, Diagnostics};

use super::{
  ChainDocument, ChainEntry, ChainError, ChainPackageInfo, ChainPlan, RollbackBoundaryInfo, associate_slipstreams,
};

/// Orders chain packages and assigns their rollback boundaries.
#[derive(Debug, Clone, Default)]
pub struct ChainPlanner;

impl ChainPlanner {
  pub fn new() -> Self {
    Self
  }

  pub fn plan(&self, document: &ChainDocument, diagnostics: &mut Diagnostics) -> Result<ChainPlan, ChainError> {
    let packages: HashMap<&str, &ChainPackageInfo> = document.packages.iter().map(|p| (p.id.as_str(), p)).collect();
    let boundaries: HashMap<&str, &RollbackBoundaryInfo> =
      document.boundaries.iter().map(|b| (b.id.as_str(), b)).collect();

    let mut ordered: Vec<ChainPackageInfo> = Vec::new();
    let mut used_boundaries: Vec<RollbackBoundaryInfo> = Vec::new();
    let mut placed: HashSet<&str> = HashSet::new();
    let mut pending = Some(RollbackBoundaryInfo::implicit_default());

    for entry in &document.entries {
      match entry {
        ChainEntry::Package(id) => {
          let package = packages.get(id.as_str()).ok_or_else(|| ChainError::UnknownChainEntry {
            kind: "package",
            id: id.clone(),
          })?;
          if !placed.insert(id.as_str()) {
            return Err(ChainError::DuplicateChainPackage(id.clone()));
          }

          let mut package = (*package).clone();
          package.rollback_boundary_forward = None;
          package.rollback_boundary_backward_id = None;
          if let Some(boundary) = pending.take() {
            package.rollback_boundary_forward = Some(boundary.id.clone());
            used_boundaries.push(boundary);
          }
          ordered.push(package);
        }
        ChainEntry::RollbackBoundary(id) => {
          let boundary = boundaries.get(id.as_str()).ok_or_else(|| ChainError::UnknownChainEntry {
            kind: "rollback boundary",
            id: id.clone(),
          })?;
          if let Some(existing) = pending.as_ref().filter(|p| !p.is_default) {
            diagnostics.warning(
              DiagnosticCode::DiscardedRollbackBoundary,
              existing.location.as_ref(),
              format!(
                "rollback boundary '{}' is followed by '{}' with no package between them and is discarded",
                existing.id, boundary.id
              ),
            );
          }
          pending = Some((*boundary).clone());
        }
      }
    }

    if let Some(boundary) = pending
      && !boundary.is_default
    {
      diagnostics.warning(
        DiagnosticCode::DiscardedRollbackBoundary,
        boundary.location.as_ref(),
        format!(
          "rollback boundary '{}' is not followed by any package and is discarded",
          boundary.id
        ),
      );
    }

    assign_backward_ids(&mut ordered);

    let slipstreams = associate_slipstreams(&ordered);
    info!(
      packages = ordered.len(),
      boundaries = used_boundaries.len(),
      slipstreams = slipstreams.len(),
      "planned chain"
    );

    Ok(ChainPlan {
      packages: ordered,
      used_boundaries,
      slipstreams,
    })
  }
}

/// Give each package the boundary it rolls back to: the last boundary opened
/// at or before it.
fn assign_backward_ids(packages: &mut [ChainPackageInfo]) {
  let mut last_boundary_id: Option<String> = None;
  for i in 0..packages.len() {
    let Some(forward) = packages[i].rollback_boundary_forward.clone() else {
      continue;
    };
    if i > 0
      && let Some(last) = &last_boundary_id
    {
      packages[i - 1].rollback_boundary_backward_id = Some(last.clone());
    }
    last_boundary_id = Some(forward);
  }

  if let Some(last) = packages.last_mut() {
    last.rollback_boundary_backward_id = last_boundary_id;
  }
  debug!(packages = packages.len(), "assigned backward rollback boundaries");
}
