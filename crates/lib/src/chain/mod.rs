//! Installation chain planning for bundles.
//!
//! The planner walks the authored chain once to attach rollback boundaries to
//! the packages that open them, then once more to give each package the id of
//! the boundary it rolls back to.

mod planner;
mod slipstream;
mod types;

pub use planner::ChainPlanner;
pub use slipstream::associate_slipstreams;
pub use types::{
  ChainDocument, ChainEntry, ChainError, ChainPackageInfo, ChainPlan, PackageKind, RollbackBoundaryInfo,
  SlipstreamAssociation, TargetCode, TargetCodeKind,
};
