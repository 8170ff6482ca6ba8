use std::collections::HashSet;

use tracing::debug;

use super::{ChainPackageInfo, PackageKind, SlipstreamAssociation, TargetCodeKind};

fn same_code(a: &str, b: &str) -> bool {
  a.eq_ignore_ascii_case(b)
}

/// Pair every slipstream patch with the MSI packages it targets.
///
/// A patch targets a package when one of its product-code targets equals the
/// package's product code or one of its upgrade-code targets equals the
/// package's upgrade code. Codes compare case-insensitively.
pub fn associate_slipstreams(packages: &[ChainPackageInfo]) -> Vec<SlipstreamAssociation> {
  let mut seen = HashSet::new();
  let mut associations = Vec::new();

  let patches = packages.iter().filter(|p| p.kind == PackageKind::Msp && p.slipstream);
  for patch in patches {
    for msi in packages.iter().filter(|p| p.kind == PackageKind::Msi) {
      let targets = patch.target_codes.iter().any(|target| {
        let code = match target.kind {
          TargetCodeKind::ProductCode => msi.product_code.as_deref(),
          TargetCodeKind::UpgradeCode => msi.upgrade_code.as_deref(),
        };
        code.is_some_and(|code| same_code(code, &target.code))
      });
      if !targets {
        continue;
      }

      let association = SlipstreamAssociation {
        msp: patch.id.clone(),
        msi: msi.id.clone(),
      };
      if seen.insert(association.clone()) {
        debug!(msp = %patch.id, msi = %msi.id, "slipstream");
        associations.push(association);
      }
    }
  }

  associations
}
