//! Bundle binds from serialized chain documents.

use msibind_lib::binder::Binder;
use msibind_lib::chain::{ChainDocument, PackageKind};
use msibind_lib::collab::LocalFileSystem;
use msibind_lib::config::BindConfig;
use msibind_lib::diagnostics::DiagnosticCode;

use super::common::never_equal;

const CHAIN: &str = r#"{
  "entries": [
    { "package": "NetFx" },
    { "rollback_boundary": "AppBoundary" },
    { "rollback_boundary": "Extra" },
    { "package": "App" },
    { "package": "AppFix" },
    { "package": "Tools" }
  ],
  "packages": [
    { "id": "NetFx", "kind": "exe", "vital": false },
    { "id": "App", "kind": "msi", "product_code": "{AAAAAAAA-0000-0000-0000-000000000001}" },
    {
      "id": "AppFix",
      "kind": "msp",
      "slipstream": true,
      "target_codes": [{ "kind": "product_code", "code": "{aaaaaaaa-0000-0000-0000-000000000001}" }]
    },
    { "id": "Tools", "kind": "msi" }
  ],
  "boundaries": [
    { "id": "AppBoundary" },
    { "id": "Extra", "vital": false }
  ]
}"#;

#[test]
fn chain_document_plans_boundaries_and_slipstreams() {
  let document: ChainDocument = serde_json::from_str(CHAIN).unwrap();
  let config = BindConfig::default();
  let binder = Binder::new(&config, &LocalFileSystem, &never_equal);

  let result = binder.bind_bundle(&document).unwrap();
  let plan = &result.plan;

  let order: Vec<&str> = plan.packages.iter().map(|p| p.id.as_str()).collect();
  assert_eq!(order, vec!["NetFx", "App", "AppFix", "Tools"]);
  assert!(!plan.packages[0].vital);
  assert_eq!(plan.packages[2].kind, PackageKind::Msp);

  let forward: Vec<Option<&str>> = plan
    .packages
    .iter()
    .map(|p| p.rollback_boundary_forward.as_deref())
    .collect();
  assert_eq!(
    forward,
    vec![Some("DefaultRollbackBoundary"), Some("Extra"), None, None]
  );
  assert_eq!(
    plan.packages[0].rollback_boundary_backward_id.as_deref(),
    Some("DefaultRollbackBoundary")
  );
  assert_eq!(plan.packages[3].rollback_boundary_backward_id.as_deref(), Some("Extra"));

  assert_eq!(result.diagnostics.count_of(DiagnosticCode::DiscardedRollbackBoundary), 1);
  let discarded = result
    .diagnostics
    .iter()
    .find(|d| d.code == DiagnosticCode::DiscardedRollbackBoundary)
    .unwrap();
  assert!(discarded.message.contains("'AppBoundary' is followed by 'Extra'"));
  assert_eq!(plan.slipstreams.len(), 1);
  assert_eq!(plan.slipstreams[0].msp, "AppFix");
  assert_eq!(plan.slipstreams[0].msi, "App");
}

#[test]
fn plans_serialize_for_downstream_tools() {
  let document: ChainDocument = serde_json::from_str(CHAIN).unwrap();
  let config = BindConfig::default();
  let binder = Binder::new(&config, &LocalFileSystem, &never_equal);

  let plan = binder.bind_bundle(&document).unwrap().plan;
  let json = serde_json::to_value(&plan).unwrap();
  assert_eq!(json["packages"][1]["rollback_boundary_forward"], "Extra");
  assert_eq!(json["used_boundaries"].as_array().unwrap().len(), 2);
}
