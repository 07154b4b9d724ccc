//! Catalog loader validation tests
//!
//! Every defect in a configuration is reported in one batch.

use rolegate::{Catalog, Error, LoadError, RawConfig, Role, Snapshot};

fn marketplace_json() -> serde_json::Value {
    serde_json::from_str(include_str!("../config/permissions.json")).unwrap()
}

fn load(v: serde_json::Value) -> Result<Catalog, Vec<LoadError>> {
    let raw = RawConfig::from_json_str(&v.to_string()).unwrap();
    Catalog::load(&raw).map_err(|e| e.into_vec())
}

#[test]
fn marketplace_config_is_valid() {
    let catalog = load(marketplace_json()).unwrap();
    assert_eq!(catalog.registry().len(), 15);
    assert_eq!(catalog.registry().actions().len(), 5);
    assert_eq!(catalog.permissions(Role::Industry).len(), 8);
}

// ============================================================================
// Individual defects
// ============================================================================

#[test]
fn unknown_module_reference() {
    let mut v = marketplace_json();
    v["roles"]["industry"]["warehouse"] = serde_json::json!({ "actions": ["view"] });
    assert_eq!(
        load(v).unwrap_err(),
        vec![LoadError::UnknownModule { role: Role::Industry, module: "warehouse".into() }]
    );
}

#[test]
fn action_not_defined_on_module() {
    let mut v = marketplace_json();
    // approve exists in the registry, just not on documents
    v["roles"]["professional"]["documents"] = serde_json::json!({ "actions": ["view", "approve"] });
    assert_eq!(
        load(v).unwrap_err(),
        vec![LoadError::UnknownAction {
            role: Role::Professional,
            module: "documents".into(),
            action: "approve".into(),
        }]
    );
}

#[test]
fn action_unknown_to_registry() {
    let mut v = marketplace_json();
    v["roles"]["industry"]["orders"] = serde_json::json!({ "actions": ["view", "export"] });
    let errs = load(v).unwrap_err();
    assert_eq!(errs.len(), 1);
    assert!(matches!(&errs[0], LoadError::UnknownAction { action, .. } if action == "export"));
}

#[test]
fn missing_role_document() {
    let mut v = marketplace_json();
    v["roles"].as_object_mut().unwrap().remove("logistics_vendor");
    assert_eq!(load(v).unwrap_err(), vec![LoadError::MissingRole(Role::LogisticsVendor)]);
}

#[test]
fn every_role_missing() {
    let mut v = marketplace_json();
    v["roles"] = serde_json::json!({});
    let errs = load(v).unwrap_err();
    assert_eq!(errs, Role::ALL.map(LoadError::MissingRole).to_vec());
}

#[test]
fn unknown_role_document() {
    let mut v = marketplace_json();
    v["roles"]["auditor"] = serde_json::json!({});
    assert_eq!(load(v).unwrap_err(), vec![LoadError::UnknownRole("auditor".into())]);
}

#[test]
fn dangling_parent() {
    let mut v = marketplace_json();
    v["modules"]["drivers"]["parent_module_id"] = serde_json::json!("transport");
    assert_eq!(
        load(v).unwrap_err(),
        vec![LoadError::UnknownParent { module: "drivers".into(), parent: "transport".into() }]
    );
}

#[test]
fn navigation_to_unknown_module() {
    let mut v = marketplace_json();
    v["navigation"]["industry"]
        .as_array_mut()
        .unwrap()
        .push(serde_json::json!({ "module": "analytics", "path": "/industry/analytics" }));
    assert_eq!(
        load(v).unwrap_err(),
        vec![LoadError::UnknownNavModule { role: Role::Industry, module: "analytics".into() }]
    );
}

/// serde_json::Value cannot hold duplicate keys, so these use raw text
#[test]
fn duplicate_keys_are_reported() {
    let raw = RawConfig::from_json_str(
        r#"{
            "modules": {
                "orders": { "label": "Orders", "allowed_actions": ["view"] },
                "orders": { "label": "Orders again", "allowed_actions": ["view"] }
            },
            "roles": {
                "industry": { "orders": { "actions": ["view"] }, "orders": { "actions": [] } },
                "industry": {},
                "service_vendor": {},
                "product_vendor": {},
                "logistics_vendor": {},
                "professional": {}
            }
        }"#,
    )
    .unwrap();
    assert_eq!(
        Catalog::load(&raw).unwrap_err().into_vec(),
        vec![
            LoadError::DuplicateModule("orders".into()),
            LoadError::DuplicateEntry { role: Role::Industry, module: "orders".into() },
            LoadError::DuplicateRole(Role::Industry),
        ]
    );
}

// ============================================================================
// Batch reporting
// ============================================================================

#[test]
fn all_defects_reported_together_in_document_order() {
    let mut v = marketplace_json();
    v["modules"]["vehicles"]["parent_module_id"] = serde_json::json!("garage");
    v["roles"]["industry"]["warehouse"] = serde_json::json!({ "actions": ["view"] });
    v["roles"]["industry"]["dashboard"] = serde_json::json!({ "actions": ["view", "edit"] });
    v["roles"].as_object_mut().unwrap().remove("professional");
    v["roles"]["auditor"] = serde_json::json!({});

    let errs = load(v).unwrap_err();
    assert_eq!(errs.len(), 5);
    assert_eq!(
        errs[0],
        LoadError::UnknownParent { module: "vehicles".into(), parent: "garage".into() }
    );
    assert!(errs.contains(&LoadError::UnknownModule { role: Role::Industry, module: "warehouse".into() }));
    assert!(errs.contains(&LoadError::UnknownAction {
        role: Role::Industry,
        module: "dashboard".into(),
        action: "edit".into(),
    }));
    assert!(errs.contains(&LoadError::UnknownRole("auditor".into())));
    assert_eq!(errs[4], LoadError::MissingRole(Role::Professional));
}

#[test]
fn multiple_bad_actions_in_one_entry_each_reported() {
    let mut v = marketplace_json();
    v["roles"]["industry"]["messages"] = serde_json::json!({ "actions": ["view", "edit", "approve"] });
    let errs = load(v).unwrap_err();
    assert_eq!(errs.len(), 2);
}

#[test]
fn snapshot_build_surfaces_load_batch() {
    let mut v = marketplace_json();
    v["roles"] = serde_json::json!({});
    let raw = RawConfig::from_json_str(&v.to_string()).unwrap();
    match Snapshot::build(raw, 1) {
        Err(Error::Load(errs)) => {
            assert_eq!(errs.len(), 5);
            assert!(errs.to_string().starts_with("5 configuration error(s)"));
        }
        other => panic!("expected load errors, got {:?}", other.map(|s| s.version())),
    }
}

#[test]
fn camel_case_input_is_accepted() {
    let raw = RawConfig::from_json_str(
        r#"{
            "modules": {
                "Documents": { "label": "Documents", "allowedActions": ["view", "edit"] },
                "Contracts": { "label": "Contracts", "parentModuleId": "Documents", "allowedActions": ["view", "edit", "delete"] }
            },
            "roles": {
                "industry": { "Documents": { "actions": ["view", "edit"] } },
                "service_vendor": {},
                "product_vendor": {},
                "logistics_vendor": {},
                "professional": {}
            }
        }"#,
    )
    .unwrap();
    let s = Snapshot::build(raw, 1).unwrap();
    assert!(s.is_allowed(Role::Industry, "Contracts", "edit"));
    assert!(!s.is_allowed(Role::Industry, "Contracts", "delete"));
}
