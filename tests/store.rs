//! Snapshot store tests (LMDB)

use rolegate::{Error, Gate, RawConfig, Role, SnapshotStore};
use tempfile::TempDir;

fn marketplace() -> RawConfig {
    RawConfig::from_json_str(include_str!("../config/permissions.json")).unwrap()
}

fn variant(edit_orders: bool) -> RawConfig {
    let mut v: serde_json::Value = serde_json::from_str(include_str!("../config/permissions.json")).unwrap();
    let actions = if edit_orders { vec!["view", "edit"] } else { vec!["view"] };
    v["roles"]["industry"]["orders"] = serde_json::json!({ "actions": actions });
    RawConfig::from_json_str(&v.to_string()).unwrap()
}

fn broken() -> RawConfig {
    let mut v: serde_json::Value = serde_json::from_str(include_str!("../config/permissions.json")).unwrap();
    v["roles"]["industry"]["warehouse"] = serde_json::json!({ "actions": ["view"] });
    RawConfig::from_json_str(&v.to_string()).unwrap()
}

fn open() -> (TempDir, SnapshotStore) {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::open(dir.path().join("snapshots")).unwrap();
    (dir, store)
}

// ============================================================================
// Store operations
// ============================================================================

#[test]
fn empty_store_has_no_snapshot() {
    let (_dir, store) = open();
    assert!(store.latest().unwrap().is_none());
    assert!(store.current_version().unwrap().is_none());
    assert!(store.last_version().unwrap().is_none());
    assert!(store.versions().unwrap().is_empty());
}

#[test]
fn save_and_read_back() {
    let (_dir, store) = open();
    let raw = marketplace();
    let fp = raw.fingerprint().unwrap();
    store.save(1, &fp, &raw).unwrap();

    let (version, back) = store.latest().unwrap().unwrap();
    assert_eq!(version, 1);
    assert_eq!(back, raw);
    assert_eq!(store.current_fingerprint().unwrap(), Some(fp));
    assert_eq!(store.get(1).unwrap(), Some(raw));
    assert_eq!(store.get(2).unwrap(), None);
}

#[test]
fn versions_sort_numerically() {
    let (_dir, store) = open();
    let raw = marketplace();
    for v in [3u64, 300, 20, 1] {
        store.save(v, "x", &raw).unwrap();
    }
    assert_eq!(store.versions().unwrap(), vec![1, 3, 20, 300]);
    assert_eq!(store.last_version().unwrap(), Some(300));
    // current is the last one saved, not the highest
    assert_eq!(store.current_version().unwrap(), Some(1));
}

#[test]
fn prune_keeps_newest_and_current() {
    let (_dir, store) = open();
    let raw = marketplace();
    for v in 2..=10u64 {
        store.save(v, "x", &raw).unwrap();
    }
    store.save(1, "x", &raw).unwrap();
    let removed = store.prune(3).unwrap();
    assert_eq!(removed, 6);
    assert_eq!(store.versions().unwrap(), vec![1, 8, 9, 10]);
}

#[test]
fn clear_removes_everything() {
    let (_dir, store) = open();
    store.save(1, "x", &marketplace()).unwrap();
    store.clear().unwrap();
    assert!(store.latest().unwrap().is_none());
}

// ============================================================================
// Gate with a store
// ============================================================================

#[test]
fn gate_records_installed_snapshots() {
    let (_dir, store) = open();
    let gate = Gate::with_store(Some(variant(false)), store).unwrap();
    gate.reload(variant(true)).unwrap();

    let store = gate.store().unwrap();
    assert_eq!(store.versions().unwrap(), vec![1, 2]);
    let (v, raw) = store.latest().unwrap().unwrap();
    assert_eq!(v, 2);
    assert_eq!(raw, variant(true));
    assert_eq!(
        store.current_fingerprint().unwrap().as_deref(),
        Some(gate.current().fingerprint())
    );
}

#[test]
fn restart_continues_version_sequence() {
    let (dir, store) = open();
    let path = store.path().to_path_buf();
    {
        let gate = Gate::with_store(Some(variant(false)), store).unwrap();
        gate.reload(variant(true)).unwrap();
    }
    let gate = Gate::with_store(Some(marketplace()), SnapshotStore::open(&path).unwrap()).unwrap();
    assert_eq!(gate.version(), 3);
    drop(dir);
}

#[test]
fn rejected_startup_config_falls_back_to_stored() {
    let (dir, store) = open();
    let path = store.path().to_path_buf();
    {
        let gate = Gate::with_store(Some(variant(true)), store).unwrap();
        assert_eq!(gate.version(), 1);
    }

    let gate = Gate::with_store(Some(broken()), SnapshotStore::open(&path).unwrap()).unwrap();
    assert_eq!(gate.version(), 1);
    assert!(gate.is_allowed(Role::Industry, "orders", "edit"));

    // the fallback does not reuse the stored version number
    assert_eq!(gate.reload(variant(false)).unwrap().version(), 2);
    drop(dir);
}

#[test]
fn no_config_uses_stored_snapshot() {
    let (dir, store) = open();
    let path = store.path().to_path_buf();
    drop(Gate::with_store(Some(variant(true)), store).unwrap());

    let gate = Gate::with_store(None, SnapshotStore::open(&path).unwrap()).unwrap();
    assert!(gate.is_allowed(Role::Industry, "orders", "edit"));
    drop(dir);
}

#[test]
fn nothing_to_fall_back_to() {
    let (_dir, store) = open();
    assert!(matches!(Gate::with_store(Some(broken()), store.clone()), Err(Error::Load(_))));
    assert!(matches!(Gate::with_store(None, store), Err(Error::NoSnapshot)));
}

#[test]
fn rejected_reload_is_not_stored() {
    let (_dir, store) = open();
    let gate = Gate::with_store(Some(marketplace()), store).unwrap();
    assert!(gate.reload(broken()).is_err());
    assert_eq!(gate.store().unwrap().versions().unwrap(), vec![1]);
}
