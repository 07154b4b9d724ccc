//! Process-wide permission gate
//!
//! Holds the current [`Snapshot`] behind one shared reference. Readers take
//! an `Arc` for the duration of a query; reload builds a complete snapshot
//! off to the side and swaps it in, so no query sees a catalog paired with a
//! hierarchy from a different version. A rejected reload leaves the previous
//! snapshot in place.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use log::{info, warn};

use crate::constants::DEFAULT_KEEP_SNAPSHOTS;
use crate::error::{Error, Result};
use crate::projection::NavItem;
use crate::role::Role;
use crate::snapshot::Snapshot;
use crate::source::RawConfig;
use crate::store::SnapshotStore;

pub struct Gate {
    current: RwLock<Arc<Snapshot>>,
    next_version: AtomicU64,
    reload_lock: Mutex<()>,
    store: Option<SnapshotStore>,
}

impl Gate {
    /// Gate over a freshly validated configuration (version 1)
    pub fn new(raw: RawConfig) -> Result<Gate> {
        let snapshot = Snapshot::build(raw, 1)?;
        info!("installed permission snapshot v1 ({})", snapshot.fingerprint());
        Ok(Gate::install(snapshot, None))
    }

    /// Gate backed by a snapshot store
    ///
    /// `raw` is validated and recorded when given. If it is absent or
    /// rejected, the store's current snapshot is used instead; the build
    /// error is returned only when the store has nothing usable either. A
    /// store that cannot be read does not mask the build error; with no
    /// `raw` the store error is returned.
    pub fn with_store(raw: Option<RawConfig>, store: SnapshotStore) -> Result<Gate> {
        let next = store.last_version()?.map_or(1, |v| v + 1);
        let failure = match raw {
            Some(raw) => match Snapshot::build(raw, next) {
                Ok(snapshot) => {
                    store.save(snapshot.version(), snapshot.fingerprint(), snapshot.raw())?;
                    info!("installed permission snapshot v{} ({})", next, snapshot.fingerprint());
                    return Ok(Gate::install(snapshot, Some(store)));
                }
                Err(e) => {
                    for d in e.details() {
                        warn!("rejected permission configuration: {}", d);
                    }
                    e
                }
            },
            None => Error::NoSnapshot,
        };

        let latest = match store.latest() {
            Ok(latest) => latest,
            Err(e) => {
                warn!("reading stored permission snapshot failed: {}", e);
                return Err(match failure {
                    Error::NoSnapshot => e.into(),
                    failure => failure,
                });
            }
        };
        let Some((version, stored)) = latest else {
            return Err(failure);
        };
        match Snapshot::build(stored, version) {
            Ok(snapshot) => {
                warn!("falling back to stored permission snapshot v{}", version);
                let gate = Gate::install(snapshot, Some(store));
                gate.next_version.store(next, Ordering::SeqCst);
                Ok(gate)
            }
            Err(e) => {
                warn!("stored permission snapshot v{} is unusable: {}", version, e);
                Err(failure)
            }
        }
    }

    fn install(snapshot: Snapshot, store: Option<SnapshotStore>) -> Gate {
        Gate {
            next_version: AtomicU64::new(snapshot.version() + 1),
            current: RwLock::new(Arc::new(snapshot)),
            reload_lock: Mutex::new(()),
            store,
        }
    }

    /// The snapshot queries should run against
    #[inline]
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn version(&self) -> u64 {
        self.current().version()
    }

    pub fn store(&self) -> Option<&SnapshotStore> {
        self.store.as_ref()
    }

    /// Validate `raw` and swap it in; returns the installed snapshot
    ///
    /// On any error the current snapshot is untouched.
    pub fn reload(&self, raw: RawConfig) -> Result<Arc<Snapshot>> {
        let _serial = self.reload_lock.lock().unwrap_or_else(|p| p.into_inner());
        let version = self.next_version.load(Ordering::SeqCst);
        let snapshot = match Snapshot::build(raw, version) {
            Ok(s) => s,
            Err(e) => {
                for d in e.details() {
                    warn!("rejected permission reload: {}", d);
                }
                return Err(e);
            }
        };
        if let Some(store) = &self.store {
            store.save(version, snapshot.fingerprint(), snapshot.raw())?;
            if let Err(e) = store.prune(DEFAULT_KEEP_SNAPSHOTS) {
                warn!("pruning stored snapshots failed: {}", e);
            }
        }
        info!("installed permission snapshot v{} ({})", version, snapshot.fingerprint());
        let snapshot = Arc::new(snapshot);
        *self.current.write().unwrap_or_else(|p| p.into_inner()) = snapshot.clone();
        self.next_version.store(version + 1, Ordering::SeqCst);
        Ok(snapshot)
    }

    #[inline]
    pub fn is_allowed(&self, role: Role, module_id: &str, action: &str) -> bool {
        self.current().is_allowed(role, module_id, action)
    }

    pub fn allowed_actions(&self, role: Role, module_id: &str) -> Vec<String> {
        self.current()
            .allowed_actions(role, module_id)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn project_navigation(&self, role: Role, current_path: &str) -> Vec<NavItem> {
        self.current().project_navigation(role, current_path)
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("version", &self.version())
            .field("store", &self.store)
            .finish()
    }
}

// Global gate

static GATE: OnceLock<Gate> = OnceLock::new();

fn install_global(gate: Gate) {
    if GATE.set(gate).is_err() {
        warn!("permission gate already initialized; keeping the existing one");
    }
}

/// Install the process-wide gate; later calls are no-ops
pub fn init(raw: RawConfig) -> Result<()> {
    if GATE.get().is_some() {
        return Ok(());
    }
    install_global(Gate::new(raw)?);
    Ok(())
}

/// Install the process-wide gate backed by a store at `path`
pub fn init_with_store(raw: Option<RawConfig>, path: &str) -> Result<()> {
    if GATE.get().is_some() {
        return Ok(());
    }
    let store = SnapshotStore::open(path)?;
    install_global(Gate::with_store(raw, store)?);
    Ok(())
}

pub fn gate() -> Result<&'static Gate> {
    GATE.get().ok_or(Error::NotInitialized)
}

/// Current global snapshot, `None` before `init`
pub fn current() -> Option<Arc<Snapshot>> {
    GATE.get().map(Gate::current)
}

/// Denied before `init`
pub fn is_allowed(role: Role, module_id: &str, action: &str) -> bool {
    GATE.get().is_some_and(|g| g.is_allowed(role, module_id, action))
}

pub fn allowed_actions(role: Role, module_id: &str) -> Vec<String> {
    GATE.get().map(|g| g.allowed_actions(role, module_id)).unwrap_or_default()
}

pub fn project_navigation(role: Role, current_path: &str) -> Vec<NavItem> {
    GATE.get().map(|g| g.project_navigation(role, current_path)).unwrap_or_default()
}

/// Reload the global gate; returns the new version
pub fn reload(raw: RawConfig) -> Result<u64> {
    gate()?.reload(raw).map(|s| s.version())
}
