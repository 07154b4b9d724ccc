//! LMDB snapshot store
//!
//! Keeps the raw configuration of every installed snapshot so a restart can
//! fall back to the last known good one. Layout:
//! - `snapshots`: version (u64 big-endian) -> canonical JSON bytes
//! - `meta`: `current` -> version, `fingerprint` -> hex digest

use std::path::{Path, PathBuf};

use heed::types::{Bytes, Str, U64};
use heed::{Database, Env, EnvOpenOptions};

use crate::constants::STORE_MAP_SIZE;
use crate::error::StoreError;
use crate::source::RawConfig;

type SnapshotDb = Database<U64<byteorder::BigEndian>, Bytes>;
type MetaDb = Database<Str, Str>;

const META_CURRENT: &str = "current";
const META_FINGERPRINT: &str = "fingerprint";

type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistent history of installed configurations
#[derive(Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    env: Env,
    snapshots: SnapshotDb,
    meta: MetaDb,
}

impl SnapshotStore {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let env = unsafe { EnvOpenOptions::new().map_size(STORE_MAP_SIZE).max_dbs(2).open(path)? };
        let mut tx = env.write_txn()?;
        let snapshots = env.create_database(&mut tx, Some("snapshots"))?;
        let meta = env.create_database(&mut tx, Some("meta"))?;
        tx.commit()?;
        Ok(SnapshotStore { path: path.to_path_buf(), env, snapshots, meta })
    }

    /// Record `raw` as `version` and mark it current
    pub fn save(&self, version: u64, fingerprint: &str, raw: &RawConfig) -> StoreResult<()> {
        let bytes = raw.to_json().map_err(StoreError::Encode)?;
        let mut tx = self.env.write_txn()?;
        self.snapshots.put(&mut tx, &version, bytes.as_slice())?;
        self.meta.put(&mut tx, META_CURRENT, version.to_string().as_str())?;
        self.meta.put(&mut tx, META_FINGERPRINT, fingerprint)?;
        tx.commit()?;
        Ok(())
    }

    /// Version marked current, if any
    pub fn current_version(&self) -> StoreResult<Option<u64>> {
        let tx = self.env.read_txn()?;
        match self.meta.get(&tx, META_CURRENT)? {
            Some(s) => s
                .parse()
                .map(Some)
                .map_err(|_| StoreError::CorruptMeta(META_CURRENT.into())),
            None => Ok(None),
        }
    }

    pub fn current_fingerprint(&self) -> StoreResult<Option<String>> {
        let tx = self.env.read_txn()?;
        Ok(self.meta.get(&tx, META_FINGERPRINT)?.map(str::to_string))
    }

    /// The current snapshot's raw configuration
    pub fn latest(&self) -> StoreResult<Option<(u64, RawConfig)>> {
        let Some(version) = self.current_version()? else {
            return Ok(None);
        };
        match self.get(version)? {
            Some(raw) => Ok(Some((version, raw))),
            None => Err(StoreError::MissingSnapshot(version)),
        }
    }

    pub fn get(&self, version: u64) -> StoreResult<Option<RawConfig>> {
        let tx = self.env.read_txn()?;
        match self.snapshots.get(&tx, &version)? {
            Some(bytes) => serde_json::from_slice(bytes)
                .map(Some)
                .map_err(|source| StoreError::Decode { version, source }),
            None => Ok(None),
        }
    }

    /// Highest stored version (not necessarily current)
    pub fn last_version(&self) -> StoreResult<Option<u64>> {
        let tx = self.env.read_txn()?;
        Ok(self.snapshots.last(&tx)?.map(|(v, _)| v))
    }

    /// Stored versions, ascending
    pub fn versions(&self) -> StoreResult<Vec<u64>> {
        let tx = self.env.read_txn()?;
        let mut r = Vec::new();
        for item in self.snapshots.iter(&tx)? {
            let (v, _) = item?;
            r.push(v);
        }
        Ok(r)
    }

    /// Drop all but the newest `keep` versions; the current one always stays
    pub fn prune(&self, keep: usize) -> StoreResult<usize> {
        let versions = self.versions()?;
        let current = self.current_version()?;
        let cut = versions.len().saturating_sub(keep);
        let mut tx = self.env.write_txn()?;
        let mut removed = 0;
        for v in &versions[..cut] {
            if Some(*v) != current && self.snapshots.delete(&mut tx, v)? {
                removed += 1;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn clear(&self) -> StoreResult<()> {
        let mut tx = self.env.write_txn()?;
        self.snapshots.clear(&mut tx)?;
        self.meta.clear(&mut tx)?;
        tx.commit()?;
        Ok(())
    }
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore").field("path", &self.path).finish()
    }
}
