//! A catalog paired with the hierarchy built from the same registry

use log::debug;

use crate::catalog::Catalog;
use crate::error::{Result, SourceError};
use crate::hierarchy::HierarchyIndex;
use crate::projection::{self, NavItem};
use crate::resolver::Resolver;
use crate::role::Role;
use crate::source::RawConfig;

/// Immutable unit of permission state; replaced wholesale on reload
#[derive(Debug, Clone)]
pub struct Snapshot {
    version: u64,
    fingerprint: String,
    raw: RawConfig,
    catalog: Catalog,
    hierarchy: HierarchyIndex,
}

impl Snapshot {
    /// Validate `raw`, index its hierarchy and pair the two
    ///
    /// Loader defects and hierarchy cycles come back together as one
    /// [`Error::Load`](crate::Error::Load) batch.
    pub fn build(raw: RawConfig, version: u64) -> Result<Snapshot> {
        let (catalog, hierarchy) = Catalog::load_indexed(&raw)?;
        let fingerprint = raw.fingerprint().map_err(SourceError::Json)?;
        debug!(
            "built snapshot v{} ({} modules, {} actions, fingerprint {})",
            version,
            hierarchy.len(),
            catalog.registry().actions().len(),
            &fingerprint[..12]
        );
        Ok(Snapshot { version, fingerprint, raw, catalog, hierarchy })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Hex SHA-256 of the raw configuration this snapshot was built from
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn raw(&self) -> &RawConfig {
        &self.raw
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn hierarchy(&self) -> &HierarchyIndex {
        &self.hierarchy
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.catalog, &self.hierarchy)
    }

    #[inline]
    pub fn is_allowed(&self, role: Role, module_id: &str, action: &str) -> bool {
        self.resolver().is_allowed(role, module_id, action)
    }

    pub fn allowed_actions(&self, role: Role, module_id: &str) -> Vec<&str> {
        self.resolver().allowed_actions(role, module_id)
    }

    pub fn project_navigation(&self, role: Role, current_path: &str) -> Vec<NavItem> {
        projection::project_navigation(self, role, current_path)
    }
}
