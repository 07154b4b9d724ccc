//! Permission resolution with hierarchical inheritance
//!
//! Walk from the module toward the root and stop at the first module the role
//! has an entry for. That entry decides: listed actions are allowed, anything
//! else is denied, and nothing above it is consulted. Reaching past the root
//! without an entry denies.

use crate::catalog::Catalog;
use crate::hierarchy::HierarchyIndex;
use crate::role::Role;

/// Read-only query surface over one catalog and the hierarchy built with it
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    catalog: &'a Catalog,
    hierarchy: &'a HierarchyIndex,
}

impl<'a> Resolver<'a> {
    /// Only snapshots pair a catalog with its hierarchy
    pub(crate) fn new(catalog: &'a Catalog, hierarchy: &'a HierarchyIndex) -> Self {
        Resolver { catalog, hierarchy }
    }

    /// Effective mask (iterative, bounded by hierarchy depth)
    #[inline]
    pub(crate) fn resolve(&self, role: Role, idx: usize) -> u64 {
        let perms = self.catalog.permissions(role);
        self.hierarchy
            .chain_idx(idx)
            .iter()
            .rev()
            .find_map(|&m| perms.entry(m))
            .unwrap_or(0)
    }

    /// Effective action mask of a role on a module; 0 for unknown modules
    pub fn effective_mask(&self, role: Role, module_id: &str) -> u64 {
        self.catalog
            .registry()
            .index_of(module_id)
            .map(|idx| self.resolve(role, idx))
            .unwrap_or(0)
    }

    /// Whether `role` may perform `action` on `module_id`
    #[inline]
    pub fn is_allowed(&self, role: Role, module_id: &str, action: &str) -> bool {
        match self.catalog.registry().actions().bit(action) {
            Some(b) => self.effective_mask(role, module_id) & b != 0,
            None => false,
        }
    }

    /// Same as [`Resolver::is_allowed`] with the role given by name; unknown
    /// names are denied
    pub fn is_allowed_by_name(&self, role: &str, module_id: &str, action: &str) -> bool {
        role.parse::<Role>()
            .map(|r| self.is_allowed(r, module_id, action))
            .unwrap_or(false)
    }

    /// Every action `role` may perform on `module_id`, in action-table order
    pub fn allowed_actions(&self, role: Role, module_id: &str) -> Vec<&'a str> {
        let catalog: &'a Catalog = self.catalog;
        catalog
            .registry()
            .actions()
            .names(self.effective_mask(role, module_id))
    }

    /// Module whose entry decides `role`'s access to `module_id`, if any
    pub fn deciding_module(&self, role: Role, module_id: &str) -> Option<&'a str> {
        let catalog: &'a Catalog = self.catalog;
        let idx = catalog.registry().index_of(module_id)?;
        let perms = catalog.permissions(role);
        self.hierarchy
            .chain_idx(idx)
            .iter()
            .rev()
            .find(|&&m| perms.entry(m).is_some())
            .map(|&m| catalog.registry().at(m).module_id.as_str())
    }
}
