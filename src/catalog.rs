//! Permission catalog loader
//!
//! Turns a [`RawConfig`] into an immutable [`Catalog`]. Validation walks the
//! whole document and collects every defect before failing, so one attempt
//! surfaces all of them.

use std::collections::HashMap;

use crate::error::{LoadError, LoadErrors};
use crate::hierarchy::HierarchyIndex;
use crate::registry::ModuleRegistry;
use crate::role::Role;
use crate::source::{RawConfig, RawNavEntry, RawPermissionDocument};

/// Per-role module entries: module index -> action mask
///
/// An entry with an empty mask is still an entry; it denies everything and
/// stops inheritance at that module.
#[derive(Debug, Clone, Default)]
pub struct UserPermissions {
    entries: HashMap<usize, u64>,
}

impl UserPermissions {
    #[inline]
    pub(crate) fn entry(&self, module: usize) -> Option<u64> {
        self.entries.get(&module).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A validated navigation item for one role
#[derive(Debug, Clone)]
pub(crate) struct NavEntry {
    pub(crate) module: usize,
    pub(crate) path: String,
    pub(crate) label: Option<String>,
}

/// Validated registry plus every role's permissions
#[derive(Debug, Clone)]
pub struct Catalog {
    registry: ModuleRegistry,
    permissions: Vec<UserPermissions>,
    navigation: Vec<Option<Vec<NavEntry>>>,
}

impl Catalog {
    /// Validate and build; fails with every defect found
    pub fn load(raw: &RawConfig) -> Result<Catalog, LoadErrors> {
        Self::load_indexed(raw).map(|(catalog, _)| catalog)
    }

    /// Validate and build together with the hierarchy index
    ///
    /// Parent-link cycles are found on the best-effort registry and reported
    /// in the same batch as every other defect.
    pub(crate) fn load_indexed(raw: &RawConfig) -> Result<(Catalog, HierarchyIndex), LoadErrors> {
        let mut errors = Vec::new();
        let registry = ModuleRegistry::collect(&raw.modules, &mut errors);
        let hierarchy = match HierarchyIndex::build(&registry) {
            Ok(h) => Some(h),
            Err(e) => {
                errors.push(e.into());
                None
            }
        };

        let mut permissions: Vec<Option<UserPermissions>> = Role::ALL.iter().map(|_| None).collect();
        for (name, doc) in raw.roles.iter() {
            let role = match name.parse::<Role>() {
                Ok(r) => r,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };
            if permissions[role.index()].is_some() {
                errors.push(LoadError::DuplicateRole(role));
                continue;
            }
            permissions[role.index()] = Some(load_document(&registry, role, doc, &mut errors));
        }
        for role in Role::ALL {
            if permissions[role.index()].is_none() {
                errors.push(LoadError::MissingRole(role));
            }
        }

        let mut navigation: Vec<Option<Vec<NavEntry>>> = Role::ALL.iter().map(|_| None).collect();
        for (name, items) in raw.navigation.iter() {
            let role = match name.parse::<Role>() {
                Ok(r) => r,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };
            if navigation[role.index()].is_some() {
                errors.push(LoadError::DuplicateRole(role));
                continue;
            }
            navigation[role.index()] = Some(load_navigation(&registry, role, items, &mut errors));
        }

        if let Some(e) = LoadErrors::from_vec(errors) {
            return Err(e);
        }
        let catalog = Catalog {
            registry,
            permissions: permissions.into_iter().map(Option::unwrap_or_default).collect(),
            navigation,
        };
        Ok((catalog, hierarchy.unwrap_or_default()))
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn permissions(&self, role: Role) -> &UserPermissions {
        &self.permissions[role.index()]
    }

    /// Actions listed directly on a module for a role, ignoring inheritance
    ///
    /// `None` when the role has no entry for the module.
    pub fn explicit_actions(&self, role: Role, module_id: &str) -> Option<Vec<&str>> {
        let idx = self.registry.index_of(module_id)?;
        let mask = self.permissions(role).entry(idx)?;
        Some(self.registry.actions().names(mask))
    }

    pub(crate) fn navigation(&self, role: Role) -> Option<&[NavEntry]> {
        self.navigation[role.index()].as_deref()
    }
}

fn load_document(
    registry: &ModuleRegistry,
    role: Role,
    doc: &RawPermissionDocument,
    errors: &mut Vec<LoadError>,
) -> UserPermissions {
    let mut entries = HashMap::with_capacity(doc.len());
    for (module, grant) in doc.iter() {
        let Some(idx) = registry.index_of(module) else {
            errors.push(LoadError::UnknownModule { role, module: module.to_string() });
            continue;
        };
        if entries.contains_key(&idx) {
            errors.push(LoadError::DuplicateEntry { role, module: module.to_string() });
            continue;
        }
        let mut mask = 0u64;
        for action in &grant.actions {
            match registry.actions().bit(action) {
                Some(b) if registry.allowed_mask(idx) & b != 0 => mask |= b,
                _ => errors.push(LoadError::UnknownAction {
                    role,
                    module: module.to_string(),
                    action: action.clone(),
                }),
            }
        }
        entries.insert(idx, mask);
    }
    UserPermissions { entries }
}

fn load_navigation(
    registry: &ModuleRegistry,
    role: Role,
    items: &[RawNavEntry],
    errors: &mut Vec<LoadError>,
) -> Vec<NavEntry> {
    items
        .iter()
        .filter_map(|item| match registry.index_of(&item.module) {
            Some(module) => Some(NavEntry {
                module,
                path: item.path.clone(),
                label: item.label.clone(),
            }),
            None => {
                errors.push(LoadError::UnknownNavModule { role, module: item.module.clone() });
                None
            }
        })
        .collect()
}
