//! Global module registry and action bit table

use std::collections::{HashMap, HashSet};

use crate::constants::MAX_ACTIONS;
use crate::error::{LoadError, LoadErrors};
use crate::source::{OrderedMap, RawModule};

/// Interned action names; each distinct name owns one mask bit
#[derive(Debug, Clone, Default)]
pub struct ActionTable {
    names: Vec<String>,
    bits: HashMap<String, u64>,
}

impl ActionTable {
    /// Intern `name`, returning its bit (None once all 64 bits are taken)
    fn intern(&mut self, name: &str) -> Option<u64> {
        if let Some(&b) = self.bits.get(name) {
            return Some(b);
        }
        if self.names.len() >= MAX_ACTIONS {
            return None;
        }
        let b = 1u64 << self.names.len();
        self.names.push(name.to_string());
        self.bits.insert(name.to_string(), b);
        Some(b)
    }

    /// Bit for an action name; unknown names have none
    #[inline]
    pub fn bit(&self, name: &str) -> Option<u64> {
        self.bits.get(name).copied()
    }

    /// Convert a mask to action names, in interning order
    pub fn names(&self, mask: u64) -> Vec<&str> {
        self.names
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1u64 << i) != 0)
            .map(|(_, n)| n.as_str())
            .collect()
    }

    /// Convert action names to a mask; unknown names contribute nothing
    pub fn mask<S: AsRef<str>>(&self, names: &[S]) -> u64 {
        names
            .iter()
            .filter_map(|n| self.bit(n.as_ref()))
            .fold(0, |a, b| a | b)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One navigable capability area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDefinition {
    pub module_id: String,
    pub label: String,
    pub parent_module_id: Option<String>,
    pub allowed_actions: Vec<String>,
}

/// Validated modules in document order
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDefinition>,
    parents: Vec<Option<usize>>,
    allowed: Vec<u64>,
    index: HashMap<String, usize>,
    actions: ActionTable,
}

impl ModuleRegistry {
    /// Validate a raw registry, reporting every defect
    pub fn from_raw(raw: &OrderedMap<RawModule>) -> Result<Self, LoadErrors> {
        let mut errors = Vec::new();
        let reg = Self::collect(raw, &mut errors);
        match LoadErrors::from_vec(errors) {
            Some(e) => Err(e),
            None => Ok(reg),
        }
    }

    /// Best-effort build: defects go to `errors`, offending parts are skipped
    pub(crate) fn collect(raw: &OrderedMap<RawModule>, errors: &mut Vec<LoadError>) -> Self {
        let mut reg = ModuleRegistry::default();
        let mut overflow: HashSet<&str> = HashSet::new();

        for (id, m) in raw.iter() {
            if reg.index.contains_key(id) {
                errors.push(LoadError::DuplicateModule(id.to_string()));
                continue;
            }
            let mut mask = 0u64;
            for a in &m.allowed_actions {
                match reg.actions.intern(a) {
                    Some(b) => mask |= b,
                    None => {
                        overflow.insert(a.as_str());
                    }
                }
            }
            reg.index.insert(id.to_string(), reg.modules.len());
            reg.allowed.push(mask);
            reg.modules.push(ModuleDefinition {
                module_id: id.to_string(),
                label: m.label.clone(),
                parent_module_id: m.parent_module_id.clone(),
                allowed_actions: m.allowed_actions.clone(),
            });
        }
        if !overflow.is_empty() {
            errors.push(LoadError::TooManyActions(MAX_ACTIONS + overflow.len()));
        }

        // Parents resolve after every id is known so forward references work
        for m in &reg.modules {
            let parent = match &m.parent_module_id {
                Some(p) => match reg.index.get(p) {
                    Some(&i) => Some(i),
                    None => {
                        errors.push(LoadError::UnknownParent {
                            module: m.module_id.clone(),
                            parent: p.clone(),
                        });
                        None
                    }
                },
                None => None,
            };
            reg.parents.push(parent);
        }
        reg
    }

    #[inline]
    pub fn index_of(&self, module_id: &str) -> Option<usize> {
        self.index.get(module_id).copied()
    }

    pub fn get(&self, module_id: &str) -> Option<&ModuleDefinition> {
        self.index_of(module_id).map(|i| &self.modules[i])
    }

    #[inline]
    pub(crate) fn at(&self, idx: usize) -> &ModuleDefinition {
        &self.modules[idx]
    }

    #[inline]
    pub(crate) fn parent_idx(&self, idx: usize) -> Option<usize> {
        self.parents[idx]
    }

    /// Mask of the actions a module defines
    #[inline]
    pub(crate) fn allowed_mask(&self, idx: usize) -> u64 {
        self.allowed[idx]
    }

    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDefinition> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(entries: &[(&str, Option<&str>, Vec<&str>)]) -> OrderedMap<RawModule> {
        entries
            .iter()
            .map(|(id, p, a)| (*id, RawModule::new(id, *p, a)))
            .collect()
    }

    #[test]
    fn actions_intern_in_first_seen_order() {
        let reg = ModuleRegistry::from_raw(&raw(&[
            ("Orders", None, vec!["view", "create"]),
            ("Fleet", None, vec!["edit", "view"]),
        ]))
        .unwrap();
        let t = reg.actions();
        assert_eq!(t.len(), 3);
        assert_eq!(t.bit("view"), Some(1));
        assert_eq!(t.bit("create"), Some(2));
        assert_eq!(t.bit("edit"), Some(4));
        assert_eq!(t.names(0b101), vec!["view", "edit"]);
        assert_eq!(t.mask(&["edit", "approve"]), 4);
        assert_eq!(reg.allowed_mask(reg.index_of("Fleet").unwrap()), 0b101);
    }

    #[test]
    fn forward_parent_references_resolve() {
        let reg = ModuleRegistry::from_raw(&raw(&[
            ("Contracts", Some("Documents"), vec!["view"]),
            ("Documents", None, vec!["view"]),
        ]))
        .unwrap();
        assert_eq!(reg.parent_idx(0), Some(1));
        assert_eq!(reg.parent_idx(1), None);
    }

    #[test]
    fn defects_are_collected() {
        let errs = ModuleRegistry::from_raw(&raw(&[
            ("Fleet", None, vec!["view"]),
            ("Fleet", None, vec!["edit"]),
            ("Trips", Some("Vehicles"), vec!["view"]),
        ]))
        .unwrap_err();
        assert_eq!(
            errs.into_vec(),
            vec![
                LoadError::DuplicateModule("Fleet".into()),
                LoadError::UnknownParent { module: "Trips".into(), parent: "Vehicles".into() },
            ]
        );
    }

    #[test]
    fn sixty_five_actions_overflow_the_mask() {
        let names: Vec<String> = (0..65).map(|i| format!("a{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let errs = ModuleRegistry::from_raw(&raw(&[("Wide", None, refs)])).unwrap_err();
        assert!(errs.contains(&LoadError::TooManyActions(65)));
    }
}
