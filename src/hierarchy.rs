//! Module hierarchy index
//!
//! For every module, the chain of module indices from the root down to the
//! module itself. Built in one pass over the registry's parent links and never
//! patched afterwards; a reload builds a fresh index.

use std::collections::HashMap;

use crate::error::CycleError;
use crate::registry::ModuleRegistry;

/// Ancestor chains, children and roots of a module registry
#[derive(Debug, Clone, Default)]
pub struct HierarchyIndex {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    chains: Vec<Vec<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

/// Build the index, rejecting parent links that loop
pub fn build(registry: &ModuleRegistry) -> Result<HierarchyIndex, CycleError> {
    HierarchyIndex::build(registry)
}

impl HierarchyIndex {
    pub fn build(registry: &ModuleRegistry) -> Result<Self, CycleError> {
        let n = registry.len();
        let ids: Vec<String> = registry.iter().map(|m| m.module_id.clone()).collect();
        let mut chains: Vec<Option<Vec<usize>>> = vec![None; n];
        let mut on_path = vec![false; n];
        let mut path = Vec::new();

        for start in 0..n {
            if chains[start].is_some() {
                continue;
            }
            // Climb until a root or an already-resolved module
            let mut cur = start;
            let mut base = Vec::new();
            loop {
                if let Some(c) = &chains[cur] {
                    base = c.clone();
                    break;
                }
                if on_path[cur] {
                    return Err(CycleError(ids[cur].clone()));
                }
                on_path[cur] = true;
                path.push(cur);
                match registry.parent_idx(cur) {
                    Some(p) => cur = p,
                    None => break,
                }
            }
            for &m in path.iter().rev() {
                base.push(m);
                chains[m] = Some(base.clone());
                on_path[m] = false;
            }
            path.clear();
        }

        let mut children = vec![Vec::new(); n];
        let mut roots = Vec::new();
        for i in 0..n {
            match registry.parent_idx(i) {
                Some(p) => children[p].push(i),
                None => roots.push(i),
            }
        }

        Ok(HierarchyIndex {
            index: ids.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect(),
            ids,
            chains: chains.into_iter().map(Option::unwrap_or_default).collect(),
            children,
            roots,
        })
    }

    /// Root-to-leaf chain of indices ending at `idx`
    #[inline]
    pub(crate) fn chain_idx(&self, idx: usize) -> &[usize] {
        &self.chains[idx]
    }

    #[inline]
    pub(crate) fn roots_idx(&self) -> &[usize] {
        &self.roots
    }

    fn names(&self, idx: &[usize]) -> Vec<&str> {
        idx.iter().map(|&i| self.ids[i].as_str()).collect()
    }

    /// Ancestor chain of a module, root first, ending with the module itself
    pub fn chain(&self, module_id: &str) -> Option<Vec<&str>> {
        self.index.get(module_id).map(|&i| self.names(&self.chains[i]))
    }

    pub fn parent(&self, module_id: &str) -> Option<&str> {
        let chain = &self.chains[*self.index.get(module_id)?];
        chain.len().checked_sub(2).map(|p| self.ids[chain[p]].as_str())
    }

    /// Direct children in registry order
    pub fn children(&self, module_id: &str) -> Vec<&str> {
        self.index
            .get(module_id)
            .map(|&i| self.names(&self.children[i]))
            .unwrap_or_default()
    }

    /// Top-level modules in registry order
    pub fn roots(&self) -> Vec<&str> {
        self.names(&self.roots)
    }

    /// Zero for top-level modules
    pub fn depth(&self, module_id: &str) -> Option<usize> {
        self.index.get(module_id).map(|&i| self.chains[i].len() - 1)
    }

    pub fn contains(&self, module_id: &str) -> bool {
        self.index.contains_key(module_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
