//! Navigation projection
//!
//! The only surface presentation code consumes: labels, targets and resolved
//! booleans. Inheritance never leaks past this layer.

use serde::Serialize;

use crate::constants::NAV_VISIBILITY_ACTION;
use crate::role::Role;
use crate::snapshot::Snapshot;

/// A resolved navigation item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub module_id: String,
    pub label: String,
    pub target: String,
    pub active: bool,
    pub visible: bool,
}

/// Ordered navigation for `role` with `active` and `visible` resolved
///
/// Roles without a configured navigation list get every top-level module in
/// registry order, targeting `/<role>/<module_id>`.
pub fn project_navigation(snapshot: &Snapshot, role: Role, current_path: &str) -> Vec<NavItem> {
    let resolver = snapshot.resolver();
    let registry = snapshot.catalog().registry();
    let item = |module: usize, target: String, label: Option<&str>| {
        let def = registry.at(module);
        NavItem {
            module_id: def.module_id.clone(),
            label: label.unwrap_or(&def.label).to_string(),
            active: path_matches(current_path, &target),
            visible: resolver.is_allowed(role, &def.module_id, NAV_VISIBILITY_ACTION),
            target,
        }
    };

    match snapshot.catalog().navigation(role) {
        Some(entries) => entries
            .iter()
            .map(|e| item(e.module, e.path.clone(), e.label.as_deref()))
            .collect(),
        None => snapshot
            .hierarchy()
            .roots_idx()
            .iter()
            .map(|&m| item(m, format!("/{}/{}", role, registry.at(m).module_id), None))
            .collect(),
    }
}

/// Only the items the role may see
pub fn project_visible_navigation(snapshot: &Snapshot, role: Role, current_path: &str) -> Vec<NavItem> {
    project_navigation(snapshot, role, current_path)
        .into_iter()
        .filter(|i| i.visible)
        .collect()
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    match path.trim_end_matches('/') {
        "" => "/",
        p => p,
    }
}

/// `current` is the target itself or a route beneath it
pub(crate) fn path_matches(current: &str, target: &str) -> bool {
    let (current, target) = (normalize(current), normalize(target));
    if current == target {
        return true;
    }
    target != "/"
        && current
            .strip_prefix(target)
            .is_some_and(|rest| rest.starts_with('/'))
}
