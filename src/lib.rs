//! Rolegate - role-scoped module permissions
//!
//! Loads per-role module permission documents against a global module
//! registry, indexes the module hierarchy, and answers permission and
//! navigation queries. A module with no entry for a role inherits from its
//! parent; a module with an entry decides on its own. Unknown roles, modules
//! and actions are denied.

pub mod catalog;
pub mod constants;
pub mod error;
pub mod gate;
pub mod hierarchy;
pub mod logging;
pub mod projection;
pub mod registry;
pub mod resolver;
pub mod role;
pub mod settings;
pub mod snapshot;
pub mod source;
pub mod store;

pub use catalog::{Catalog, UserPermissions};
pub use constants::{APPROVE, CREATE, DELETE, EDIT, VIEW};
pub use error::{CycleError, Error, LoadError, LoadErrors, Result, SettingsError, SourceError, StoreError};
pub use gate::{allowed_actions, current, gate, init, init_with_store, is_allowed, project_navigation, reload, Gate};
pub use hierarchy::HierarchyIndex;
pub use projection::{project_visible_navigation, NavItem};
pub use registry::{ActionTable, ModuleDefinition, ModuleRegistry};
pub use resolver::Resolver;
pub use role::Role;
pub use settings::{LogSettings, Settings};
pub use snapshot::Snapshot;
pub use source::{OrderedMap, RawConfig, RawGrant, RawModule, RawNavEntry, RawPermissionDocument};
pub use store::SnapshotStore;
