//! Well-known action names and limits

// Common action names; registries may define others
pub const VIEW: &str = "view";
pub const CREATE: &str = "create";
pub const EDIT: &str = "edit";
pub const DELETE: &str = "delete";
pub const APPROVE: &str = "approve";

/// Action that decides whether a navigation item is shown
pub const NAV_VISIBILITY_ACTION: &str = VIEW;

/// Distinct action names one registry can intern (one bit each in a u64 mask)
pub const MAX_ACTIONS: usize = 64;

/// LMDB map size for the snapshot store
pub const STORE_MAP_SIZE: usize = 1 << 26;

/// Stored snapshots kept after each reload
pub const DEFAULT_KEEP_SNAPSHOTS: usize = 8;
