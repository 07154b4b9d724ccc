//! Error types for rolegate
//!
//! Load-time problems are collected, never short-circuited: a rejected
//! configuration reports every defect in one [`LoadErrors`] batch. Queries
//! never produce errors; anything unresolvable is a denial.

use std::fmt;

use thiserror::Error;

use crate::role::Role;

/// A single defect found while validating a raw configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("role {role}: unknown module '{module}'")]
    UnknownModule { role: Role, module: String },

    #[error("role {role}: module '{module}' does not allow action '{action}'")]
    UnknownAction { role: Role, module: String, action: String },

    #[error("no permission document for role {0}")]
    MissingRole(Role),

    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("role {0} is defined more than once")]
    DuplicateRole(Role),

    #[error("module '{0}' is defined more than once")]
    DuplicateModule(String),

    #[error("role {role}: module '{module}' has more than one entry")]
    DuplicateEntry { role: Role, module: String },

    #[error("module '{module}' names unknown parent '{parent}'")]
    UnknownParent { module: String, parent: String },

    #[error("role {role}: navigation references unknown module '{module}'")]
    UnknownNavModule { role: Role, module: String },

    #[error("registry defines {0} distinct actions, at most 64 are supported")]
    TooManyActions(usize),

    #[error("module hierarchy cycle through '{0}'")]
    Cycle(String),
}

impl From<CycleError> for LoadError {
    fn from(e: CycleError) -> Self {
        LoadError::Cycle(e.0)
    }
}

/// Every defect of one rejected configuration, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadErrors(Vec<LoadError>);

impl LoadErrors {
    /// Wrap collected defects; `None` when there were none
    pub fn from_vec(errors: Vec<LoadError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(LoadErrors(errors))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; an empty batch is never constructed
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LoadError> {
        self.0.iter()
    }

    pub fn contains(&self, e: &LoadError) -> bool {
        self.0.contains(e)
    }

    pub fn into_vec(self) -> Vec<LoadError> {
        self.0
    }
}

impl fmt::Display for LoadErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} configuration error(s)", self.0.len())?;
        for (i, e) in self.0.iter().enumerate() {
            write!(f, "{} {}", if i == 0 { ":" } else { ";" }, e)?;
        }
        Ok(())
    }
}

impl std::error::Error for LoadErrors {}

impl<'a> IntoIterator for &'a LoadErrors {
    type Item = &'a LoadError;
    type IntoIter = std::slice::Iter<'a, LoadError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The module registry's parent links loop back on themselves
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("module hierarchy cycle through '{0}'")]
pub struct CycleError(pub String);

/// Reading or parsing raw configuration documents
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Snapshot persistence failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("lmdb: {0}")]
    Lmdb(#[from] heed::Error),

    #[error("store directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored snapshot {version} is unreadable: {source}")]
    Decode {
        version: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("encoding snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("corrupt meta entry '{0}'")]
    CorruptMeta(String),

    #[error("meta points at missing snapshot {0}")]
    MissingSnapshot(u64),
}

/// Settings file failures
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot encode settings: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// The main error type for rolegate operations
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadErrors),

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("no configuration supplied and no stored snapshot available")]
    NoSnapshot,

    #[error("permission gate not initialized")]
    NotInitialized,
}

impl Error {
    /// Human-readable list of every problem carried by this error
    pub fn details(&self) -> Vec<String> {
        match self {
            Error::Load(errs) => errs.iter().map(|e| e.to_string()).collect(),
            other => vec![other.to_string()],
        }
    }
}

/// Result type alias for rolegate operations
pub type Result<T> = std::result::Result<T, Error>;
