//! Raw configuration documents
//!
//! These are the unvalidated shapes handed to the catalog loader. JSON
//! objects are read into [`OrderedMap`], which keeps document order and
//! duplicate keys so the loader can report them.

use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::SourceError;

/// String-keyed map that preserves document order and duplicates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        OrderedMap(Vec::new())
    }

    /// Append an entry (an existing key is not replaced)
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        self.0.push((key.into(), value));
    }

    /// First entry with this key
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        OrderedMap::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        OrderedMap(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        struct MapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for MapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map with string keys")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((k, v)) = access.next_entry::<String, V>()? {
                    entries.push((k, v));
                }
                Ok(OrderedMap(entries))
            }
        }

        d.deserialize_map(MapVisitor(PhantomData))
    }
}

/// One registry entry: `{ label, parent_module_id?, allowed_actions }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawModule {
    pub label: String,
    #[serde(default, alias = "parentModuleId", skip_serializing_if = "Option::is_none")]
    pub parent_module_id: Option<String>,
    #[serde(default, alias = "allowedActions")]
    pub allowed_actions: Vec<String>,
}

impl RawModule {
    pub fn new(label: &str, parent: Option<&str>, actions: &[&str]) -> Self {
        RawModule {
            label: label.to_string(),
            parent_module_id: parent.map(str::to_string),
            allowed_actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// One module entry in a role's permission document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGrant {
    #[serde(default)]
    pub actions: Vec<String>,
}

impl RawGrant {
    pub fn new(actions: &[&str]) -> Self {
        RawGrant { actions: actions.iter().map(|a| a.to_string()).collect() }
    }
}

/// `{ module_id: { actions: [...] } }` for one role
pub type RawPermissionDocument = OrderedMap<RawGrant>;

/// One navigation item for a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNavEntry {
    pub module: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Everything the catalog loader consumes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConfig {
    pub modules: OrderedMap<RawModule>,
    pub roles: OrderedMap<RawPermissionDocument>,
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub navigation: OrderedMap<Vec<RawNavEntry>>,
}

impl RawConfig {
    pub fn from_json_str(s: &str) -> Result<Self, SourceError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_slice(b: &[u8]) -> Result<Self, SourceError> {
        Ok(serde_json::from_slice(b)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let content = std::fs::read(path).map_err(|source| SourceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_slice(&content)
    }

    /// Canonical encoding; stored snapshots and fingerprints use these bytes
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Hex SHA-256 of the canonical encoding
    pub fn fingerprint(&self) -> serde_json::Result<String> {
        let digest = Sha256::digest(self.to_json()?);
        Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }
}
