//! Query result cache keyed by query name and parameters.
//!
//! Indexer responses are stored as JSON values and decoded on read. Nothing
//! expires on its own: callers invalidate a single key or every
//! parameterisation of a query after a write that changes it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub name: String,
    pub params: BTreeMap<String, String>,
}

impl QueryKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (k, v) in &self.params {
            write!(f, " {k}={v}")?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cached value for {key} has unexpected shape: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("fetch for {key} failed: {reason}")]
    Fetch { key: String, reason: String },
}

/// Handle to a cache shared between views.
pub type SharedCache = Arc<Mutex<QueryCache>>;

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, serde_json::Value>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh cache behind a shareable handle.
    pub fn shared() -> SharedCache {
        Arc::new(Mutex::new(QueryCache::new()))
    }

    /// Process-wide cache. Every handle points at the same entries.
    pub fn global() -> SharedCache {
        static GLOBAL: OnceLock<SharedCache> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(QueryCache::shared))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert<T: Serialize>(&mut self, key: QueryKey, value: &T) -> Result<(), CacheError> {
        let json = serde_json::to_value(value).map_err(|source| CacheError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.entries.insert(key, json);
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<Option<T>, CacheError> {
        match self.entries.get(key) {
            Some(json) => serde_json::from_value(json.clone())
                .map(Some)
                .map_err(|source| CacheError::Decode {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Cached value, or run `fetch` and store what it returns.
    pub fn get_or_fetch<T, E, F>(&mut self, key: QueryKey, fetch: F) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned,
        E: fmt::Display,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(hit) = self.get(&key)? {
            return Ok(hit);
        }
        debug!(query = %key, "cache miss");
        let value = fetch().map_err(|e| CacheError::Fetch {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.insert(key, &value)?;
        Ok(value)
    }

    pub fn invalidate_key(&mut self, key: &QueryKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every cached parameterisation of `name`. Returns how many went.
    pub fn invalidate_query(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| k.name != name);
        let removed = before - self.entries.len();
        debug!(query = name, removed, "cache invalidated");
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
