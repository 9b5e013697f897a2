//! Key-value store for device-level client state
//!
//! Values are JSON-encoded and kept in a sled tree. Keys can be addressed
//! directly or through scopes (`["device", "accessToken"]` is stored as
//! `device:accessToken`). Writes are last-write-wins; there are no
//! transactions across keys.

use serde::{de::DeserializeOwned, Serialize};
use sled::Db;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Separator between key scopes
const SCOPE_SEPARATOR: &str = ":";

/// Scope used by [`DeviceStore`]
const DEVICE_SCOPE: &str = "device";

/// Key-value store error types
#[derive(Debug, Error)]
pub enum KvError {
    /// Sled database error
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid key
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Result type for key-value operations
pub type Result<T> = std::result::Result<T, KvError>;

/// Key-value store configuration
#[derive(Debug, Clone)]
pub struct KvConfig {
    /// Database directory
    pub path: PathBuf,
    /// Cache capacity in bytes
    pub cache_capacity: u64,
    /// Enable compression
    pub use_compression: bool,
    /// Flush interval in milliseconds (None flushes only on demand)
    pub flush_every_ms: Option<u64>,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("faith_kv.db"),
            cache_capacity: 8 * 1024 * 1024,
            use_compression: true,
            flush_every_ms: Some(500),
        }
    }
}

impl KvConfig {
    /// Create a new configuration with a custom path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Set cache capacity in bytes
    pub fn cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Enable or disable compression
    pub fn use_compression(mut self, enabled: bool) -> Self {
        self.use_compression = enabled;
        self
    }

    /// Set flush interval in milliseconds
    pub fn flush_every_ms(mut self, ms: Option<u64>) -> Self {
        self.flush_every_ms = ms;
        self
    }
}

/// Key-value store backed by sled
#[derive(Clone)]
pub struct KvStore {
    db: Arc<Db>,
}

impl KvStore {
    /// Open (or create) a store with the given configuration
    pub fn open(config: KvConfig) -> Result<Self> {
        let db = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity)
            .use_compression(config.use_compression)
            .flush_every_ms(config.flush_every_ms)
            .open()?;

        debug!(path = %config.path.display(), "Opened key-value store");
        Ok(Self { db: Arc::new(db) })
    }

    /// Create a temporary store that is discarded on drop
    pub fn in_memory() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Get a value by key
    pub fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        Self::check_key(key)?;
        match self.db.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Set a value by key, replacing any previous value
    pub fn set<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        Self::check_key(key)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    /// Remove a value by key. Returns whether a value was present.
    pub fn remove(&self, key: &str) -> Result<bool> {
        Self::check_key(key)?;
        Ok(self.db.remove(key.as_bytes())?.is_some())
    }

    /// Check if a key exists
    pub fn contains(&self, key: &str) -> Result<bool> {
        Self::check_key(key)?;
        Ok(self.db.contains_key(key.as_bytes())?)
    }

    /// Get a value by scoped key
    pub fn get_scoped<T>(&self, scopes: &[&str]) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.get(&scopes.join(SCOPE_SEPARATOR))
    }

    /// Set a value by scoped key
    pub fn set_scoped<T>(&self, scopes: &[&str], value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.set(&scopes.join(SCOPE_SEPARATOR), value)
    }

    /// Remove a value by scoped key
    pub fn remove_scoped(&self, scopes: &[&str]) -> Result<bool> {
        self.remove(&scopes.join(SCOPE_SEPARATOR))
    }

    /// Get all keys with a given prefix
    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for item in self.db.scan_prefix(prefix.as_bytes()) {
            let (key, _) = item?;
            if let Ok(key) = String::from_utf8(key.to_vec()) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Get the number of keys in the store
    pub fn len(&self) -> usize {
        self.db.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    fn check_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(KvError::InvalidKey("key must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Device-scoped view of a [`KvStore`]
///
/// All keys are prefixed with `device:`. The session tokens live here.
#[derive(Clone)]
pub struct DeviceStore {
    kv: KvStore,
}

impl DeviceStore {
    /// Create a new device store
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    /// Get a device-level value
    pub fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.kv.get_scoped(&[DEVICE_SCOPE, key])
    }

    /// Set a device-level value
    pub fn set<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.kv.set_scoped(&[DEVICE_SCOPE, key], value)
    }

    /// Remove a device-level value
    pub fn remove(&self, key: &str) -> Result<bool> {
        self.kv.remove_scoped(&[DEVICE_SCOPE, key])
    }

    /// Remove several device-level values, returning how many existed
    pub fn remove_many(&self, keys: &[&str]) -> Result<usize> {
        let mut count = 0;
        for key in keys {
            if self.remove(key)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Check if a device-level key exists
    pub fn contains(&self, key: &str) -> Result<bool> {
        self.kv.contains(&[DEVICE_SCOPE, key].join(SCOPE_SEPARATOR))
    }

    /// Flush the underlying store
    pub fn flush(&self) -> Result<()> {
        self.kv.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Preference {
        name: String,
        enabled: bool,
    }

    #[test]
    fn test_kv_store_creation() {
        let kv = KvStore::in_memory().unwrap();
        assert!(kv.is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let kv = KvStore::in_memory().unwrap();
        kv.set("greeting", "salaam").unwrap();

        let value: Option<String> = kv.get("greeting").unwrap();
        assert_eq!(value, Some("salaam".to_string()));
    }

    #[test]
    fn test_set_and_get_struct() {
        let kv = KvStore::in_memory().unwrap();
        let pref = Preference { name: "notifications".to_string(), enabled: true };

        kv.set("pref", &pref).unwrap();

        let retrieved: Option<Preference> = kv.get("pref").unwrap();
        assert_eq!(retrieved, Some(pref));
    }

    #[test]
    fn test_overwrite_is_last_write_wins() {
        let kv = KvStore::in_memory().unwrap();
        kv.set("token", "first").unwrap();
        kv.set("token", "second").unwrap();

        let value: Option<String> = kv.get("token").unwrap();
        assert_eq!(value.as_deref(), Some("second"));
        assert_eq!(kv.len(), 1);
    }

    #[test]
    fn test_remove() {
        let kv = KvStore::in_memory().unwrap();
        kv.set("key", "value").unwrap();

        assert!(kv.remove("key").unwrap());
        assert!(!kv.contains("key").unwrap());
        assert!(!kv.remove("key").unwrap());
    }

    #[test]
    fn test_empty_key_rejected() {
        let kv = KvStore::in_memory().unwrap();
        let result = kv.set("", "value");
        assert!(matches!(result, Err(KvError::InvalidKey(_))));
    }

    #[test]
    fn test_scoped_keys_and_prefix_scan() {
        let kv = KvStore::in_memory().unwrap();
        kv.set_scoped(&["device", "accessToken"], "a").unwrap();
        kv.set_scoped(&["device", "refreshToken"], "r").unwrap();
        kv.set("other", "x").unwrap();

        let mut keys = kv.keys_with_prefix("device:").unwrap();
        keys.sort();
        assert_eq!(keys, vec!["device:accessToken", "device:refreshToken"]);

        let access: Option<String> = kv.get("device:accessToken").unwrap();
        assert_eq!(access.as_deref(), Some("a"));
    }

    #[test]
    fn test_device_store() {
        let device = DeviceStore::new(KvStore::in_memory().unwrap());

        device.set("accessToken", "token").unwrap();
        device.set("refreshToken", "refresh").unwrap();
        assert!(device.contains("accessToken").unwrap());

        let removed = device.remove_many(&["accessToken", "refreshToken", "missing"]).unwrap();
        assert_eq!(removed, 2);
        assert!(!device.contains("accessToken").unwrap());
        let value: Option<String> = device.get("refreshToken").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("kv");

        {
            let kv = KvStore::open(KvConfig::new(&path).flush_every_ms(None)).unwrap();
            kv.set("persisted", "yes").unwrap();
            kv.flush().unwrap();
        }

        let kv = KvStore::open(KvConfig::new(&path)).unwrap();
        let value: Option<String> = kv.get("persisted").unwrap();
        assert_eq!(value.as_deref(), Some("yes"));
    }
}
