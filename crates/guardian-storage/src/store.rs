//! Preference stores
//!
//! `get` on a missing key returns `None`, which callers keep distinct from an
//! explicit `false`. Raw values follow `localStorage` conventions: empty text
//! reads as absent, and text that is not valid JSON is logged and treated as
//! absent.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::database::Database;

/// Narrow key-value interface the widget persists its choices through.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: &Value);

    fn remove(&self, key: &str);

    /// Keys currently stored, sorted.
    fn keys(&self) -> Vec<String>;

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(b),
            other => {
                tracing::debug!(key, value = %other, "Ignoring non-boolean preference");
                None
            }
        }
    }

    fn set_bool(&self, key: &str, value: bool) {
        self.set(key, &Value::Bool(value));
    }

    /// Remove every key starting with `prefix`.
    fn clear_namespace(&self, prefix: &str) {
        for key in self.keys() {
            if key.starts_with(prefix) {
                self.remove(&key);
            }
        }
    }
}

fn decode(key: &str, raw: &str) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }

    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding malformed stored preference");
            None
        }
    }
}

/// Session-only store. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw text as-is, bypassing JSON encoding.
    pub fn set_raw(&self, key: &str, raw: &str) {
        self.items.write().insert(key.to_string(), raw.to_string());
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        let raw = self.items.read().get(key).cloned()?;
        decode(key, &raw)
    }

    fn set(&self, key: &str, value: &Value) {
        self.set_raw(key, &value.to_string());
    }

    fn remove(&self, key: &str) {
        self.items.write().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.items.read().keys().cloned().collect()
    }
}

/// Durable store for one origin, backed by SQLite.
///
/// The first storage failure switches the store to a memory overlay for the
/// rest of the session. Keys written before the failure are not copied over.
pub struct DatabaseStore {
    db: Database,
    origin: String,
    fallback: MemoryStore,
    degraded: AtomicBool,
}

impl DatabaseStore {
    pub fn new(db: Database, origin: impl Into<String>) -> Self {
        Self {
            db,
            origin: origin.into(),
            fallback: MemoryStore::new(),
            degraded: AtomicBool::new(false),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Whether storage has failed and values now live in memory only.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    fn degrade(&self, op: &str, error: &crate::StorageError) {
        if !self.degraded.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                origin = %self.origin,
                op,
                error = %error,
                "Preference storage unavailable, keeping choices for this session only"
            );
        }
    }
}

impl PreferenceStore for DatabaseStore {
    fn get(&self, key: &str) -> Option<Value> {
        if self.is_degraded() {
            return self.fallback.get(key);
        }

        match self.db.get_item(&self.origin, key) {
            Ok(raw) => decode(key, &raw?),
            Err(e) => {
                self.degrade("get", &e);
                self.fallback.get(key)
            }
        }
    }

    fn set(&self, key: &str, value: &Value) {
        if !self.is_degraded() {
            match self.db.set_item(&self.origin, key, &value.to_string()) {
                Ok(()) => return,
                Err(e) => self.degrade("set", &e),
            }
        }
        self.fallback.set(key, value);
    }

    fn remove(&self, key: &str) {
        if !self.is_degraded() {
            match self.db.remove_item(&self.origin, key) {
                Ok(()) => return,
                Err(e) => self.degrade("remove", &e),
            }
        }
        self.fallback.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        if !self.is_degraded() {
            match self.db.keys(&self.origin) {
                Ok(keys) => return keys,
                Err(e) => self.degrade("keys", &e),
            }
        }
        self.fallback.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_is_distinct_from_false() {
        let store = MemoryStore::new();
        assert_eq!(store.get_bool("cookie-guardian-marketing"), None);

        store.set_bool("cookie-guardian-marketing", false);
        assert_eq!(store.get_bool("cookie-guardian-marketing"), Some(false));
    }

    #[test]
    fn test_raw_values_follow_local_storage_rules() {
        let store = MemoryStore::new();
        store.set_raw("empty", "");
        store.set_raw("garbage", "{not json");
        store.set_raw("text", "\"yes\"");

        assert_eq!(store.get("empty"), None);
        assert_eq!(store.get("garbage"), None);
        assert_eq!(store.get("text"), Some(json!("yes")));
        assert_eq!(store.get_bool("text"), None);
    }

    #[test]
    fn test_clear_namespace_keeps_foreign_keys() {
        let store = MemoryStore::new();
        store.set_bool("cookie-guardian", false);
        store.set_bool("cookie-guardian-statistics", true);
        store.set_bool("theme-dark", true);

        store.clear_namespace("cookie-guardian");

        assert_eq!(store.keys(), vec!["theme-dark"]);
    }

    #[test]
    fn test_database_store_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let store = DatabaseStore::new(db.clone(), "https://shop.test");

        store.set_bool("cookie-guardian-preferences", true);
        assert_eq!(store.get_bool("cookie-guardian-preferences"), Some(true));
        assert_eq!(
            db.get_item("https://shop.test", "cookie-guardian-preferences")
                .unwrap()
                .as_deref(),
            Some("true")
        );

        store.remove("cookie-guardian-preferences");
        assert_eq!(store.get_bool("cookie-guardian-preferences"), None);
        assert!(!store.is_degraded());
    }

    #[test]
    fn test_database_store_degrades_to_memory() {
        let db = Database::open_in_memory().unwrap();
        let store = DatabaseStore::new(db.clone(), "https://shop.test");

        db.with_connection(|conn| {
            conn.execute("DROP TABLE local_storage", [])?;
            Ok(())
        })
        .unwrap();

        store.set_bool("cookie-guardian-marketing", true);
        assert!(store.is_degraded());
        assert_eq!(store.get_bool("cookie-guardian-marketing"), Some(true));
        assert_eq!(store.keys(), vec!["cookie-guardian-marketing"]);
    }
}
