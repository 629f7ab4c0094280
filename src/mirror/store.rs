//! MirrorStore: keyed in-memory replica of an external record set

use dashmap::DashMap;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Replica of one record type, keyed by the value of one identifier type.
#[derive(Debug)]
pub struct MirrorStore {
    /// Identifier type whose value keys each entry
    key_type: String,
    entries: DashMap<String, Value>,
}

impl MirrorStore {
    pub fn new(key_type: impl Into<String>) -> Self {
        Self {
            key_type: key_type.into(),
            entries: DashMap::new(),
        }
    }

    /// Create a store holding `entries`, e.g. a previously saved snapshot.
    pub fn with_entries(key_type: impl Into<String>, entries: BTreeMap<String, Value>) -> Self {
        let store = Self::new(key_type);
        for (key, value) in entries {
            store.entries.insert(key, value);
        }
        store
    }

    pub fn key_type(&self) -> &str {
        &self.key_type
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|r| r.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted copy of every entry
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.entries
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Replace everything with `updates`.
    pub fn replace_all(&self, updates: HashMap<String, Value>) {
        self.entries.clear();
        for (key, value) in updates {
            self.entries.insert(key, value);
        }
    }

    /// Remove `removals`, then upsert `updates`.
    pub fn apply(&self, removals: HashSet<String>, updates: HashMap<String, Value>) {
        for key in removals {
            self.entries.remove(&key);
        }
        for (key, value) in updates {
            self.entries.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded() -> MirrorStore {
        let entries = [("a".to_string(), json!("abc")), ("d".to_string(), json!("def"))]
            .into_iter()
            .collect();
        MirrorStore::with_entries("f", entries)
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = MirrorStore::new("f");
        assert!(store.is_empty());
        assert_eq!(store.key_type(), "f");
    }

    #[test]
    fn test_with_entries_and_snapshot() {
        let store = seeded();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a"), Some(json!("abc")));
        let keys: Vec<_> = store.snapshot().into_keys().collect();
        assert_eq!(keys, vec!["a", "d"]);
    }

    #[test]
    fn test_replace_all_drops_unmentioned() {
        let store = seeded();
        store.replace_all([("m".to_string(), json!("mno"))].into_iter().collect());
        assert!(!store.contains("a"));
        assert_eq!(store.get("m"), Some(json!("mno")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_apply_removes_then_upserts() {
        let store = seeded();
        store.apply(
            ["d".to_string(), "missing".to_string()].into_iter().collect(),
            [("g".to_string(), json!("ghi")), ("a".to_string(), json!("ABC"))]
                .into_iter()
                .collect(),
        );
        assert_eq!(store.get("a"), Some(json!("ABC")));
        assert!(!store.contains("d"));
        assert_eq!(store.get("g"), Some(json!("ghi")));
    }
}
