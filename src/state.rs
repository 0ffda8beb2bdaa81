//! Process-wide mutable state shared by every log call: the customer
//! token and the global fields and tags.
//!
//! Each piece sits behind its own lock. Readers take a copy and release
//! the lock straight away, so a log call never holds two of these locks
//! at once, and never holds any of them while touching the queue.

use crate::error::ConfigError;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Customer token slot. Empty until `initialize` is called.
#[derive(Debug, Clone, Default)]
pub struct Token {
    inner: Arc<RwLock<Option<String>>>,
}

impl Token {
    /// Set or replace the token. Blank tokens are rejected and leave the
    /// previous value in place.
    pub fn set(&self, token: impl Into<String>) -> Result<(), ConfigError> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyToken);
        }
        *self.inner.write() = Some(trimmed.to_string());
        Ok(())
    }

    pub fn get(&self) -> Option<String> {
        self.inner.read().clone()
    }

    pub fn is_set(&self) -> bool {
        self.inner.read().is_some()
    }
}

/// Live handle to the fields attached to every subsequent record.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    inner: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl Fields {
    /// Insert or replace a field, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner.write().insert(key.into(), value.into())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.write().remove(key)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Deep copy of the current fields.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.inner.read().clone()
    }
}

/// Live handle to the tags attached to every subsequent record.
///
/// Tags keep insertion order and never contain duplicates.
#[derive(Debug, Clone, Default)]
pub struct Tags {
    inner: Arc<RwLock<Vec<String>>>,
}

impl Tags {
    /// Append a tag. Returns `false` if it was already present or blank.
    pub fn add(&self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if tag.trim().is_empty() {
            return false;
        }
        let mut tags = self.inner.write();
        if tags.contains(&tag) {
            return false;
        }
        tags.push(tag);
        true
    }

    /// Remove a tag. Returns `false` if it was not present.
    pub fn remove(&self, tag: &str) -> bool {
        let mut tags = self.inner.write();
        match tags.iter().position(|t| t == tag) {
            Some(pos) => {
                tags.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.inner.read().iter().any(|t| t == tag)
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_rejects_blank_and_keeps_previous() {
        let token = Token::default();
        assert!(!token.is_set());
        assert_eq!(token.set(""), Err(ConfigError::EmptyToken));
        assert_eq!(token.set("   "), Err(ConfigError::EmptyToken));
        assert!(!token.is_set());

        token.set("ABC").unwrap();
        assert_eq!(token.set(""), Err(ConfigError::EmptyToken));
        assert_eq!(token.get().as_deref(), Some("ABC"));

        token.set(" XYZ\n").unwrap();
        assert_eq!(token.get().as_deref(), Some("XYZ"));
    }

    #[test]
    fn fields_are_shared_between_clones() {
        let fields = Fields::default();
        let other = fields.clone();
        other.insert("env", "prod");
        assert_eq!(fields.get("env"), Some(json!("prod")));
        assert_eq!(fields.insert("env", "dev"), Some(json!("prod")));
        assert_eq!(fields.remove("env"), Some(json!("dev")));
        assert!(other.is_empty());
    }

    #[test]
    fn field_snapshot_is_detached() {
        let fields = Fields::default();
        fields.insert("a", 1);
        let snap = fields.snapshot();
        fields.insert("b", 2);
        fields.remove("a");
        assert_eq!(snap.len(), 1);
        assert_eq!(snap["a"], json!(1));
    }

    #[test]
    fn tags_keep_order_and_reject_duplicates() {
        let tags = Tags::default();
        assert!(tags.add("ios"));
        assert!(tags.add("beta"));
        assert!(!tags.add("ios"));
        assert!(!tags.add(" "));
        assert_eq!(tags.snapshot(), vec!["ios", "beta"]);

        assert!(tags.remove("ios"));
        assert!(!tags.remove("ios"));
        assert!(tags.add("ios"));
        assert_eq!(tags.snapshot(), vec!["beta", "ios"]);
    }

    #[test]
    fn concurrent_mutation_is_safe() {
        let tags = Tags::default();
        let fields = Fields::default();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tags = tags.clone();
                let fields = fields.clone();
                std::thread::spawn(move || {
                    for j in 0..100 {
                        tags.add(format!("t{}", j % 10));
                        fields.insert(format!("k{i}"), j);
                        let _ = fields.snapshot();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(tags.len(), 10);
        assert_eq!(fields.len(), 8);
    }
}
