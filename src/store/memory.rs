// ABOUTME: In-process secret store backed by a sorted map.
// ABOUTME: Keeps every written version and mirrors Vault's list semantics.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};

use super::{Result, Secret, SecretStore, StoreError};

/// Secret store held in memory. Each path keeps its full version history.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Vec<Secret>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of versions written at `path`.
    pub fn version_count(&self, path: &str) -> usize {
        self.entries
            .lock()
            .get(normalize(path))
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// All paths that hold at least one version.
    pub fn paths(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<Secret> {
        self.entries
            .lock()
            .get(normalize(path))
            .and_then(|versions| versions.last().cloned())
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn write(&self, path: &str, data: Secret) -> Result<()> {
        self.entries
            .lock()
            .entry(normalize(path).to_string())
            .or_default()
            .push(data);
        Ok(())
    }

    async fn list(&self, path: &str) -> Result<Vec<String>> {
        let dir = normalize(path);
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };

        let children: BTreeSet<String> = self
            .entries
            .lock()
            .keys()
            .filter_map(|key| key.strip_prefix(prefix.as_str()))
            .map(|rest| match rest.split_once('/') {
                Some((child, _)) => format!("{}/", child),
                None => rest.to_string(),
            })
            .collect();

        if children.is_empty() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(children.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(v: &str) -> Secret {
        Secret::from([("value".to_string(), v.to_string())])
    }

    #[tokio::test]
    async fn write_replaces_latest_version() {
        let store = MemoryStore::new();
        store.write("a/b", secret("1")).await.unwrap();
        store.write("a/b", secret("2")).await.unwrap();

        assert_eq!(store.read("a/b").await.unwrap()["value"], "2");
        assert_eq!(store.version_count("a/b"), 2);
    }

    #[tokio::test]
    async fn list_returns_immediate_children() {
        let store = MemoryStore::new();
        store.write("downloads/h1_a", secret("")).await.unwrap();
        store.write("downloads/h1_b", secret("")).await.unwrap();
        store.write("downloads/nested/c", secret("")).await.unwrap();

        let children = store.list("downloads/").await.unwrap();
        assert_eq!(children, vec!["h1_a", "h1_b", "nested/"]);
    }

    #[tokio::test]
    async fn missing_paths_are_not_found() {
        let store = MemoryStore::new();
        assert!(store.read("nope").await.unwrap_err().is_not_found());
        assert!(store.list("nope/").await.unwrap_err().is_not_found());
        assert!(!store.exists("nope").await.unwrap());
    }
}
