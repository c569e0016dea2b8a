// ABOUTME: Secret store interface used for credentials, mappings and stored files.
// ABOUTME: Versioned key-value store with read, write and list over a path namespace.

mod error;
mod memory;
mod vault;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use vault::{VaultSettings, VaultStore};

use async_trait::async_trait;
use std::collections::HashMap;

/// A record stored at one path.
pub type Secret = HashMap<String, String>;

/// Hierarchical key-value secret store.
///
/// Implementations must make each read, write and list atomic per path.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read the latest version at `path`. Fails with `NotFound` if absent.
    async fn read(&self, path: &str) -> Result<Secret>;

    /// Replace the latest version at `path` with `data`.
    async fn write(&self, path: &str, data: Secret) -> Result<()>;

    /// Names of the immediate children of `path`. Non-leaf children end in `/`.
    async fn list(&self, path: &str) -> Result<Vec<String>>;

    /// Whether anything is stored at `path`.
    async fn exists(&self, path: &str) -> Result<bool> {
        match self.read(path).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<S: SecretStore + ?Sized> SecretStore for std::sync::Arc<S> {
    async fn read(&self, path: &str) -> Result<Secret> {
        (**self).read(path).await
    }

    async fn write(&self, path: &str, data: Secret) -> Result<()> {
        (**self).write(path, data).await
    }

    async fn list(&self, path: &str) -> Result<Vec<String>> {
        (**self).list(path).await
    }
}
