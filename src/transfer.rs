// ABOUTME: Remote file read and write over a ready tunnel session.
// ABOUTME: Content is opaque bytes; no newline or encoding translation is applied.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::ssh;

/// File access on the far end of a tunnel.
#[async_trait]
pub trait RemoteFiles: Send + Sync {
    /// Create or truncate `path` and write `content` in full.
    async fn write_file(&self, path: &str, content: &[u8]) -> ssh::Result<()>;

    /// Read `path` to end of file.
    async fn read_file(&self, path: &str) -> ssh::Result<Vec<u8>>;
}

fn check_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(Error::InvalidRequest("remote path cannot be empty".to_string()));
    }
    Ok(())
}

pub async fn write_remote_file(
    files: &(dyn RemoteFiles + '_),
    path: &str,
    content: &[u8],
) -> Result<()> {
    check_path(path)?;
    files
        .write_file(path, content)
        .await
        .map_err(|e| Error::RemoteWriteFailed(format!("{}: {}", path, e)))?;
    tracing::debug!(path, bytes = content.len(), "remote file written");
    Ok(())
}

/// Read a remote file. An existing empty file reads back as empty bytes.
pub async fn read_remote_file(files: &(dyn RemoteFiles + '_), path: &str) -> Result<Vec<u8>> {
    check_path(path)?;
    let content = files
        .read_file(path)
        .await
        .map_err(|e| Error::RemoteReadFailed(format!("{}: {}", path, e)))?;
    tracing::debug!(path, bytes = content.len(), "remote file read");
    Ok(content)
}

/// An operation run on a ready tunnel.
#[async_trait]
pub trait TransferOp: Send {
    type Output: Send;

    async fn apply(self, files: &dyn RemoteFiles) -> Result<Self::Output>;
}

/// Read one remote file.
#[derive(Debug, Clone)]
pub struct ReadFile {
    pub path: String,
}

impl ReadFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TransferOp for ReadFile {
    type Output = Vec<u8>;

    async fn apply(self, files: &dyn RemoteFiles) -> Result<Vec<u8>> {
        read_remote_file(files, &self.path).await
    }
}

/// Write one remote file.
#[derive(Clone)]
pub struct WriteFile {
    pub path: String,
    pub content: Vec<u8>,
}

impl WriteFile {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

impl std::fmt::Debug for WriteFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteFile")
            .field("path", &self.path)
            .field("bytes", &self.content.len())
            .finish()
    }
}

#[async_trait]
impl TransferOp for WriteFile {
    type Output = ();

    async fn apply(self, files: &dyn RemoteFiles) -> Result<()> {
        write_remote_file(files, &self.path, &self.content).await
    }
}
