// ABOUTME: Target session reached through the bastion, with SFTP file access.
// ABOUTME: Each file operation opens its own SFTP subsystem channel.

use super::client::{self, RelayHandler};
use super::error::Result;
use crate::transfer::RemoteFiles;
use crate::tunnel::Endpoint;
use async_trait::async_trait;
use russh::client::Handle;
use russh_sftp::client::SftpSession;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// An authenticated session on the target host, carried by a forwarded channel.
pub struct TargetSession {
    pub(crate) handle: Handle<RelayHandler>,
    pub(crate) endpoint: Endpoint,
}

impl std::fmt::Debug for TargetSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetSession")
            .field("endpoint", &self.endpoint)
            .field("handle", &"<russh::Handle>")
            .finish()
    }
}

impl TargetSession {
    async fn open_sftp(&self) -> Result<SftpSession> {
        let channel = self.handle.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;
        let sftp = SftpSession::new(channel.into_stream()).await?;
        Ok(sftp)
    }

    pub(crate) async fn disconnect(self) -> Result<()> {
        client::disconnect(&self.handle).await
    }
}

async fn close_sftp(sftp: SftpSession) {
    if let Err(e) = sftp.close().await {
        tracing::debug!("SFTP session close failed: {}", e);
    }
}

async fn write_to(sftp: &SftpSession, path: &str, content: &[u8]) -> Result<()> {
    // create() opens with CREATE | TRUNCATE | WRITE
    let mut file = sftp.create(path).await?;
    file.write_all(content).await?;
    file.flush().await?;
    file.shutdown().await?;
    Ok(())
}

async fn read_from(sftp: &SftpSession, path: &str) -> Result<Vec<u8>> {
    let mut file = sftp.open(path).await?;
    let mut content = Vec::new();
    file.read_to_end(&mut content).await?;
    file.shutdown().await?;
    Ok(content)
}

#[async_trait]
impl RemoteFiles for TargetSession {
    async fn write_file(&self, path: &str, content: &[u8]) -> Result<()> {
        let sftp = self.open_sftp().await?;
        let result = write_to(&sftp, path, content).await;
        close_sftp(sftp).await;
        result
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let sftp = self.open_sftp().await?;
        let result = read_from(&sftp, path).await;
        close_sftp(sftp).await;
        result
    }
}
