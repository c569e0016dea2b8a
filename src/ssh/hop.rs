// ABOUTME: russh-backed implementation of the tunnel hop operations.
// ABOUTME: Wires bastion connect, forwarding and nested target sessions together.

use super::client::{self, BastionSession};
use super::error::Result;
use super::forward::{self, ForwardedChannel};
use super::sftp::TargetSession;
use crate::keys::KeyHandle;
use crate::tunnel::{Endpoint, Hop};
use async_trait::async_trait;
use std::time::Duration;

/// Transport settings applied to both sessions of a tunnel.
#[derive(Debug, Clone)]
pub struct SshSettings {
    /// Drop a session after this long without traffic.
    pub inactivity_timeout: Option<Duration>,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            inactivity_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Builds tunnels over real SSH connections.
#[derive(Debug, Clone, Default)]
pub struct SshHop {
    settings: SshSettings,
}

impl SshHop {
    pub fn new(settings: SshSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Hop for SshHop {
    type Bastion = BastionSession;
    type Channel = ForwardedChannel;
    type Target = TargetSession;

    async fn connect_bastion(&self, bastion: &Endpoint, key: &KeyHandle) -> Result<BastionSession> {
        let config = client::russh_config(self.settings.inactivity_timeout);
        let handle = client::connect(bastion, key, config).await?;
        Ok(BastionSession {
            handle,
            endpoint: bastion.clone(),
        })
    }

    async fn open_forward(
        &self,
        bastion: &BastionSession,
        destination: &Endpoint,
        origin: &Endpoint,
    ) -> Result<ForwardedChannel> {
        forward::open_forward(bastion, destination, origin).await
    }

    async fn connect_target(
        &self,
        channel: &mut ForwardedChannel,
        target: &Endpoint,
        key: &KeyHandle,
    ) -> Result<TargetSession> {
        let stream = channel.take_stream()?;
        let config = client::russh_config(self.settings.inactivity_timeout);
        let handle = client::connect_over(stream, target, key, config).await?;
        Ok(TargetSession {
            handle,
            endpoint: target.clone(),
        })
    }

    async fn close_target(&self, target: TargetSession) -> Result<()> {
        target.disconnect().await
    }

    async fn close_channel(&self, channel: ForwardedChannel) -> Result<()> {
        channel.close().await
    }

    async fn close_bastion(&self, bastion: BastionSession) -> Result<()> {
        client::disconnect(&bastion.handle).await
    }
}
