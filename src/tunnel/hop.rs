// ABOUTME: Transport seam used by the tunnel builder for each hop.
// ABOUTME: The russh implementation lives in `ssh`; tests substitute a double.

use async_trait::async_trait;

use super::Endpoint;
use crate::keys::KeyHandle;
use crate::ssh;
use crate::transfer::RemoteFiles;

/// Transport operations needed to build and tear down a two-hop tunnel.
///
/// Each resource is owned by the tunnel once returned. Dropping a resource
/// must release it, so a cancelled build leaks nothing.
#[async_trait]
pub trait Hop: Send + Sync {
    /// Authenticated session on the bastion.
    type Bastion: Send + Sync;
    /// Forwarded byte channel multiplexed inside the bastion session.
    type Channel: Send;
    /// Authenticated session on the target, carried by the channel.
    type Target: RemoteFiles;

    /// Connect to the bastion and authenticate with `key`.
    async fn connect_bastion(&self, bastion: &Endpoint, key: &KeyHandle)
    -> ssh::Result<Self::Bastion>;

    /// Open a forwarded TCP channel through the bastion to `destination`,
    /// reporting `origin` as the originator.
    async fn open_forward(
        &self,
        bastion: &Self::Bastion,
        destination: &Endpoint,
        origin: &Endpoint,
    ) -> ssh::Result<Self::Channel>;

    /// Run a second handshake over the channel and authenticate with `key`.
    ///
    /// The channel stays owned by the tunnel; an implementation may move its
    /// byte stream into the returned session.
    async fn connect_target(
        &self,
        channel: &mut Self::Channel,
        target: &Endpoint,
        key: &KeyHandle,
    ) -> ssh::Result<Self::Target>;

    async fn close_target(&self, target: Self::Target) -> ssh::Result<()>;

    async fn close_channel(&self, channel: Self::Channel) -> ssh::Result<()>;

    async fn close_bastion(&self, bastion: Self::Bastion) -> ssh::Result<()>;
}
