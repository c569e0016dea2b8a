// ABOUTME: Direct-tcpip forwarding through an authenticated bastion session.
// ABOUTME: The channel becomes the byte stream for the nested target session.

use super::client::BastionSession;
use super::error::{Error, Result};
use crate::tunnel::Endpoint;
use russh::client::Msg;
use russh::{Channel, ChannelStream};

/// A forwarded TCP channel to the target, multiplexed inside the bastion session.
///
/// Once the target session is established its stream is moved out and the
/// channel closes together with that session.
pub struct ForwardedChannel {
    channel: Option<Channel<Msg>>,
    destination: String,
}

impl std::fmt::Debug for ForwardedChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardedChannel")
            .field("destination", &self.destination)
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

impl ForwardedChannel {
    /// Whether the byte stream has been handed to a target session.
    pub fn is_consumed(&self) -> bool {
        self.channel.is_none()
    }

    pub(crate) fn take_stream(&mut self) -> Result<ChannelStream<Msg>> {
        self.channel
            .take()
            .map(Channel::into_stream)
            .ok_or(Error::ChannelConsumed)
    }

    pub(crate) async fn close(self) -> Result<()> {
        match self.channel {
            Some(channel) => channel.close().await.map_err(Error::Protocol),
            None => {
                tracing::debug!(
                    destination = %self.destination,
                    "forwarded channel closed with its target session"
                );
                Ok(())
            }
        }
    }
}

/// Ask the bastion to open a TCP connection to `destination`, reporting
/// `origin` as the originator.
pub(crate) async fn open_forward(
    bastion: &BastionSession,
    destination: &Endpoint,
    origin: &Endpoint,
) -> Result<ForwardedChannel> {
    let channel = bastion
        .handle
        .channel_open_direct_tcpip(
            destination.host.as_str(),
            u32::from(destination.port),
            origin.host.as_str(),
            u32::from(origin.port),
        )
        .await
        .map_err(|e| Error::ChannelOpen {
            destination: format!("{}:{}", destination.host, destination.port),
            reason: e.to_string(),
        })?;

    Ok(ForwardedChannel {
        channel: Some(channel),
        destination: format!("{}:{}", destination.host, destination.port),
    })
}
