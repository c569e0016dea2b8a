// ABOUTME: Build stages of a relayed tunnel and the resources each stage holds.
// ABOUTME: Stages only move forward; Failed is reachable from any non-terminal stage.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelStage {
    /// Nothing opened yet.
    Init,
    /// Bastion session live and authenticated.
    BastionAuthenticated,
    /// Forwarded channel to the target open inside the bastion session.
    ChannelOpen,
    /// Second session authenticated over the forwarded channel.
    TargetAuthenticated,
    /// Target session handed out for file operations.
    Ready,
    /// A stage failed; only teardown remains.
    Failed,
}

impl fmt::Display for TunnelStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TunnelStage::Init => "init",
            TunnelStage::BastionAuthenticated => "bastion-authenticated",
            TunnelStage::ChannelOpen => "channel-open",
            TunnelStage::TargetAuthenticated => "target-authenticated",
            TunnelStage::Ready => "ready",
            TunnelStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Resources owned by a tunnel, in teardown order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelResource {
    Target,
    Channel,
    Bastion,
}

impl fmt::Display for TunnelResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TunnelResource::Target => "target session",
            TunnelResource::Channel => "forwarded channel",
            TunnelResource::Bastion => "bastion session",
        };
        f.write_str(name)
    }
}

/// What teardown closed and which closes failed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Teardown {
    pub closed: Vec<TunnelResource>,
    pub failed: Vec<(TunnelResource, String)>,
}

impl Teardown {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
