// ABOUTME: Two-hop tunnel construction: bastion session, forwarded channel, target session.
// ABOUTME: Tracks the build stage so teardown closes exactly what was opened.

mod builder;
mod error;
mod hop;
mod stage;

pub use builder::Tunnel;
pub use error::TunnelError;
pub use hop::Hop;
pub use stage::{Teardown, TunnelResource, TunnelStage};

use std::fmt;

/// Standard SSH port, used on both hops unless configured otherwise.
pub const SSH_PORT: u16 = 22;

/// One SSH endpoint: where to connect and who to log in as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub user: String,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: SSH_PORT,
            user: user.into(),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}

/// Bastion and target endpoints for one relayed operation.
///
/// `target.host` is the target's address as seen from the bastion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelRoute {
    pub bastion: Endpoint,
    pub target: Endpoint,
}

impl TunnelRoute {
    pub fn new(bastion: Endpoint, target: Endpoint) -> Self {
        Self { bastion, target }
    }
}
