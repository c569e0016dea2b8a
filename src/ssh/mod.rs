// ABOUTME: SSH transport for relayed transfers, built on russh.
// ABOUTME: Bastion sessions, direct-tcpip forwarding, nested target sessions and SFTP.

mod client;
mod error;
mod forward;
mod hop;
mod sftp;

pub use client::BastionSession;
pub use error::{Error, Result};
pub use forward::ForwardedChannel;
pub use hop::{SshHop, SshSettings};
pub use sftp::TargetSession;
