// ABOUTME: Error types for building a relayed tunnel.
// ABOUTME: One variant per build stage, plus out-of-order stage requests.

use super::TunnelStage;

/// Errors raised while building a tunnel. Each carries the transport's reason.
#[derive(Debug, thiserror::Error)]
pub enum TunnelError {
    /// Bastion unreachable, connection refused, or credentials rejected.
    #[error("bastion authentication failed: {0}")]
    BastionAuth(String),

    /// Target unreachable from the bastion, or the bastion refused forwarding.
    #[error("failed to open forwarded channel: {0}")]
    ChannelOpen(String),

    /// Handshake or authentication over the forwarded channel failed.
    #[error("target authentication failed: {0}")]
    TargetAuth(String),

    /// A stage was requested from the wrong state.
    #[error("tunnel stage out of order: expected {expected}, found {actual}")]
    OutOfOrder {
        expected: TunnelStage,
        actual: TunnelStage,
    },
}
