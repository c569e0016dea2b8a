// ABOUTME: Single entry point for one bastion-relayed operation.
// ABOUTME: Parses keys, builds the tunnel, runs the transfer and always tears down once.

use crate::error::{Error, Result};
use crate::keys;
use crate::transfer::TransferOp;
use crate::tunnel::{Hop, Tunnel, TunnelRoute};

/// Run `op` on the target behind `route`'s bastion.
///
/// Key parsing failures return before any connection is made. Once the
/// tunnel build starts, teardown runs exactly once whatever the outcome,
/// and the first failure is the one returned.
pub async fn run_relayed<H, O>(
    hop: &H,
    route: &TunnelRoute,
    bastion_key_text: &str,
    target_key_text: &str,
    op: O,
) -> Result<O::Output>
where
    H: Hop,
    O: TransferOp,
{
    let bastion_key = keys::parse_private_key(bastion_key_text)?;
    let target_key = keys::parse_private_key(target_key_text)?;

    let mut tunnel = Tunnel::new(hop);
    let outcome = match tunnel.establish(route, &bastion_key, &target_key).await {
        Ok(session) => op.apply(session).await,
        Err(e) => Err(Error::from(e)),
    };

    let teardown = tunnel.teardown().await;
    if !teardown.is_clean() {
        tracing::warn!(
            bastion = %route.bastion.host,
            target = %route.target.host,
            "tunnel teardown incomplete: {} resource(s) failed to close",
            teardown.failed.len()
        );
    }

    outcome
}
