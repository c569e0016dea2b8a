// ABOUTME: list, fetch and targets command implementations.
// ABOUTME: Read-only views of what the store holds; no remote connections.

use super::relay_connection::{Relay, parse_target};
use bastion_relay::error::Result;
use bastion_relay::output::Output;
use bastion_relay::types::FileKind;
use std::io::Write;

pub async fn list(relay: &Relay, kind: FileKind, target: &str, output: Output) -> Result<()> {
    let target_id = parse_target(target)?;
    let names = relay.list_known(kind, &target_id).await?;
    if names.is_empty() {
        output.progress(&format!("No {} stored for {}", kind, target_id));
    }
    output.list(&names);
    Ok(())
}

/// Write a stored file's raw bytes to stdout.
pub async fn fetch(relay: &Relay, kind: FileKind, target: &str, filename: &str) -> Result<()> {
    let target_id = parse_target(target)?;
    let file = relay.fetch_stored(kind, &target_id, filename).await?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&file.content)?;
    stdout.flush()?;
    Ok(())
}

pub async fn targets(relay: &Relay, output: Output) -> Result<()> {
    let ids = relay.list_targets().await?;
    if ids.is_empty() {
        output.progress("No targets registered");
    }
    output.list(&ids);
    Ok(())
}
