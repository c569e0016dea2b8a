// ABOUTME: download, stage and upload command implementations.
// ABOUTME: Each remote operation runs over its own tunnel through the bastion.

use super::relay_connection::{Relay, parse_target};
use bastion_relay::error::Result;
use bastion_relay::output::Output;
use std::path::Path;

pub async fn download(relay: &Relay, target: &str, remote_path: &str, mut output: Output) -> Result<()> {
    let target_id = parse_target(target)?;
    output.start_timer();
    output.progress(&format!("  → Reading {} from {}...", remote_path, target_id));

    let stored = relay.download_file(&target_id, remote_path).await?;

    output.result(
        &format!("Stored {} ({} bytes) at {}", stored.filename, stored.bytes, stored.path),
        &stored,
    );
    Ok(())
}

pub async fn stage(relay: &Relay, target: &str, filename: &str, file: &Path, output: Output) -> Result<()> {
    let target_id = parse_target(target)?;
    let content = std::fs::read(file)?;

    let stored = relay.stage_upload(&target_id, filename, content).await?;

    output.result(
        &format!("Staged {} ({} bytes) at {}", stored.filename, stored.bytes, stored.path),
        &stored,
    );
    Ok(())
}

pub async fn upload(
    relay: &Relay,
    target: &str,
    filename: &str,
    remote_path: &str,
    mut output: Output,
) -> Result<()> {
    let target_id = parse_target(target)?;
    output.start_timer();
    output.progress(&format!("  → Writing {} to {}:{}...", filename, target_id, remote_path));

    relay.upload_to_server(&target_id, filename, remote_path).await?;

    output.success(&format!("Uploaded {} to {}:{}", filename, target_id, remote_path));
    Ok(())
}
