// ABOUTME: add-server command implementation.
// ABOUTME: Reads key files, registers targets and reports where each mapping went.

use super::relay_connection::Relay;
use bastion_relay::error::{Error, Result};
use bastion_relay::output::Output;
use bastion_relay::relay::{AddServerRequest, CredentialStatus};
use std::path::PathBuf;

/// Arguments gathered from the command line.
pub struct AddServerArgs {
    pub target_ids: Vec<String>,
    pub bastion_hosts: Vec<String>,
    pub target_hosts: Vec<String>,
    pub bastion_user: String,
    pub target_user: String,
    pub bastion_key: PathBuf,
    pub target_key: PathBuf,
}

pub async fn add_server(relay: &Relay, args: AddServerArgs, mut output: Output) -> Result<()> {
    output.start_timer();

    let bastion_key = std::fs::read_to_string(&args.bastion_key)?;
    let target_key = std::fs::read_to_string(&args.target_key)?;

    let request = AddServerRequest::from_lists(
        &args.target_ids,
        &args.bastion_hosts,
        &args.target_hosts,
        args.bastion_user,
        args.target_user,
        bastion_key,
        target_key,
    )?;

    output.progress(&format!("Registering {} target(s)", request.servers.len()));
    let results = match relay.add_server(request).await {
        Ok(results) => results,
        Err(Error::PartialRegistration {
            written,
            failed,
            source,
        }) => {
            let names: Vec<String> = written.iter().map(ToString::to_string).collect();
            output.warning(&format!("Registered before failure: {}", names.join(", ")));
            return Err(Error::PartialRegistration {
                written,
                failed,
                source,
            });
        }
        Err(e) => return Err(e),
    };

    if let Some(first) = results.first() {
        match first.credentials {
            CredentialStatus::Stored => output.progress("  → Credentials stored"),
            CredentialStatus::AlreadyPresent => output.progress("  → Credentials already stored"),
        }
    }

    for mapping in &results {
        output.result(
            &format!("{} -> {}", mapping.target_id, mapping.path),
            mapping,
        );
    }

    output.success(&format!("Registered {} target(s)", results.len()));
    Ok(())
}
