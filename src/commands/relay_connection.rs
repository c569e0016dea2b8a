// ABOUTME: Shared helper for building the relay from configuration.
// ABOUTME: Resolves the store token and wires the Vault store with the SSH hop.

use bastion_relay::config::Config;
use bastion_relay::error::{Error, Result};
use bastion_relay::output::Output;
use bastion_relay::relay::BastionRelay;
use bastion_relay::ssh::SshHop;
use bastion_relay::store::VaultStore;
use bastion_relay::types::TargetId;

pub type Relay = BastionRelay<VaultStore, SshHop>;

/// Build a relay talking to the configured Vault over real SSH.
pub fn connect_relay(config: &Config, output: &Output) -> Result<Relay> {
    let settings = config.store.vault_settings()?;
    output.progress(&format!("  → Using credential store at {}", settings.address));

    let store = VaultStore::new(settings)?;
    let hop = SshHop::new(config.ssh_settings());
    Ok(BastionRelay::new(store, hop, config.relay_settings()))
}

pub fn parse_target(value: &str) -> Result<TargetId> {
    TargetId::new(value).map_err(|e| Error::InvalidRequest(e.to_string()))
}
