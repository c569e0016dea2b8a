// ABOUTME: Secret store section of the config file.
// ABOUTME: Vault address, token source, KV mount and path prefix.

use super::EnvValue;
use crate::error::{Error, Result};
use crate::store::VaultSettings;
use serde::Deserialize;

pub const VAULT_ADDR_VAR: &str = "VAULT_ADDR";
pub const VAULT_TOKEN_VAR: &str = "VAULT_TOKEN";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_token")]
    pub token: EnvValue,
    #[serde(default = "default_mount")]
    pub mount: String,
    #[serde(default)]
    pub prefix: String,
}

fn default_address() -> String {
    "http://127.0.0.1:8200".to_string()
}

fn default_token() -> EnvValue {
    EnvValue::from_env(VAULT_TOKEN_VAR)
}

fn default_mount() -> String {
    "secret".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            token: default_token(),
            mount: default_mount(),
            prefix: String::new(),
        }
    }
}

impl StoreConfig {
    /// Address to use, with `VAULT_ADDR` taking precedence over the file.
    pub fn effective_address(&self) -> String {
        match std::env::var(VAULT_ADDR_VAR) {
            Ok(addr) if !addr.trim().is_empty() => addr.trim().to_string(),
            _ => self.address.clone(),
        }
    }

    /// Resolve env references into settings for [`crate::store::VaultStore`].
    pub fn vault_settings(&self) -> Result<VaultSettings> {
        let token = self.token.resolve()?;
        if token.trim().is_empty() {
            return Err(Error::InvalidConfig("store token is empty".to_string()));
        }
        if self.mount.trim_matches('/').is_empty() {
            return Err(Error::InvalidConfig("store mount cannot be empty".to_string()));
        }

        Ok(VaultSettings {
            address: self.effective_address(),
            token,
            mount: self.mount.clone(),
            prefix: self.prefix.clone(),
        })
    }
}
