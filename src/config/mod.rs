// ABOUTME: Configuration types and parsing for bastion-relay.yml.
// ABOUTME: Handles YAML parsing, discovery, defaults and env var resolution.

mod env_value;
mod init;
mod store;

pub use env_value::EnvValue;
pub use init::{init_config, template_yaml};
pub use store::{StoreConfig, VAULT_ADDR_VAR, VAULT_TOKEN_VAR};

use crate::error::{Error, Result};
use crate::relay::{EmptyFilePolicy, RelaySettings};
use crate::ssh::SshSettings;
use crate::tunnel::SSH_PORT;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "bastion-relay.yml";
pub const CONFIG_FILENAME_ALT: &str = "bastion-relay.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".bastion-relay/config.yml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub ssh: SshConfig,

    #[serde(default)]
    pub downloads: DownloadsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_inactivity_timeout", with = "humantime_serde")]
    pub inactivity_timeout: Duration,
}

fn default_port() -> u16 {
    SSH_PORT
}

fn default_inactivity_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            inactivity_timeout: default_inactivity_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadsConfig {
    #[serde(default)]
    pub empty_files: EmptyFilePolicy,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file means "all defaults".
        if yaml.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load the first config file found in `dir`, or defaults if there is none.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config");
                return Self::load(path);
            }
        }

        tracing::debug!(dir = %dir.display(), "no config file found, using defaults");
        Ok(Config::default())
    }

    /// Load an explicitly named file, or discover one in `dir`.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => Self::discover(dir),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.ssh.port == 0 {
            return Err(Error::InvalidConfig("ssh.port cannot be 0".to_string()));
        }
        if self.ssh.inactivity_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "ssh.inactivity_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ssh_settings(&self) -> SshSettings {
        SshSettings {
            inactivity_timeout: Some(self.ssh.inactivity_timeout),
        }
    }

    pub fn relay_settings(&self) -> RelaySettings {
        RelaySettings {
            ssh_port: self.ssh.port,
            empty_files: self.downloads.empty_files,
        }
    }
}
