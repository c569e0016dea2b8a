// ABOUTME: Config scaffolding for new workspaces.
// ABOUTME: Creates a commented bastion-relay.yml template.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::CONFIG_FILENAME;

const TEMPLATE: &str = r#"# bastion-relay configuration

store:
  # VAULT_ADDR in the environment overrides this value
  address: http://127.0.0.1:8200
  # literal token, or read from the environment
  token:
    env: VAULT_TOKEN
  mount: secret
  prefix: ""

ssh:
  # port used on the bastion and on the target
  port: 22
  inactivity_timeout: 30s

downloads:
  # reject: an empty remote file is an error and nothing is stored
  # accept: empty files are stored like any other
  empty_files: reject
"#;

/// Write the template into `dir`, returning the path written.
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, template_yaml())?;
    Ok(config_path)
}

pub fn template_yaml() -> &'static str {
    TEMPLATE
}
