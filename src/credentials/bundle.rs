// ABOUTME: Credential bundles and their content hash.
// ABOUTME: Normalizes the four credential fields into canonical bytes before hashing.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::store::StoreError;

const FIELD_BASTION_USERNAME: &str = "bastion_username";
const FIELD_TARGET_USERNAME: &str = "target_username";
const FIELD_BASTION_KEY: &str = "bastion_key";
const FIELD_TARGET_KEY: &str = "target_key";

/// Hex-encoded SHA-256 digest of a normalized credential bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(String);

impl ContentHash {
    /// Length of the hex encoding.
    pub const LEN: usize = 64;

    pub fn parse(value: &str) -> std::result::Result<Self, String> {
        let value = value.trim();
        if value.len() != Self::LEN {
            return Err(format!(
                "content hash must be {} hex characters, got {}",
                Self::LEN,
                value.len()
            ));
        }
        if !value.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)) {
            return Err("content hash must be lowercase hex".to_string());
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Usernames and private keys for both hops of a relayed connection.
///
/// Fields are normalized on construction, so two bundles built from the
/// same values always compare and hash equal.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialBundle {
    bastion_username: String,
    target_username: String,
    bastion_key: String,
    target_key: String,
}

/// Serialization shape used for hashing. Field order is alphabetical and
/// must never change, or every stored credential path moves.
#[derive(Serialize)]
struct Canonical<'a> {
    bastion_key: &'a str,
    bastion_username: &'a str,
    target_key: &'a str,
    target_username: &'a str,
}

impl CredentialBundle {
    pub fn new(
        bastion_username: &str,
        target_username: &str,
        bastion_key: &str,
        target_key: &str,
    ) -> Result<Self> {
        let bastion_username = normalize_username(bastion_username, "bastion username")?;
        let target_username = normalize_username(target_username, "target username")?;
        let bastion_key = normalize_key_text(bastion_key, "bastion key")?;
        let target_key = normalize_key_text(target_key, "target key")?;

        Ok(Self {
            bastion_username,
            target_username,
            bastion_key,
            target_key,
        })
    }

    pub fn bastion_username(&self) -> &str {
        &self.bastion_username
    }

    pub fn target_username(&self) -> &str {
        &self.target_username
    }

    pub fn bastion_key(&self) -> &str {
        &self.bastion_key
    }

    pub fn target_key(&self) -> &str {
        &self.target_key
    }

    /// Canonical byte serialization of the bundle.
    pub fn normalize(&self) -> Vec<u8> {
        let canonical = Canonical {
            bastion_key: &self.bastion_key,
            bastion_username: &self.bastion_username,
            target_key: &self.target_key,
            target_username: &self.target_username,
        };
        // Serializing a struct of plain strings cannot fail.
        serde_json::to_vec(&canonical).unwrap_or_default()
    }

    pub fn content_hash(&self) -> ContentHash {
        let digest = Sha256::digest(self.normalize());
        ContentHash(hex::encode(digest))
    }

    pub fn to_store_map(&self) -> HashMap<String, String> {
        HashMap::from([
            (FIELD_BASTION_USERNAME.to_string(), self.bastion_username.clone()),
            (FIELD_TARGET_USERNAME.to_string(), self.target_username.clone()),
            (FIELD_BASTION_KEY.to_string(), self.bastion_key.clone()),
            (FIELD_TARGET_KEY.to_string(), self.target_key.clone()),
        ])
    }

    /// Rebuild a bundle from the record stored at `path`.
    pub fn from_store_map(
        path: &str,
        map: &HashMap<String, String>,
    ) -> std::result::Result<Self, StoreError> {
        let field = |name: &str| {
            map.get(name).ok_or_else(|| StoreError::Malformed {
                path: path.to_string(),
                reason: format!("missing field '{}'", name),
            })
        };

        Self::new(
            field(FIELD_BASTION_USERNAME)?,
            field(FIELD_TARGET_USERNAME)?,
            field(FIELD_BASTION_KEY)?,
            field(FIELD_TARGET_KEY)?,
        )
        .map_err(|e| StoreError::Malformed {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("bastion_username", &self.bastion_username)
            .field("target_username", &self.target_username)
            .field("bastion_key", &"<redacted>")
            .field("target_key", &"<redacted>")
            .finish()
    }
}

fn normalize_username(value: &str, field: &'static str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::EmptyCredentialInput(field));
    }
    Ok(value.to_string())
}

/// CRLF becomes LF, surrounding whitespace is dropped and exactly one
/// trailing newline is kept.
fn normalize_key_text(value: &str, field: &'static str) -> Result<String> {
    let unified = value.replace("\r\n", "\n");
    let trimmed = unified.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyCredentialInput(field));
    }
    Ok(format!("{}\n", trimmed))
}
