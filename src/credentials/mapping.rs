// ABOUTME: Target mappings linking a target identifier to hosts and credentials.
// ABOUTME: Converts mappings to and from flat store records.

use std::collections::HashMap;

use super::ContentHash;
use crate::store::StoreError;
use crate::types::TargetId;

const FIELD_TARGET_ID: &str = "target_id";
const FIELD_BASTION_HOST: &str = "bastion_host";
const FIELD_TARGET_HOST: &str = "target_host";
const FIELD_CREDENTIAL_HASH: &str = "credential_hash";

/// Where a target lives and which credential bundle reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMapping {
    pub target_id: TargetId,
    pub bastion_host: String,
    /// Address of the target as seen from the bastion.
    pub target_host: String,
    pub credential_hash: ContentHash,
}

impl TargetMapping {
    pub fn to_store_map(&self) -> HashMap<String, String> {
        HashMap::from([
            (FIELD_TARGET_ID.to_string(), self.target_id.to_string()),
            (FIELD_BASTION_HOST.to_string(), self.bastion_host.clone()),
            (FIELD_TARGET_HOST.to_string(), self.target_host.clone()),
            (
                FIELD_CREDENTIAL_HASH.to_string(),
                self.credential_hash.to_string(),
            ),
        ])
    }

    pub fn from_store_map(
        path: &str,
        map: &HashMap<String, String>,
    ) -> Result<Self, StoreError> {
        let malformed = |reason: String| StoreError::Malformed {
            path: path.to_string(),
            reason,
        };
        let field = |name: &str| {
            map.get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| malformed(format!("missing field '{}'", name)))
        };

        Ok(Self {
            target_id: TargetId::new(field(FIELD_TARGET_ID)?)
                .map_err(|e| malformed(e.to_string()))?,
            bastion_host: field(FIELD_BASTION_HOST)?.to_string(),
            target_host: field(FIELD_TARGET_HOST)?.to_string(),
            credential_hash: ContentHash::parse(field(FIELD_CREDENTIAL_HASH)?)
                .map_err(malformed)?,
        })
    }
}
