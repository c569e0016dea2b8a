// ABOUTME: Files kept in the secret store on behalf of a target.
// ABOUTME: Content is base64 in the store; the original filename sits beside it.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::store::StoreError;
use crate::types::{FileKind, TargetId};

const FIELD_FILENAME: &str = "filename";
const FIELD_CONTENT: &str = "content";
const FIELD_STORED_AT: &str = "stored_at";

/// A downloaded or staged file as held in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub owner: TargetId,
    pub filename: String,
    pub content: Vec<u8>,
    pub stored_at: Option<DateTime<Utc>>,
}

impl StoredFile {
    pub fn new(owner: TargetId, filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            owner,
            filename: filename.into(),
            content,
            stored_at: Some(Utc::now()),
        }
    }

    pub fn to_store_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::from([
            (FIELD_FILENAME.to_string(), self.filename.clone()),
            (FIELD_CONTENT.to_string(), STANDARD.encode(&self.content)),
        ]);
        if let Some(at) = self.stored_at {
            map.insert(FIELD_STORED_AT.to_string(), at.to_rfc3339());
        }
        map
    }

    /// Decode the record at `path`. Missing timestamps are tolerated.
    pub fn from_store_map(
        path: &str,
        owner: TargetId,
        fallback_filename: &str,
        map: &HashMap<String, String>,
    ) -> Result<Self, StoreError> {
        let encoded = map.get(FIELD_CONTENT).ok_or_else(|| StoreError::Malformed {
            path: path.to_string(),
            reason: format!("missing field '{}'", FIELD_CONTENT),
        })?;

        let content = STANDARD
            .decode(encoded.trim())
            .map_err(|e| StoreError::Malformed {
                path: path.to_string(),
                reason: format!("content is not valid base64: {}", e),
            })?;

        let filename = map
            .get(FIELD_FILENAME)
            .cloned()
            .unwrap_or_else(|| fallback_filename.to_string());

        let stored_at = map
            .get(FIELD_STORED_AT)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(Self {
            owner,
            filename,
            content,
            stored_at,
        })
    }
}

/// Where an operation left a file in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredLocation {
    pub kind: FileKind,
    pub target_id: TargetId,
    pub filename: String,
    pub path: String,
    pub bytes: usize,
}
