// ABOUTME: Kinds of stored files kept per target in the secret store.
// ABOUTME: Downloads come from remote hosts; uploads are staged for publishing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Files read from a target and copied into the store.
    Downloads,
    /// Files staged in the store, waiting to be written to a target.
    Uploads,
}

impl FileKind {
    /// Top-level store directory holding files of this kind.
    pub fn directory(&self) -> &'static str {
        match self {
            FileKind::Downloads => "downloads",
            FileKind::Uploads => "uploads",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directory())
    }
}

impl FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "downloads" | "download" => Ok(FileKind::Downloads),
            "uploads" | "upload" => Ok(FileKind::Uploads),
            other => Err(format!(
                "unknown file kind '{}': expected 'downloads' or 'uploads'",
                other
            )),
        }
    }
}
