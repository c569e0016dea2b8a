// ABOUTME: Validated target identifier used to address stored credentials and files.
// ABOUTME: Rejects the `_` separator so store keys can be split back unambiguously.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Separator placed between a target identifier and the name that follows it
/// in store keys (`targets/{id}_secrets`, `downloads/{id}_{filename}`).
pub const TARGET_SEPARATOR: char = '_';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetIdError {
    #[error("target identifier cannot be empty")]
    Empty,

    #[error("target identifier exceeds maximum length of 128 characters")]
    TooLong,

    #[error("target identifier cannot contain '_' (reserved as the store key separator)")]
    ContainsSeparator,

    #[error("invalid character in target identifier: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(value: &str) -> Result<Self, TargetIdError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(TargetIdError::Empty);
        }

        if value.len() > 128 {
            return Err(TargetIdError::TooLong);
        }

        for c in value.chars() {
            if c == TARGET_SEPARATOR {
                return Err(TargetIdError::ContainsSeparator);
            }
            // Allowed: alphanumeric, hyphen, dot
            if !c.is_ascii_alphanumeric() && c != '-' && c != '.' {
                return Err(TargetIdError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix shared by every store key that belongs to this target.
    pub fn key_prefix(&self) -> String {
        format!("{}{}", self.0, TARGET_SEPARATOR)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TargetId {
    type Err = TargetIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for TargetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TargetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(serde::de::Error::custom)
    }
}
