// ABOUTME: Validated domain types shared across the relay.
// ABOUTME: Target identifiers and stored-file kinds.

mod file_kind;
mod target_id;

pub use file_kind::FileKind;
pub use target_id::{TARGET_SEPARATOR, TargetId, TargetIdError};
