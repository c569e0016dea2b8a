// ABOUTME: Store path conventions for credentials, target mappings and stored files.
// ABOUTME: Builds keys like `targets/{id}_secrets` and splits them back apart.

use super::ContentHash;
use crate::types::{FileKind, TargetId};

pub const CREDENTIALS_DIR: &str = "credentials";
pub const TARGETS_DIR: &str = "targets";
pub const MAPPING_SUFFIX: &str = "secrets";

pub fn credential_path(hash: &ContentHash) -> String {
    format!("{}/{}", CREDENTIALS_DIR, hash)
}

pub fn target_path(id: &TargetId) -> String {
    format!("{}/{}{}", TARGETS_DIR, id.key_prefix(), MAPPING_SUFFIX)
}

pub fn download_path(id: &TargetId, filename: &str) -> String {
    stored_file_path(FileKind::Downloads, id, filename)
}

pub fn upload_path(id: &TargetId, filename: &str) -> String {
    stored_file_path(FileKind::Uploads, id, filename)
}

pub fn stored_file_path(kind: FileKind, id: &TargetId, filename: &str) -> String {
    format!("{}/{}{}", kind.directory(), id.key_prefix(), filename)
}

/// Directory listed to find the stored files of one kind.
pub fn stored_file_dir(kind: FileKind) -> String {
    format!("{}/", kind.directory())
}

/// Recover the filename from a listed key if the key belongs to `id`.
///
/// The full `{id}_` prefix must match, so `host10_x` never belongs to `host1`.
/// Sub-directories (keys ending in `/`) are skipped.
pub fn strip_target_prefix<'a>(id: &TargetId, key: &'a str) -> Option<&'a str> {
    if key.ends_with('/') {
        return None;
    }
    key.strip_prefix(id.key_prefix().as_str())
        .filter(|name| !name.is_empty())
}

/// Recover the target identifier from a key listed under `targets/`.
pub fn target_from_mapping_key(key: &str) -> Option<TargetId> {
    let suffix = format!("{}{}", crate::types::TARGET_SEPARATOR, MAPPING_SUFFIX);
    key.strip_suffix(suffix.as_str())
        .and_then(|id| TargetId::new(id).ok())
}

/// Last non-empty segment of a remote path.
pub fn filename_from_remote_path(path: &str) -> Option<&str> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .next_back()
        .filter(|name| *name != "." && *name != "..")
}

/// Stored filenames become the tail of a store key, so they must be a single
/// non-empty path segment.
pub fn is_valid_filename(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TargetId {
        TargetId::new(s).unwrap()
    }

    #[test]
    fn path_patterns() {
        let hash = ContentHash::parse(&"0".repeat(64)).unwrap();
        assert_eq!(credential_path(&hash), format!("credentials/{}", "0".repeat(64)));
        assert_eq!(target_path(&id("host1")), "targets/host1_secrets");
        assert_eq!(download_path(&id("host1"), "hostname"), "downloads/host1_hostname");
        assert_eq!(upload_path(&id("host1"), "app.conf"), "uploads/host1_app.conf");
    }

    #[test]
    fn prefix_stripping_respects_separator() {
        assert_eq!(strip_target_prefix(&id("host1"), "host1_hostname"), Some("hostname"));
        assert_eq!(strip_target_prefix(&id("host1"), "host10_hostname"), None);
        assert_eq!(strip_target_prefix(&id("host1"), "host1_"), None);
        assert_eq!(strip_target_prefix(&id("host1"), "host1_nested/"), None);
        assert_eq!(
            strip_target_prefix(&id("host1"), "host1_my_file.txt"),
            Some("my_file.txt")
        );
    }

    #[test]
    fn mapping_keys_yield_target_ids() {
        assert_eq!(target_from_mapping_key("web-1_secrets"), Some(id("web-1")));
        assert_eq!(target_from_mapping_key("web-1_other"), None);
        assert_eq!(target_from_mapping_key("bad_id_secrets"), None);
    }

    #[test]
    fn remote_path_filenames() {
        assert_eq!(filename_from_remote_path("/etc/hostname"), Some("hostname"));
        assert_eq!(filename_from_remote_path("/var/log/"), Some("log"));
        assert_eq!(filename_from_remote_path("relative.txt"), Some("relative.txt"));
        assert_eq!(filename_from_remote_path("/"), None);
        assert_eq!(filename_from_remote_path(""), None);
        assert_eq!(filename_from_remote_path("/etc/.."), None);
    }
}
