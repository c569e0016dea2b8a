// ABOUTME: Credential bundles, target mappings and the store addressing scheme.
// ABOUTME: Content-addressed credentials deduplicate identical bundles across targets.

mod bundle;
mod mapping;
pub mod paths;

pub use bundle::{ContentHash, CredentialBundle};
pub use mapping::TargetMapping;
pub use paths::{credential_path, download_path, target_path, upload_path};
