// ABOUTME: Caller-facing relay operations over a secret store and a hop transport.
// ABOUTME: Add servers, download, stage, upload and list stored files per target.

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};

use super::run::run_relayed;
use super::stored_file::{StoredFile, StoredLocation};
use crate::credentials::{ContentHash, CredentialBundle, TargetMapping, paths};
use crate::error::{Error, Result};
use crate::keys;
use crate::store::{SecretStore, StoreError};
use crate::transfer::{ReadFile, WriteFile};
use crate::tunnel::{Endpoint, Hop, SSH_PORT, TunnelRoute};
use crate::types::{FileKind, TargetId};

/// What to do when a download succeeds but the remote file is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyFilePolicy {
    /// Treat an empty file like a missing one and store nothing.
    #[default]
    Reject,
    /// Store the empty file.
    Accept,
}

/// Behaviour knobs for [`BastionRelay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaySettings {
    /// Port used on the bastion and, through the forwarded channel, on the target.
    pub ssh_port: u16,
    pub empty_files: EmptyFilePolicy,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            ssh_port: SSH_PORT,
            empty_files: EmptyFilePolicy::default(),
        }
    }
}

/// One target to register: its identifier and where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSpec {
    pub target_id: TargetId,
    pub bastion_host: String,
    pub target_host: String,
}

/// Register one or more targets that share a single credential bundle.
#[derive(Clone)]
pub struct AddServerRequest {
    pub servers: NonEmpty<ServerSpec>,
    pub bastion_user: String,
    pub target_user: String,
    pub bastion_key: String,
    pub target_key: String,
}

impl AddServerRequest {
    /// Zip parallel lists of identifiers and hosts into server specs.
    ///
    /// All three lists must be non-empty and of equal length.
    #[allow(clippy::too_many_arguments)]
    pub fn from_lists(
        ids: &[String],
        bastion_hosts: &[String],
        target_hosts: &[String],
        bastion_user: impl Into<String>,
        target_user: impl Into<String>,
        bastion_key: impl Into<String>,
        target_key: impl Into<String>,
    ) -> Result<Self> {
        if ids.len() != bastion_hosts.len() || ids.len() != target_hosts.len() {
            return Err(Error::InvalidRequest(format!(
                "got {} target id(s), {} bastion host(s) and {} target host(s); counts must match",
                ids.len(),
                bastion_hosts.len(),
                target_hosts.len()
            )));
        }

        let specs = ids
            .iter()
            .zip(bastion_hosts)
            .zip(target_hosts)
            .map(|((id, bastion_host), target_host)| {
                let target_id =
                    TargetId::new(id).map_err(|e| Error::InvalidRequest(e.to_string()))?;
                Ok(ServerSpec {
                    target_id,
                    bastion_host: require_host(bastion_host, "bastion host")?,
                    target_host: require_host(target_host, "target host")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let servers = NonEmpty::from_vec(specs)
            .ok_or_else(|| Error::InvalidRequest("at least one target is required".to_string()))?;

        Ok(Self {
            servers,
            bastion_user: bastion_user.into(),
            target_user: target_user.into(),
            bastion_key: bastion_key.into(),
            target_key: target_key.into(),
        })
    }
}

impl std::fmt::Debug for AddServerRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddServerRequest")
            .field("servers", &self.servers)
            .field("bastion_user", &self.bastion_user)
            .field("target_user", &self.target_user)
            .field("bastion_key", &"<redacted>")
            .field("target_key", &"<redacted>")
            .finish()
    }
}

fn require_host(host: &str, what: &str) -> Result<String> {
    let host = host.trim();
    if host.is_empty() {
        return Err(Error::InvalidRequest(format!("{} cannot be empty", what)));
    }
    Ok(host.to_string())
}

/// Whether `add_server` wrote the credential bundle or found it already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    Stored,
    AlreadyPresent,
}

/// Outcome of registering one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingResult {
    pub target_id: TargetId,
    pub path: String,
    pub credential_hash: String,
    pub credentials: CredentialStatus,
}

/// Relay operations for callers: the store holds credentials and files, the
/// hop reaches targets through their bastion.
pub struct BastionRelay<S, H> {
    store: S,
    hop: H,
    settings: RelaySettings,
}

impl<S: SecretStore, H: Hop> BastionRelay<S, H> {
    pub fn new(store: S, hop: H, settings: RelaySettings) -> Self {
        Self {
            store,
            hop,
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store the credential bundle (once per distinct content) and point each
    /// target at it.
    ///
    /// Each mapping is its own store write. If one fails after others were
    /// written, those stay in place and the error is
    /// [`Error::PartialRegistration`] naming them.
    pub async fn add_server(&self, request: AddServerRequest) -> Result<Vec<MappingResult>> {
        let bundle = CredentialBundle::new(
            &request.bastion_user,
            &request.target_user,
            &request.bastion_key,
            &request.target_key,
        )?;

        // Both keys must be usable before anything is written.
        keys::parse_private_key(bundle.bastion_key())?;
        keys::parse_private_key(bundle.target_key())?;

        let (hash, credentials) = self.store_credentials(&bundle).await?;

        let mut results: Vec<MappingResult> = Vec::with_capacity(request.servers.len());
        for server in request.servers.iter() {
            let mapping = TargetMapping {
                target_id: server.target_id.clone(),
                bastion_host: server.bastion_host.clone(),
                target_host: server.target_host.clone(),
                credential_hash: hash.clone(),
            };
            let path = paths::target_path(&mapping.target_id);
            if let Err(e) = self.store.write(&path, mapping.to_store_map()).await {
                let err = Error::from(e);
                if results.is_empty() {
                    return Err(err);
                }
                return Err(Error::PartialRegistration {
                    written: results.into_iter().map(|r| r.target_id).collect(),
                    failed: mapping.target_id,
                    source: Box::new(err),
                });
            }

            tracing::info!(
                target_id = %mapping.target_id,
                bastion = %mapping.bastion_host,
                "target mapping stored"
            );

            results.push(MappingResult {
                target_id: mapping.target_id,
                path,
                credential_hash: hash.to_string(),
                credentials,
            });
        }

        Ok(results)
    }

    /// Write the bundle at its content-addressed path unless it is already there.
    pub async fn store_credentials(
        &self,
        bundle: &CredentialBundle,
    ) -> Result<(ContentHash, CredentialStatus)> {
        let hash = bundle.content_hash();
        let path = paths::credential_path(&hash);

        if self.store.exists(&path).await? {
            tracing::debug!(hash = %hash, "credential bundle already stored");
            return Ok((hash, CredentialStatus::AlreadyPresent));
        }

        self.store.write(&path, bundle.to_store_map()).await?;
        tracing::debug!(hash = %hash, "credential bundle stored");
        Ok((hash, CredentialStatus::Stored))
    }

    /// Mapping and credentials for a registered target.
    pub async fn resolve(&self, target_id: &TargetId) -> Result<(TargetMapping, CredentialBundle)> {
        let path = paths::target_path(target_id);
        let record = self.store.read(&path).await.map_err(|e| match e {
            StoreError::NotFound(_) => Error::NotFound(format!("no server registered as {}", target_id)),
            other => other.into(),
        })?;
        let mapping = TargetMapping::from_store_map(&path, &record)?;

        let cred_path = paths::credential_path(&mapping.credential_hash);
        let record = self.store.read(&cred_path).await.map_err(|e| match e {
            StoreError::NotFound(_) => {
                Error::NotFound(format!("credentials for {} are missing", target_id))
            }
            other => other.into(),
        })?;
        let bundle = CredentialBundle::from_store_map(&cred_path, &record)?;

        Ok((mapping, bundle))
    }

    fn route(&self, mapping: &TargetMapping, bundle: &CredentialBundle) -> TunnelRoute {
        TunnelRoute::new(
            Endpoint::new(&mapping.bastion_host, bundle.bastion_username()).port(self.settings.ssh_port),
            Endpoint::new(&mapping.target_host, bundle.target_username()).port(self.settings.ssh_port),
        )
    }

    /// Read `remote_path` from the target and keep a copy under `downloads/`.
    pub async fn download_file(&self, target_id: &TargetId, remote_path: &str) -> Result<StoredLocation> {
        let filename = paths::filename_from_remote_path(remote_path)
            .ok_or_else(|| {
                Error::InvalidRequest(format!("remote path has no file name: {}", remote_path))
            })?
            .to_string();

        let (mapping, bundle) = self.resolve(target_id).await?;
        let route = self.route(&mapping, &bundle);

        let content = run_relayed(
            &self.hop,
            &route,
            bundle.bastion_key(),
            bundle.target_key(),
            ReadFile::new(remote_path),
        )
        .await?;

        if content.is_empty() && self.settings.empty_files == EmptyFilePolicy::Reject {
            return Err(Error::EmptyRemoteFile(remote_path.to_string()));
        }

        let file = StoredFile::new(target_id.clone(), &filename, content);
        let path = paths::download_path(target_id, &filename);
        self.store.write(&path, file.to_store_map()).await?;

        tracing::info!(target_id = %target_id, remote_path, bytes = file.content.len(), "file downloaded");

        Ok(StoredLocation {
            kind: FileKind::Downloads,
            target_id: target_id.clone(),
            filename,
            path,
            bytes: file.content.len(),
        })
    }

    /// Keep `content` under `uploads/` until it is published with
    /// [`BastionRelay::upload_to_server`]. Each call stores a new version.
    pub async fn stage_upload(
        &self,
        target_id: &TargetId,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<StoredLocation> {
        check_filename(filename)?;
        // Only registered targets get staged files.
        self.resolve(target_id).await?;

        let file = StoredFile::new(target_id.clone(), filename, content);
        let path = paths::upload_path(target_id, filename);
        self.store.write(&path, file.to_store_map()).await?;

        tracing::info!(target_id = %target_id, filename, bytes = file.content.len(), "upload staged");

        Ok(StoredLocation {
            kind: FileKind::Uploads,
            target_id: target_id.clone(),
            filename: filename.to_string(),
            path,
            bytes: file.content.len(),
        })
    }

    /// Write a staged upload to `remote_path` on the target.
    pub async fn upload_to_server(
        &self,
        target_id: &TargetId,
        staged_filename: &str,
        remote_path: &str,
    ) -> Result<()> {
        let staged = self.fetch_stored(FileKind::Uploads, target_id, staged_filename).await?;
        let (mapping, bundle) = self.resolve(target_id).await?;
        let route = self.route(&mapping, &bundle);

        let bytes = staged.content.len();
        run_relayed(
            &self.hop,
            &route,
            bundle.bastion_key(),
            bundle.target_key(),
            WriteFile::new(remote_path, staged.content),
        )
        .await?;

        tracing::info!(target_id = %target_id, remote_path, bytes, "file uploaded");
        Ok(())
    }

    /// Filenames stored for `target_id` under `kind`.
    pub async fn list_known(&self, kind: FileKind, target_id: &TargetId) -> Result<Vec<String>> {
        let entries = match self.store.list(&paths::stored_file_dir(kind)).await {
            Ok(entries) => entries,
            Err(StoreError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names: Vec<String> = entries
            .iter()
            .filter_map(|key| paths::strip_target_prefix(target_id, key))
            .map(str::to_string)
            .collect();
        names.sort();
        Ok(names)
    }

    /// A stored download or staged upload.
    pub async fn fetch_stored(
        &self,
        kind: FileKind,
        target_id: &TargetId,
        filename: &str,
    ) -> Result<StoredFile> {
        check_filename(filename)?;
        let path = paths::stored_file_path(kind, target_id, filename);
        let record = self.store.read(&path).await.map_err(|e| match e {
            StoreError::NotFound(_) => Error::NotFound(format!(
                "no {} file '{}' for {}",
                kind, filename, target_id
            )),
            other => other.into(),
        })?;
        Ok(StoredFile::from_store_map(&path, target_id.clone(), filename, &record)?)
    }

    /// Identifiers of every registered target.
    pub async fn list_targets(&self) -> Result<Vec<TargetId>> {
        let entries = match self.store.list(&format!("{}/", paths::TARGETS_DIR)).await {
            Ok(entries) => entries,
            Err(StoreError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids: Vec<TargetId> = entries
            .iter()
            .filter_map(|key| paths::target_from_mapping_key(key))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

fn check_filename(filename: &str) -> Result<()> {
    if paths::is_valid_filename(filename) {
        Ok(())
    } else {
        Err(Error::InvalidRequest(format!("invalid file name: '{}'", filename)))
    }
}
