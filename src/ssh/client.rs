// ABOUTME: SSH session setup using russh.
// ABOUTME: Permissive host key handler, public key authentication and disconnect.

use super::error::{Error, Result};
use crate::keys::KeyHandle;
use crate::tunnel::Endpoint;
use russh::client::{self, Config, Handle};
use russh::keys::PrivateKeyWithHashAlg;
use russh::keys::ssh_key::{self, HashAlg};
use russh::Disconnect;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// SSH client handler for russh.
///
/// Host keys are accepted without verification: the relay trusts network
/// placement of the bastion and target, not pinned keys.
pub(crate) struct RelayHandler {
    host: String,
    port: u16,
}

impl RelayHandler {
    fn new(endpoint: &Endpoint) -> Self {
        Self {
            host: endpoint.host.clone(),
            port: endpoint.port,
        }
    }
}

impl client::Handler for RelayHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        tracing::warn!(
            host = %self.host,
            port = self.port,
            fingerprint = %server_public_key.fingerprint(HashAlg::Sha256),
            "accepting host key without verification"
        );
        Ok(true)
    }
}

pub(crate) fn russh_config(inactivity_timeout: Option<Duration>) -> Arc<Config> {
    Arc::new(Config {
        inactivity_timeout,
        ..Default::default()
    })
}

/// An authenticated session on the bastion host.
pub struct BastionSession {
    pub(crate) handle: Handle<RelayHandler>,
    pub(crate) endpoint: Endpoint,
}

impl std::fmt::Debug for BastionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BastionSession")
            .field("endpoint", &self.endpoint)
            .field("handle", &"<russh::Handle>")
            .finish()
    }
}

/// Open a TCP connection to `endpoint` and authenticate with `key`.
pub(crate) async fn connect(
    endpoint: &Endpoint,
    key: &KeyHandle,
    config: Arc<Config>,
) -> Result<Handle<RelayHandler>> {
    let mut handle = client::connect(
        config,
        (endpoint.host.as_str(), endpoint.port),
        RelayHandler::new(endpoint),
    )
    .await
    .map_err(|e| {
        if e.to_string().contains("Connection refused") {
            Error::Connection(format!(
                "connection refused to {}:{}",
                endpoint.host, endpoint.port
            ))
        } else {
            Error::Connection(format!("{}:{}: {}", endpoint.host, endpoint.port, e))
        }
    })?;

    authenticate(&mut handle, endpoint, key).await?;
    Ok(handle)
}

/// Run the SSH handshake over an existing byte stream and authenticate.
pub(crate) async fn connect_over<S>(
    stream: S,
    endpoint: &Endpoint,
    key: &KeyHandle,
    config: Arc<Config>,
) -> Result<Handle<RelayHandler>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut handle = client::connect_stream(config, stream, RelayHandler::new(endpoint))
        .await
        .map_err(|e| {
            Error::Connection(format!(
                "handshake with {} over forwarded channel failed: {}",
                endpoint.host, e
            ))
        })?;

    authenticate(&mut handle, endpoint, key).await?;
    Ok(handle)
}

async fn authenticate(
    handle: &mut Handle<RelayHandler>,
    endpoint: &Endpoint,
    key: &KeyHandle,
) -> Result<()> {
    let hash_alg = handle
        .best_supported_rsa_hash()
        .await
        .map_err(Error::Protocol)?
        .flatten();

    let result = handle
        .authenticate_publickey(
            &endpoint.user,
            PrivateKeyWithHashAlg::new(key.private_key(), hash_alg),
        )
        .await
        .map_err(Error::Protocol)?;

    if !result.success() {
        return Err(Error::AuthenticationFailed(endpoint.user.clone()));
    }

    tracing::debug!(endpoint = %endpoint, algorithm = %key.algorithm(), "authenticated");
    Ok(())
}

pub(crate) async fn disconnect(handle: &Handle<RelayHandler>) -> Result<()> {
    handle
        .disconnect(Disconnect::ByApplication, "", "en")
        .await
        .map_err(Error::Protocol)
}
