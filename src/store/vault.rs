// ABOUTME: HashiCorp Vault KV v2 secret store over plain HTTP/1.1.
// ABOUTME: One hyper client connection per request, token passed in X-Vault-Token.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{CONTENT_TYPE, HOST};
use hyper::{Method, Request, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use serde_json::{Value, json};
use std::fmt;
use tokio::net::TcpStream;

use super::{Result, Secret, SecretStore, StoreError};

const TOKEN_HEADER: &str = "X-Vault-Token";

/// Connection settings for a Vault KV v2 mount.
#[derive(Clone)]
pub struct VaultSettings {
    /// Base address, e.g. `http://localhost:8200`.
    pub address: String,
    pub token: String,
    /// KV v2 mount point (default `secret`).
    pub mount: String,
    /// Optional path prefix inside the mount.
    pub prefix: String,
}

impl fmt::Debug for VaultSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultSettings")
            .field("address", &self.address)
            .field("token", &"<redacted>")
            .field("mount", &self.mount)
            .field("prefix", &self.prefix)
            .finish()
    }
}

/// Secret store backed by a Vault KV v2 engine.
pub struct VaultStore {
    host: String,
    port: u16,
    authority: String,
    token: String,
    mount: String,
    prefix: String,
}

impl fmt::Debug for VaultStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultStore")
            .field("authority", &self.authority)
            .field("mount", &self.mount)
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl VaultStore {
    pub fn new(settings: VaultSettings) -> Result<Self> {
        let uri: Uri = settings
            .address
            .trim()
            .parse()
            .map_err(|e| StoreError::Unreachable(format!("invalid Vault address: {}", e)))?;

        match uri.scheme_str() {
            Some("http") => {}
            Some(other) => {
                return Err(StoreError::Unreachable(format!(
                    "unsupported Vault address scheme '{}': only http is supported",
                    other
                )));
            }
            None => {
                return Err(StoreError::Unreachable(
                    "Vault address must include a scheme, e.g. http://localhost:8200".to_string(),
                ));
            }
        }

        let host = uri
            .host()
            .ok_or_else(|| StoreError::Unreachable("Vault address has no host".to_string()))?
            .to_string();
        let port = uri.port_u16().unwrap_or(80);

        Ok(Self {
            authority: format!("{}:{}", host, port),
            host,
            port,
            token: settings.token,
            mount: settings.mount.trim_matches('/').to_string(),
            prefix: settings.prefix.trim_matches('/').to_string(),
        })
    }

    /// Build `/v1/{mount}/{section}/{prefix}/{path}` with each segment encoded.
    fn api_path(&self, section: &str, path: &str) -> String {
        let mut uri = format!("/v1/{}/{}", self.mount, section);
        let segments = self
            .prefix
            .split('/')
            .chain(path.split('/'))
            .filter(|s| !s.is_empty());
        for segment in segments {
            uri.push('/');
            uri.push_str(&urlencoding::encode(segment));
        }
        uri
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> Result<(StatusCode, Bytes)> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| StoreError::Unreachable(format!("{}: {}", self.authority, e)))?;

        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| StoreError::Unreachable(format!("HTTP handshake failed: {}", e)))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("Vault connection error: {}", e);
            }
        });

        let payload = match body {
            Some(value) => Bytes::from(value.to_string()),
            None => Bytes::new(),
        };

        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(HOST, self.authority.as_str())
            .header(TOKEN_HEADER, self.token.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(payload))
            .map_err(|e| StoreError::Protocol(format!("failed to build request: {}", e)))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| StoreError::Unreachable(format!("request failed: {}", e)))?;

        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| StoreError::Unreachable(format!("failed to read response: {}", e)))?
            .to_bytes();

        Ok((status, body))
    }
}

/// Map non-success statuses to store errors.
fn check_status(status: StatusCode, path: &str, body: &Bytes) -> Result<()> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::NOT_FOUND => Err(StoreError::NotFound(path.to_string())),
        StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
            Err(StoreError::PermissionDenied(path.to_string()))
        }
        s if s.is_server_error() => Err(StoreError::Unreachable(format!(
            "Vault returned {}: {}",
            s,
            String::from_utf8_lossy(body).trim()
        ))),
        s => Err(StoreError::Protocol(format!("Vault returned {} for {}", s, path))),
    }
}

fn parse_json(path: &str, body: &Bytes) -> Result<Value> {
    serde_json::from_slice(body)
        .map_err(|e| StoreError::Protocol(format!("invalid JSON for {}: {}", path, e)))
}

#[async_trait]
impl SecretStore for VaultStore {
    async fn read(&self, path: &str) -> Result<Secret> {
        let uri = self.api_path("data", path);
        let (status, body) = self.send(Method::GET, &uri, None).await?;
        check_status(status, path, &body)?;

        let value = parse_json(path, &body)?;
        // A deleted latest version reads back with null data.
        let data = match value.pointer("/data/data") {
            Some(Value::Object(map)) => map,
            Some(Value::Null) | None => return Err(StoreError::NotFound(path.to_string())),
            Some(_) => {
                return Err(StoreError::Protocol(format!(
                    "secret data at {} is not an object",
                    path
                )));
            }
        };

        Ok(data
            .iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), v)
            })
            .collect())
    }

    async fn write(&self, path: &str, data: Secret) -> Result<()> {
        let uri = self.api_path("data", path);
        let (status, body) = self
            .send(Method::POST, &uri, Some(json!({ "data": data })))
            .await?;
        check_status(status, path, &body)?;
        tracing::debug!(path, "wrote secret");
        Ok(())
    }

    async fn list(&self, path: &str) -> Result<Vec<String>> {
        let uri = format!("{}?list=true", self.api_path("metadata", path));
        let (status, body) = self.send(Method::GET, &uri, None).await?;
        check_status(status, path, &body)?;

        let value = parse_json(path, &body)?;
        let keys = value
            .pointer("/data/keys")
            .and_then(Value::as_array)
            .ok_or_else(|| StoreError::Protocol(format!("list response for {} has no keys", path)))?;

        Ok(keys
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect())
    }
}
