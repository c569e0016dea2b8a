// ABOUTME: Integration tests for the Vault KV v2 store against a loopback fake server.
// ABOUTME: Checks request shapes, token header and status-to-error mapping.

mod support;

use bastion_relay::error::{Error, ErrorKind};
use bastion_relay::store::{Secret, SecretStore, StoreError, VaultSettings, VaultStore};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    token: Option<String>,
    body: String,
}

struct FakeVault {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeVault {
    async fn start<F>(respond: F) -> Self
    where
        F: Fn(&Recorded) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let respond = Arc::new(respond);

        let log = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let respond = Arc::clone(&respond);
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let Some(request) = read_request(&mut socket).await else {
                        return;
                    };
                    let (status, body) = respond(&request);
                    log.lock().push(request);
                    let response = format!(
                        "HTTP/1.1 {} Fake\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { addr, requests }
    }

    fn store(&self, prefix: &str) -> VaultStore {
        VaultStore::new(VaultSettings {
            address: format!("http://{}", self.addr),
            token: "test-token".to_string(),
            mount: "secret".to_string(),
            prefix: prefix.to_string(),
        })
        .unwrap()
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<Recorded> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let mut content_length = 0usize;
    let mut token = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap_or(0),
                "x-vault-token" => token = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = buf.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

    Some(Recorded {
        method,
        path,
        token,
        body,
    })
}

fn ok(value: Value) -> (u16, String) {
    (200, value.to_string())
}

mod reads {
    use super::*;

    #[tokio::test]
    async fn read_returns_latest_data_and_sends_token() {
        support::init_tracing();
        let vault = FakeVault::start(|_| {
            ok(json!({ "data": { "data": { "target_id": "host1", "bastion_host": "b" }, "metadata": { "version": 3 } } }))
        })
        .await;

        let secret = vault.store("").read("targets/host1_secrets").await.unwrap();
        assert_eq!(secret.get("target_id").map(String::as_str), Some("host1"));
        assert_eq!(secret.get("bastion_host").map(String::as_str), Some("b"));

        let requests = vault.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].path, "/v1/secret/data/targets/host1_secrets");
        assert_eq!(requests[0].token.as_deref(), Some("test-token"));
    }

    #[tokio::test]
    async fn prefix_is_placed_inside_the_mount() {
        let vault = FakeVault::start(|_| ok(json!({ "data": { "data": { "k": "v" } } }))).await;
        vault.store("relay/prod").read("credentials/abc").await.unwrap();
        assert_eq!(
            vault.requests()[0].path,
            "/v1/secret/data/relay/prod/credentials/abc"
        );
    }

    #[tokio::test]
    async fn missing_path_is_not_found() {
        let vault = FakeVault::start(|_| (404, json!({ "errors": [] }).to_string())).await;
        let store = vault.store("");
        let err = store.read("targets/nope_secrets").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.exists("targets/nope_secrets").await.unwrap());
    }

    #[tokio::test]
    async fn deleted_latest_version_is_not_found() {
        let vault = FakeVault::start(|_| {
            ok(json!({ "data": { "data": null, "metadata": { "deletion_time": "2024-01-01T00:00:00Z" } } }))
        })
        .await;
        let err = vault.store("").read("uploads/h_a").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn permission_denied_is_reported_as_store_unavailable() {
        let vault =
            FakeVault::start(|_| (403, json!({ "errors": ["permission denied"] }).to_string())).await;
        let err = vault.store("").read("credentials/abc").await.unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied(_)));

        let err = Error::from(err);
        assert_eq!(err.kind(), ErrorKind::CredentialStoreUnavailable);
        assert_eq!(err.public_message(), "credential store unavailable");
    }

    #[tokio::test]
    async fn server_errors_are_unreachable() {
        let vault = FakeVault::start(|_| (503, json!({ "errors": ["sealed"] }).to_string())).await;
        let err = vault.store("").read("credentials/abc").await.unwrap_err();
        assert!(matches!(err, StoreError::Unreachable(_)));
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = VaultStore::new(VaultSettings {
            address: format!("http://{}", addr),
            token: "t".to_string(),
            mount: "secret".to_string(),
            prefix: String::new(),
        })
        .unwrap();
        let err = store.read("credentials/abc").await.unwrap_err();
        assert!(matches!(err, StoreError::Unreachable(_)));
    }
}

mod writes {
    use super::*;

    #[tokio::test]
    async fn write_posts_data_envelope() {
        let vault = FakeVault::start(|_| ok(json!({ "data": { "version": 1 } }))).await;
        let secret = Secret::from([
            ("filename".to_string(), "hostname".to_string()),
            ("content".to_string(), "aG9zdDEK".to_string()),
        ]);
        vault
            .store("")
            .write("downloads/host1_hostname", secret)
            .await
            .unwrap();

        let request = &vault.requests()[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/v1/secret/data/downloads/host1_hostname");
        let body: Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body["data"]["filename"], "hostname");
        assert_eq!(body["data"]["content"], "aG9zdDEK");
    }
}

mod lists {
    use super::*;

    #[tokio::test]
    async fn list_uses_metadata_endpoint() {
        let vault = FakeVault::start(|_| {
            ok(json!({ "data": { "keys": ["host1_hostname", "host10_hostname", "nested/"] } }))
        })
        .await;
        let keys = vault.store("").list("downloads/").await.unwrap();
        assert_eq!(keys, vec!["host1_hostname", "host10_hostname", "nested/"]);

        let request = &vault.requests()[0];
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/v1/secret/metadata/downloads?list=true");
    }

    #[tokio::test]
    async fn empty_directory_is_not_found() {
        let vault = FakeVault::start(|_| (404, "{}".to_string())).await;
        let err = vault.store("").list("uploads/").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
