// ABOUTME: In-memory Hop double for tunnel, transfer and relay tests.
// ABOUTME: Supports injected stage failures, hangs, and tracks live and closed resources.

use async_trait::async_trait;
use bastion_relay::keys::{KeyAlgorithm, KeyHandle};
use bastion_relay::ssh;
use bastion_relay::transfer::RemoteFiles;
use bastion_relay::tunnel::{Endpoint, Hop, TunnelResource};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Points where the double can fail or hang.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Point {
    BastionAuth,
    ChannelOpen,
    TargetAuth,
    Read,
    Write,
    CloseTarget,
    CloseChannel,
    CloseBastion,
}

#[derive(Default)]
struct State {
    files: HashMap<String, Vec<u8>>,
    fail: Vec<Point>,
    hang: Option<Point>,
    live: HashMap<&'static str, usize>,
    opened: usize,
    closed: Vec<TunnelResource>,
    bastion_logins: Vec<(Endpoint, KeyAlgorithm)>,
    forwards: Vec<(Endpoint, Endpoint)>,
    target_logins: Vec<(Endpoint, KeyAlgorithm)>,
}

/// Hop double. Clones share state.
#[derive(Clone, Default)]
pub struct MockHop {
    state: Arc<Mutex<State>>,
}

fn label(resource: TunnelResource) -> &'static str {
    match resource {
        TunnelResource::Target => "target",
        TunnelResource::Channel => "channel",
        TunnelResource::Bastion => "bastion",
    }
}

/// Decrements the live count of its resource when dropped.
struct LiveGuard {
    state: Arc<Mutex<State>>,
    resource: TunnelResource,
}

impl LiveGuard {
    fn open(state: &Arc<Mutex<State>>, resource: TunnelResource) -> Self {
        let mut s = state.lock();
        *s.live.entry(label(resource)).or_default() += 1;
        s.opened += 1;
        Self {
            state: Arc::clone(state),
            resource,
        }
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        let mut s = self.state.lock();
        if let Some(count) = s.live.get_mut(label(self.resource)) {
            *count -= 1;
        }
    }
}

pub struct MockBastion {
    _guard: LiveGuard,
}

pub struct MockChannel {
    _guard: LiveGuard,
}

pub struct MockTarget {
    state: Arc<Mutex<State>>,
    _guard: LiveGuard,
}

impl MockHop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.put_file(path, content);
        self
    }

    pub fn put_file(&self, path: &str, content: impl Into<Vec<u8>>) {
        self.state.lock().files.insert(path.to_string(), content.into());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().files.get(path).cloned()
    }

    pub fn fail_at(self, point: Point) -> Self {
        self.state.lock().fail.push(point);
        self
    }

    /// Never complete the operation at `point`.
    pub fn hang_at(self, point: Point) -> Self {
        self.state.lock().hang = Some(point);
        self
    }

    /// Resources opened and not yet dropped.
    pub fn live(&self) -> usize {
        self.state.lock().live.values().sum()
    }

    pub fn live_of(&self, resource: TunnelResource) -> usize {
        self.state
            .lock()
            .live
            .get(label(resource))
            .copied()
            .unwrap_or(0)
    }

    /// Total resources ever opened.
    pub fn opened(&self) -> usize {
        self.state.lock().opened
    }

    /// Successful closes, in the order they happened.
    pub fn closed(&self) -> Vec<TunnelResource> {
        self.state.lock().closed.clone()
    }

    pub fn bastion_logins(&self) -> Vec<(Endpoint, KeyAlgorithm)> {
        self.state.lock().bastion_logins.clone()
    }

    pub fn forwards(&self) -> Vec<(Endpoint, Endpoint)> {
        self.state.lock().forwards.clone()
    }

    pub fn target_logins(&self) -> Vec<(Endpoint, KeyAlgorithm)> {
        self.state.lock().target_logins.clone()
    }

    async fn gate(&self, point: Point) -> ssh::Result<()> {
        gate(&self.state, point).await
    }

    fn close(&self, resource: TunnelResource, point: Point) -> ssh::Result<()> {
        let mut s = self.state.lock();
        if s.fail.contains(&point) {
            return Err(ssh::Error::Connection(format!("{} close failed", label(resource))));
        }
        s.closed.push(resource);
        Ok(())
    }
}

async fn gate(state: &Arc<Mutex<State>>, point: Point) -> ssh::Result<()> {
    let (hang, fail) = {
        let s = state.lock();
        (s.hang == Some(point), s.fail.contains(&point))
    };
    if hang {
        std::future::pending::<()>().await;
    }
    if fail {
        return Err(match point {
            Point::BastionAuth | Point::TargetAuth => {
                ssh::Error::AuthenticationFailed("injected".to_string())
            }
            Point::ChannelOpen => ssh::Error::ChannelOpen {
                destination: "injected".to_string(),
                reason: "administratively prohibited".to_string(),
            },
            _ => ssh::Error::Sftp("injected failure".to_string()),
        });
    }
    Ok(())
}

#[async_trait]
impl Hop for MockHop {
    type Bastion = MockBastion;
    type Channel = MockChannel;
    type Target = MockTarget;

    async fn connect_bastion(&self, bastion: &Endpoint, key: &KeyHandle) -> ssh::Result<MockBastion> {
        self.gate(Point::BastionAuth).await?;
        self.state
            .lock()
            .bastion_logins
            .push((bastion.clone(), key.algorithm()));
        Ok(MockBastion {
            _guard: LiveGuard::open(&self.state, TunnelResource::Bastion),
        })
    }

    async fn open_forward(
        &self,
        _bastion: &MockBastion,
        destination: &Endpoint,
        origin: &Endpoint,
    ) -> ssh::Result<MockChannel> {
        self.gate(Point::ChannelOpen).await?;
        self.state
            .lock()
            .forwards
            .push((destination.clone(), origin.clone()));
        Ok(MockChannel {
            _guard: LiveGuard::open(&self.state, TunnelResource::Channel),
        })
    }

    async fn connect_target(
        &self,
        _channel: &mut MockChannel,
        target: &Endpoint,
        key: &KeyHandle,
    ) -> ssh::Result<MockTarget> {
        self.gate(Point::TargetAuth).await?;
        self.state
            .lock()
            .target_logins
            .push((target.clone(), key.algorithm()));
        Ok(MockTarget {
            state: Arc::clone(&self.state),
            _guard: LiveGuard::open(&self.state, TunnelResource::Target),
        })
    }

    async fn close_target(&self, target: MockTarget) -> ssh::Result<()> {
        let result = self.close(TunnelResource::Target, Point::CloseTarget);
        drop(target);
        result
    }

    async fn close_channel(&self, channel: MockChannel) -> ssh::Result<()> {
        let result = self.close(TunnelResource::Channel, Point::CloseChannel);
        drop(channel);
        result
    }

    async fn close_bastion(&self, bastion: MockBastion) -> ssh::Result<()> {
        let result = self.close(TunnelResource::Bastion, Point::CloseBastion);
        drop(bastion);
        result
    }
}

#[async_trait]
impl RemoteFiles for MockTarget {
    async fn write_file(&self, path: &str, content: &[u8]) -> ssh::Result<()> {
        gate(&self.state, Point::Write).await?;
        self.state
            .lock()
            .files
            .insert(path.to_string(), content.to_vec());
        Ok(())
    }

    async fn read_file(&self, path: &str) -> ssh::Result<Vec<u8>> {
        gate(&self.state, Point::Read).await?;
        self.state
            .lock()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| ssh::Error::Sftp(format!("no such file: {}", path)))
    }
}
