// ABOUTME: Stage-by-stage tunnel builder with a single ordered teardown routine.
// ABOUTME: Teardown runs target, channel, bastion and never closes a resource twice.

use super::{Hop, Teardown, TunnelError, TunnelResource, TunnelRoute, TunnelStage};
use crate::keys::KeyHandle;

/// A tunnel under construction, owned by a single relayed operation.
///
/// Every resource opened so far is held here until [`Tunnel::teardown`].
/// If the tunnel is dropped instead (for example when the operation is
/// cancelled), the resources are released by their own drop.
pub struct Tunnel<'h, H: Hop> {
    hop: &'h H,
    stage: TunnelStage,
    failed_during: Option<TunnelStage>,
    bastion: Option<H::Bastion>,
    channel: Option<H::Channel>,
    target: Option<H::Target>,
}

impl<'h, H: Hop> Tunnel<'h, H> {
    pub fn new(hop: &'h H) -> Self {
        Self {
            hop,
            stage: TunnelStage::Init,
            failed_during: None,
            bastion: None,
            channel: None,
            target: None,
        }
    }

    pub fn stage(&self) -> TunnelStage {
        self.stage
    }

    /// Stage that was in progress when the build failed.
    pub fn failed_during(&self) -> Option<TunnelStage> {
        self.failed_during
    }

    fn expect_stage(&self, expected: TunnelStage) -> Result<(), TunnelError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(TunnelError::OutOfOrder {
                expected,
                actual: self.stage,
            })
        }
    }

    fn fail(&mut self, err: TunnelError) -> TunnelError {
        tracing::debug!(stage = %self.stage, "tunnel build failed: {}", err);
        self.failed_during = Some(self.stage);
        self.stage = TunnelStage::Failed;
        err
    }

    /// Init -> BastionAuthenticated.
    pub async fn authenticate_bastion(
        &mut self,
        route: &TunnelRoute,
        key: &KeyHandle,
    ) -> Result<(), TunnelError> {
        self.expect_stage(TunnelStage::Init)?;

        let result = self.hop.connect_bastion(&route.bastion, key).await;
        match result {
            Ok(bastion) => {
                self.bastion = Some(bastion);
                self.stage = TunnelStage::BastionAuthenticated;
                tracing::debug!(bastion = %route.bastion, "bastion authenticated");
                Ok(())
            }
            Err(e) => Err(self.fail(TunnelError::BastionAuth(e.to_string()))),
        }
    }

    /// BastionAuthenticated -> ChannelOpen.
    pub async fn open_channel(&mut self, route: &TunnelRoute) -> Result<(), TunnelError> {
        self.expect_stage(TunnelStage::BastionAuthenticated)?;

        let Some(bastion) = self.bastion.as_ref() else {
            return Err(self.fail(TunnelError::ChannelOpen(
                "bastion session is not live".to_string(),
            )));
        };

        let result = self
            .hop
            .open_forward(bastion, &route.target, &route.bastion)
            .await;
        match result {
            Ok(channel) => {
                self.channel = Some(channel);
                self.stage = TunnelStage::ChannelOpen;
                tracing::debug!(
                    target_host = %route.target.host,
                    port = route.target.port,
                    "forwarded channel open"
                );
                Ok(())
            }
            Err(e) => Err(self.fail(TunnelError::ChannelOpen(e.to_string()))),
        }
    }

    /// ChannelOpen -> TargetAuthenticated.
    pub async fn authenticate_target(
        &mut self,
        route: &TunnelRoute,
        key: &KeyHandle,
    ) -> Result<(), TunnelError> {
        self.expect_stage(TunnelStage::ChannelOpen)?;

        let hop = self.hop;
        let Some(channel) = self.channel.as_mut() else {
            return Err(self.fail(TunnelError::TargetAuth(
                "forwarded channel is not open".to_string(),
            )));
        };

        let result = hop.connect_target(channel, &route.target, key).await;
        match result {
            Ok(target) => {
                self.target = Some(target);
                self.stage = TunnelStage::TargetAuthenticated;
                tracing::debug!(target = %route.target, "target authenticated through bastion");
                Ok(())
            }
            Err(e) => Err(self.fail(TunnelError::TargetAuth(e.to_string()))),
        }
    }

    /// TargetAuthenticated -> Ready. Returns the session for file operations.
    pub fn ready(&mut self) -> Result<&H::Target, TunnelError> {
        self.expect_stage(TunnelStage::TargetAuthenticated)?;
        self.stage = TunnelStage::Ready;
        self.session().ok_or(TunnelError::OutOfOrder {
            expected: TunnelStage::TargetAuthenticated,
            actual: TunnelStage::Ready,
        })
    }

    /// The target session, only once the tunnel is ready.
    pub fn session(&self) -> Option<&H::Target> {
        match self.stage {
            TunnelStage::Ready => self.target.as_ref(),
            _ => None,
        }
    }

    /// Build every stage in order.
    pub async fn establish(
        &mut self,
        route: &TunnelRoute,
        bastion_key: &KeyHandle,
        target_key: &KeyHandle,
    ) -> Result<&H::Target, TunnelError> {
        self.authenticate_bastion(route, bastion_key).await?;
        self.open_channel(route).await?;
        self.authenticate_target(route, target_key).await?;
        self.ready()
    }

    /// Close whatever was opened, in reverse acquisition order.
    ///
    /// A failed close is logged and recorded; the remaining resources are
    /// still closed.
    pub async fn teardown(mut self) -> Teardown {
        let mut report = Teardown::default();

        if let Some(target) = self.target.take() {
            record(&mut report, TunnelResource::Target, self.hop.close_target(target).await);
        }
        if let Some(channel) = self.channel.take() {
            record(&mut report, TunnelResource::Channel, self.hop.close_channel(channel).await);
        }
        if let Some(bastion) = self.bastion.take() {
            record(&mut report, TunnelResource::Bastion, self.hop.close_bastion(bastion).await);
        }

        tracing::debug!(closed = report.closed.len(), failed = report.failed.len(), "tunnel torn down");
        report
    }
}

fn record(report: &mut Teardown, resource: TunnelResource, result: crate::ssh::Result<()>) {
    match result {
        Ok(()) => report.closed.push(resource),
        Err(e) => {
            tracing::warn!("failed to close {}: {}", resource, e);
            report.failed.push((resource, e.to_string()));
        }
    }
}

impl<H: Hop> Drop for Tunnel<'_, H> {
    fn drop(&mut self) {
        if self.bastion.is_some() || self.channel.is_some() || self.target.is_some() {
            tracing::debug!(stage = %self.stage, "tunnel dropped before teardown; releasing on drop");
        }
    }
}
