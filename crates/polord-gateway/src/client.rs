//! Gateway client: the single call path from the reconciler to an adapter.
//!
//! ```text
//! Reconciler
//!     │
//!     └──► GatewayClient::move_item(ctx, cmd)
//!                │
//!                ├── debug!(op, target, anchor)
//!                ├── tokio::time::timeout(call_timeout, …)  → GatewayError::Timeout
//!                │
//!                └── BackendGateway::move_item  ◄── adapter
//! ```
//!
//! Timeouts are per call, never per run: a run's duration scales with the
//! number of commands.

use std::future::Future;
use std::time::Duration;

use polord_sequencer::{EntityKind, MoveCommand};
use tracing::{debug, warn};

use crate::{BackendGateway, ContainerListing, GatewayError, GatewayOp, ItemListing, RunContext};

/// Default per-call timeout.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GatewayClient<G: BackendGateway> {
    gateway: G,
    call_timeout: Duration,
}

impl<G: BackendGateway> GatewayClient<G> {
    pub fn new(gateway: G, call_timeout: Duration) -> Self {
        Self {
            gateway,
            call_timeout,
        }
    }

    pub fn with_default_timeout(gateway: G) -> Self {
        Self::new(gateway, DEFAULT_CALL_TIMEOUT)
    }

    pub fn backend_name(&self) -> &str {
        self.gateway.name()
    }

    pub fn moves_are_idempotent(&self) -> bool {
        self.gateway.moves_are_idempotent()
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Borrow the wrapped adapter.
    pub fn inner(&self) -> &G {
        &self.gateway
    }

    async fn bounded<T, F>(&self, op: GatewayOp, fut: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        let res = match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(GatewayError::Timeout {
                op,
                after: self.call_timeout,
            }),
        };
        if let Err(err) = &res {
            warn!(backend = self.gateway.name(), %op, error = %err, "gateway call failed");
        }
        res
    }

    pub async fn list_containers(
        &self,
        ctx: &RunContext,
    ) -> Result<Vec<ContainerListing>, GatewayError> {
        debug!(backend = self.gateway.name(), "list_containers");
        self.bounded(GatewayOp::ListContainers, self.gateway.list_containers(ctx))
            .await
    }

    pub async fn list_items(&self, ctx: &RunContext) -> Result<Vec<ItemListing>, GatewayError> {
        debug!(backend = self.gateway.name(), "list_items");
        self.bounded(GatewayOp::ListItems, self.gateway.list_items(ctx))
            .await
    }

    /// Issue one move command, dispatching on its kind.
    pub async fn apply(&self, ctx: &RunContext, cmd: &MoveCommand) -> Result<(), GatewayError> {
        match cmd.kind {
            EntityKind::Container => {
                debug!(target_id = %cmd.target_id, anchor = %cmd.anchor, "move_container");
                self.bounded(
                    GatewayOp::MoveContainer,
                    self.gateway
                        .move_container(ctx, &cmd.target_id, &cmd.anchor),
                )
                .await
            }
            EntityKind::Item => {
                debug!(target_id = %cmd.target_id, anchor = %cmd.anchor, "move_item");
                self.bounded(
                    GatewayOp::MoveItem,
                    self.gateway.move_item(ctx, &cmd.target_id, &cmd.anchor),
                )
                .await
            }
        }
    }

    pub async fn publish(&self, ctx: &RunContext) -> Result<(), GatewayError> {
        debug!(backend = self.gateway.name(), "publish");
        self.bounded(GatewayOp::Publish, self.gateway.publish(ctx))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use polord_sequencer::AnchorSpec;
    use std::sync::Mutex;

    /// Records move calls; `stall` makes every move hang forever.
    #[derive(Default)]
    struct StubGateway {
        stall: bool,
        moves: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BackendGateway for StubGateway {
        async fn list_containers(
            &self,
            _ctx: &RunContext,
        ) -> Result<Vec<ContainerListing>, GatewayError> {
            Ok(vec![ContainerListing::new("s1", "web")])
        }

        async fn list_items(&self, _ctx: &RunContext) -> Result<Vec<ItemListing>, GatewayError> {
            Ok(vec![])
        }

        async fn move_container(
            &self,
            _ctx: &RunContext,
            id: &str,
            anchor: &AnchorSpec,
        ) -> Result<(), GatewayError> {
            if self.stall {
                std::future::pending::<()>().await;
            }
            self.moves.lock().unwrap().push(format!("C {id} {anchor}"));
            Ok(())
        }

        async fn move_item(
            &self,
            _ctx: &RunContext,
            id: &str,
            anchor: &AnchorSpec,
        ) -> Result<(), GatewayError> {
            self.moves.lock().unwrap().push(format!("I {id} {anchor}"));
            Ok(())
        }

        async fn publish(&self, _ctx: &RunContext) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn apply_dispatches_on_kind() {
        let client = GatewayClient::with_default_timeout(StubGateway::default());
        let ctx = RunContext::new();

        client
            .apply(&ctx, &MoveCommand::container("s1", AnchorSpec::FirstInPolicy))
            .await
            .unwrap();
        client
            .apply(
                &ctx,
                &MoveCommand::item("r1", AnchorSpec::FirstInContainer("s1".into())),
            )
            .await
            .unwrap();

        let moves = client.inner().moves.lock().unwrap().clone();
        assert_eq!(
            moves,
            vec!["C s1 FIRST_IN_POLICY", "I r1 FIRST_IN_SECTION(s1)"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_call_times_out_per_call() {
        let gw = StubGateway {
            stall: true,
            ..Default::default()
        };
        let client = GatewayClient::new(gw, Duration::from_millis(50));
        let err = client
            .apply(
                &RunContext::new(),
                &MoveCommand::container("s1", AnchorSpec::FirstInPolicy),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::Timeout {
                op: GatewayOp::MoveContainer,
                after: Duration::from_millis(50)
            }
        );
    }

    #[tokio::test]
    async fn default_trait_methods() {
        let client = GatewayClient::with_default_timeout(StubGateway::default());
        assert_eq!(client.backend_name(), "backend");
        assert!(!client.moves_are_idempotent());
        assert_eq!(client.call_timeout(), DEFAULT_CALL_TIMEOUT);
        assert_eq!(client.list_containers(&RunContext::new()).await.unwrap().len(), 1);
    }
}
