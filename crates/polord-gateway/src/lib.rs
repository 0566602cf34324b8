//! polord-gateway
//!
//! Backend Gateway contract: the only surface through which the reconciler
//! reads policy state or moves anything.
//!
//! - [`BackendGateway`] is the trait a backend adapter implements (live API,
//!   in-memory paper backend, test doubles).
//! - [`GatewayClient`] wraps an adapter and is what the reconciler actually
//!   calls. It applies the per-call timeout and logs every operation, so no
//!   adapter call can be issued unbounded or unlogged.

mod client;
mod context;
mod error;
mod types;

pub use client::{GatewayClient, DEFAULT_CALL_TIMEOUT};
pub use context::RunContext;
pub use error::{GatewayError, GatewayOp};
pub use types::{ContainerListing, ItemListing};

use std::sync::Arc;

use async_trait::async_trait;
use polord_sequencer::AnchorSpec;

/// Backend adapter contract.
///
/// Listings are returned in current backend order: containers in policy
/// order, items in policy order (grouped by container).
///
/// Each call is treated as atomic by the engine: it either completes or
/// errors. Cancellation of an in-flight call is up to the implementation;
/// `ctx.cancel` is available for that.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Human-readable backend name used in logs.
    fn name(&self) -> &str {
        "backend"
    }

    /// `true` when re-issuing a move that already took effect is a safe
    /// no-op. Only then may the reconciler retry failed moves.
    fn moves_are_idempotent(&self) -> bool {
        false
    }

    async fn list_containers(&self, ctx: &RunContext) -> Result<Vec<ContainerListing>, GatewayError>;

    async fn list_items(&self, ctx: &RunContext) -> Result<Vec<ItemListing>, GatewayError>;

    async fn move_container(
        &self,
        ctx: &RunContext,
        id: &str,
        anchor: &AnchorSpec,
    ) -> Result<(), GatewayError>;

    async fn move_item(
        &self,
        ctx: &RunContext,
        id: &str,
        anchor: &AnchorSpec,
    ) -> Result<(), GatewayError>;

    /// Commit all applied moves.
    async fn publish(&self, ctx: &RunContext) -> Result<(), GatewayError>;
}

#[async_trait]
impl<G: BackendGateway + ?Sized> BackendGateway for Arc<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn moves_are_idempotent(&self) -> bool {
        (**self).moves_are_idempotent()
    }

    async fn list_containers(&self, ctx: &RunContext) -> Result<Vec<ContainerListing>, GatewayError> {
        (**self).list_containers(ctx).await
    }

    async fn list_items(&self, ctx: &RunContext) -> Result<Vec<ItemListing>, GatewayError> {
        (**self).list_items(ctx).await
    }

    async fn move_container(
        &self,
        ctx: &RunContext,
        id: &str,
        anchor: &AnchorSpec,
    ) -> Result<(), GatewayError> {
        (**self).move_container(ctx, id, anchor).await
    }

    async fn move_item(
        &self,
        ctx: &RunContext,
        id: &str,
        anchor: &AnchorSpec,
    ) -> Result<(), GatewayError> {
        (**self).move_item(ctx, id, anchor).await
    }

    async fn publish(&self, ctx: &RunContext) -> Result<(), GatewayError> {
        (**self).publish(ctx).await
    }
}
