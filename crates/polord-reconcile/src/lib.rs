//! polord-reconcile
//!
//! Drives a backend policy to a desired two-level order through the
//! gateway, one relative move at a time, then publishes.
//!
//! - [`Reconciler`] owns the injected gateway (wrapped in a
//!   `GatewayClient`) and the run settings.
//! - Every run walks the [`RunPhase`] state machine and ends in `Done` or
//!   `Failed(kind)`.
//! - The only artifact that survives a successful run is the
//!   [`ResultSnapshot`].
//!
//! Runs against the same policy must be serialized by the caller.

mod error;
mod reconciler;
mod resolve;
mod settings;
mod snapshot;
mod state;

pub use error::ReconcileError;
pub use reconciler::{ReconcilePlan, Reconciler};
pub use settings::{PlanMode, ReconcilerSettings};
pub use snapshot::{PlacedEntity, ResultSnapshot};
pub use state::{FailureKind, IllegalTransition, RunPhase, RunState};
