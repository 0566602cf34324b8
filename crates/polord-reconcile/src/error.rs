use polord_gateway::{GatewayError, GatewayOp};
use polord_model::ValidationError;
use polord_sequencer::{MoveCommand, PlanError};
use thiserror::Error;

use crate::{FailureKind, ResultSnapshot, RunPhase};

/// Why a reconciliation run stopped.
///
/// | variant        | remote effect                     | caller action                    |
/// |----------------|-----------------------------------|----------------------------------|
/// | `Validation`   | none                              | fix input, retry                 |
/// | `Plan`         | none                              | fix input, retry                 |
/// | `Remote`       | none                              | retry                            |
/// | `PartialApply` | first `applied_count` moves landed| re-run full reconciliation       |
/// | `Publish`      | every move landed, not committed  | `retry_publish`, or re-run       |
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("invalid desired order: {0}")]
    Validation(#[from] ValidationError),

    #[error("planning failed: {0}")]
    Plan(#[from] PlanError),

    #[error("backend read {op} failed: {source}")]
    Remote {
        op: GatewayOp,
        #[source]
        source: GatewayError,
    },

    #[error(
        "move {} of {total} failed ({failed_command}) with {applied_count} applied: {source}",
        .applied_count + 1
    )]
    PartialApply {
        applied_count: usize,
        total: usize,
        failed_command: MoveCommand,
        #[source]
        source: GatewayError,
    },

    #[error("publish failed after {applied_count} applied moves: {source}")]
    Publish {
        applied_count: usize,
        snapshot: Box<ResultSnapshot>,
        #[source]
        source: GatewayError,
    },
}

impl ReconcileError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ReconcileError::Validation(_) => FailureKind::Validation,
            ReconcileError::Plan(_) => FailureKind::Plan,
            ReconcileError::Remote { .. } => FailureKind::Remote,
            ReconcileError::PartialApply { .. } => FailureKind::PartialApply,
            ReconcileError::Publish { .. } => FailureKind::Publish,
        }
    }

    /// Phase the run was in when it failed.
    pub fn phase(&self) -> RunPhase {
        match self {
            ReconcileError::Validation(ValidationError::AnchorNotFound { .. })
            | ReconcileError::Validation(ValidationError::AnchorIsManaged { .. })
            | ReconcileError::Validation(ValidationError::ContainerNotFound { .. })
            | ReconcileError::Validation(ValidationError::AmbiguousContainer { .. })
            | ReconcileError::Validation(ValidationError::ItemNotFound { .. })
            | ReconcileError::Validation(ValidationError::AmbiguousItem { .. })
            | ReconcileError::Remote { .. } => RunPhase::Resolving,
            ReconcileError::Validation(_) => RunPhase::Validating,
            ReconcileError::Plan(_) => RunPhase::Planning,
            ReconcileError::PartialApply { .. } => RunPhase::Executing,
            ReconcileError::Publish { .. } => RunPhase::Publishing,
        }
    }

    /// `true` when the backend was not changed by this run.
    pub fn is_pre_mutation(&self) -> bool {
        match self {
            ReconcileError::Validation(_)
            | ReconcileError::Plan(_)
            | ReconcileError::Remote { .. } => true,
            ReconcileError::PartialApply { applied_count, .. } => *applied_count == 0,
            ReconcileError::Publish { .. } => false,
        }
    }

    /// Moves that landed on the backend before the failure.
    pub fn applied_count(&self) -> usize {
        match self {
            ReconcileError::PartialApply { applied_count, .. }
            | ReconcileError::Publish { applied_count, .. } => *applied_count,
            _ => 0,
        }
    }

    pub fn was_cancelled(&self) -> bool {
        matches!(
            self,
            ReconcileError::PartialApply {
                source: GatewayError::Cancelled,
                ..
            }
        )
    }

    /// The computed placement, available when every move already landed.
    pub fn snapshot(&self) -> Option<&ResultSnapshot> {
        match self {
            ReconcileError::Publish { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }
}
