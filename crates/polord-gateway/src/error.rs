use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Gateway operation, for logs and timeout errors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    ListContainers,
    ListItems,
    MoveContainer,
    MoveItem,
    Publish,
}

impl GatewayOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayOp::ListContainers => "list_containers",
            GatewayOp::ListItems => "list_items",
            GatewayOp::MoveContainer => "move_container",
            GatewayOp::MoveItem => "move_item",
            GatewayOp::Publish => "publish",
        }
    }

    /// `true` for operations that change backend state.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, GatewayOp::ListContainers | GatewayOp::ListItems)
    }
}

impl fmt::Display for GatewayOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors a [`crate::BackendGateway`] call may return.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Network or transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend API rejected the call.
    #[error("backend api error{}: {message}", .code.map(|c| format!(" code={c}")).unwrap_or_default())]
    Api { code: Option<i64>, message: String },

    /// A referenced id does not exist on the backend.
    #[error("backend object not found: {id}")]
    NotFound { id: String },

    /// The call did not complete within the per-call timeout.
    #[error("{op} timed out after {}ms", .after.as_millis())]
    Timeout { op: GatewayOp, after: Duration },

    /// The run was cancelled before the call was issued.
    #[error("cancelled before call was issued")]
    Cancelled,
}

impl GatewayError {
    /// Whether an automatic retry may be attempted for this failure, given
    /// an idempotent backend. Timeouts are excluded because the outcome of
    /// the timed-out call is unknown; cancellation is never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Transport(_) | GatewayError::Api { .. })
    }
}
