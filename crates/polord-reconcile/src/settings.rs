use std::time::Duration;

use polord_gateway::DEFAULT_CALL_TIMEOUT;
use polord_sequencer::PolicyEdge;
use serde::{Deserialize, Serialize};

/// How each scope is planned.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    /// Resequence every scope on every run.
    #[default]
    Full,
    /// Skip scopes the backend already lists in the desired order; any
    /// other scope is resequenced in full.
    Minimal,
}

impl PlanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanMode::Full => "full",
            PlanMode::Minimal => "minimal",
        }
    }
}

/// Reconciler knobs. Loaded by `polord-config`; `Default` is what an
/// empty config resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcilerSettings {
    /// Upper bound for each individual gateway call.
    pub call_timeout: Duration,
    /// Extra attempts per failed move. Only used when the gateway reports
    /// idempotent moves.
    pub max_move_retries: u32,
    pub plan_mode: PlanMode,
    /// Where the managed container block goes when no start-after anchor is
    /// supplied.
    pub default_placement: PolicyEdge,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            max_move_retries: 0,
            plan_mode: PlanMode::Full,
            default_placement: PolicyEdge::First,
        }
    }
}
