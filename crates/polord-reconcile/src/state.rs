//! Run state machine
//!
//! ```text
//! Idle ─► Validating ─► Resolving ─► Planning ─► Executing ─► Publishing ─► Done
//!   │          │             │           │  │          │             │
//!   │          │             │           │  └──────────┼─────────────┼──► Done (dry run)
//!   └──────────┴─────────────┴───────────┴─────────────┴─────────────┴──► Failed(kind)
//! ```
//!
//! `Done` and `Failed` are terminal.

use std::fmt;

/// Which class of failure ended a run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Validation,
    Plan,
    Remote,
    PartialApply,
    Publish,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RunPhase {
    Idle,
    Validating,
    Resolving,
    Planning,
    Executing,
    Publishing,
    Done,
    Failed(FailureKind),
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Done | RunPhase::Failed(_))
    }

    fn allows(&self, next: RunPhase) -> bool {
        use RunPhase::*;
        match (self, next) {
            (from, Failed(_)) => !from.is_terminal(),
            (Idle, Validating)
            | (Validating, Resolving)
            | (Resolving, Planning)
            | (Planning, Executing)
            | (Planning, Done)
            | (Executing, Publishing)
            | (Publishing, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Idle => write!(f, "idle"),
            RunPhase::Validating => write!(f, "validating"),
            RunPhase::Resolving => write!(f, "resolving"),
            RunPhase::Planning => write!(f, "planning"),
            RunPhase::Executing => write!(f, "executing"),
            RunPhase::Publishing => write!(f, "publishing"),
            RunPhase::Done => write!(f, "done"),
            RunPhase::Failed(kind) => write!(f, "failed({kind:?})"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IllegalTransition {
    pub from: RunPhase,
    pub to: RunPhase,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal run transition: {} -> {}", self.from, self.to)
    }
}

impl std::error::Error for IllegalTransition {}

/// Current phase of one run plus the phases it went through.
#[derive(Clone, Debug)]
pub struct RunState {
    phase: RunPhase,
    history: Vec<RunPhase>,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Idle,
            history: vec![RunPhase::Idle],
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn history(&self) -> &[RunPhase] {
        &self.history
    }

    pub fn advance(&mut self, next: RunPhase) -> Result<(), IllegalTransition> {
        if !self.phase.allows(next) {
            return Err(IllegalTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!(from = %self.phase, to = %next, "run phase");
        self.phase = next;
        self.history.push(next);
        Ok(())
    }
}
