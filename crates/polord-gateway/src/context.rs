use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Per-run context handed to every gateway call.
///
/// The cancel token is observed by the reconciler between commands. Adapters
/// may also watch it to abort their own in-flight work.
#[derive(Clone, Debug)]
pub struct RunContext {
    pub run_id: Uuid,
    pub cancel: CancellationToken,
}

impl RunContext {
    pub fn new() -> Self {
        Self::with_cancel(CancellationToken::new())
    }

    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            cancel,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
