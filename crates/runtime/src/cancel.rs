use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared between a controller and a worker.
///
/// Workers poll [`CancelSignal::is_cancelled`] at their own checkpoints;
/// nothing is interrupted mid-step. A raised signal stays raised, so a fresh
/// run needs a fresh signal.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    raised: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}
